pub mod map_scene;
pub mod operational_view;
pub mod tracking_view;
pub mod view_model;

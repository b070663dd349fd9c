pub mod coordinator;
pub mod geopoint;
pub mod model;
pub mod routing;
pub mod simulation;
pub mod view;

pub mod cargo;
pub mod depot;
pub mod station;
pub mod stop;
pub mod trip;
pub mod trip_id;
pub mod vehicle;

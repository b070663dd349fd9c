use jiff::civil::Date;

use crate::geopoint::GeoPoint;

use super::{station::Station, stop::StopStatus, trip::Trip};

/// A customer shipment.
#[derive(Clone, Debug, PartialEq)]
pub struct Cargo {
    pub id: u64,
    pub station: Station,
    pub weight: f64,
    pub quantity: u32,
    pub status: StopStatus,
    pub target_date: Option<Date>,
}

/// Everything the customer screen needs to follow one shipment.
#[derive(Clone, Debug, PartialEq)]
pub struct CargoRoute {
    pub cargo: Cargo,
    /// Waypoints as computed by the backend, stops followed by the depot.
    pub route: Vec<GeoPoint>,
    /// The trip carrying the cargo, once it has been planned.
    pub trip: Option<Trip>,
    /// Index of the stop where the cargo is picked up.
    pub my_stop_index: Option<usize>,
}

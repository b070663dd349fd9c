use crate::geopoint::GeoPoint;

pub const UMUTTEPE_DEPOT: GeoPoint = GeoPoint::new(40.8225, 29.9250);

/// Common terminal point of every trip.
#[derive(Clone, Debug, PartialEq)]
pub struct Depot {
    pub name: String,
    pub location: GeoPoint,
}

impl Default for Depot {
    fn default() -> Self {
        Self {
            name: String::from("Umuttepe Deposu"),
            location: UMUTTEPE_DEPOT,
        }
    }
}

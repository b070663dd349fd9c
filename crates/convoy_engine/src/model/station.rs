use crate::geopoint::GeoPoint;

/// Reference data owned by the backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub id: u64,
    pub name: String,
    pub location: GeoPoint,
}

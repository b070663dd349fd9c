use std::sync::Arc;

use crate::{
    geopoint::GeoPoint,
    model::{stop::StopStatus, trip::TripStatus, trip_id::TripId},
    routing::route_polyline::RoutePolyline,
};

pub const ROUTE_COLORS: [&str; 6] = [
    "#ff6b00", "#3b82f6", "#10b981", "#f59e0b", "#8b5cf6", "#ef4444",
];

/// Color of the `index`-th route, cycling through [`ROUTE_COLORS`].
pub fn route_color(index: usize) -> &'static str {
    ROUTE_COLORS[index % ROUTE_COLORS.len()]
}

#[derive(Clone, Debug, PartialEq)]
pub struct DepotMarker {
    pub name: String,
    pub location: GeoPoint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StopMarker {
    pub ordinal: usize,
    pub station_name: String,
    pub location: GeoPoint,
    pub status: StopStatus,
    pub cargo_count: usize,
    pub total_weight: f64,
    /// The stop holding the shipment followed on the customer screen.
    pub highlighted: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VehicleMarker {
    pub plate: String,
    pub location: GeoPoint,
    pub progress: f64,
    pub percent: u8,
    pub running: bool,
}

/// Everything drawn for one trip.
#[derive(Clone, Debug, PartialEq)]
pub struct TripLayer {
    pub trip_id: TripId,
    pub status: TripStatus,
    pub color: &'static str,
    pub polyline: Arc<RoutePolyline>,
    pub stops: Vec<StopMarker>,
    pub vehicle: Option<VehicleMarker>,
    /// Planned distance in kilometers, as reported by the backend.
    pub distance_km: f64,
}

/// A render agnostic description of the map at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct MapScene {
    pub depot: DepotMarker,
    pub layers: Vec<TripLayer>,
    /// Static station to depot line for a shipment not yet planned.
    pub preview: Option<Arc<RoutePolyline>>,
}

impl MapScene {
    pub fn layer(&self, trip_id: &TripId) -> Option<&TripLayer> {
        self.layers.iter().find(|layer| layer.trip_id == *trip_id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = (&TripId, &VehicleMarker)> {
        self.layers
            .iter()
            .filter_map(|layer| layer.vehicle.as_ref().map(|vehicle| (&layer.trip_id, vehicle)))
    }

    pub fn is_animating(&self) -> bool {
        self.vehicles().any(|(_, vehicle)| vehicle.running)
    }
}

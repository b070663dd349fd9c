use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geopoint::GeoPoint;

use super::{
    stop::{Stop, StopStatus},
    trip_id::TripId,
    vehicle::Vehicle,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Empty,
    Pending,
    InTransit,
    Partial,
    Completed,
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TripStatus::Empty => "empty",
                TripStatus::Pending => "pending",
                TripStatus::InTransit => "in_transit",
                TripStatus::Partial => "partial",
                TripStatus::Completed => "completed",
            }
        )
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum WaypointError {
    #[error("trip has no stops")]
    NoStops,

    #[error("stop #{ordinal} ({station_name}) has no coordinates")]
    MissingCoordinates { ordinal: usize, station_name: String },
}

/// One vehicle's planned sequence of stops for a day.
#[derive(Clone, Debug, PartialEq)]
pub struct Trip {
    pub id: TripId,
    pub vehicle: Vehicle,
    pub stops: Vec<Stop>,
    /// Kilometers, as computed by the route planner.
    pub distance: f64,
    pub total_cost: f64,
    pub start_station: Option<String>,
    /// Status as last reported by the system of record.
    pub status: TripStatus,
}

impl Trip {
    pub fn total_weight(&self) -> f64 {
        self.stops.iter().map(|stop| stop.total_weight).sum()
    }

    pub fn cargo_count(&self) -> usize {
        self.stops.iter().map(|stop| stop.cargo_count).sum()
    }

    pub fn derived_status(&self) -> TripStatus {
        if self.stops.is_empty() {
            return TripStatus::Empty;
        }

        let mut statuses = self.stops.iter().map(|stop| stop.status());

        if statuses.clone().all(|status| status == StopStatus::Delivered) {
            TripStatus::Completed
        } else if statuses.clone().all(|status| status == StopStatus::Pending) {
            TripStatus::Pending
        } else if statuses.any(|status| status == StopStatus::InTransit) {
            TripStatus::InTransit
        } else {
            TripStatus::Partial
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.status == TripStatus::Completed || self.derived_status() == TripStatus::Completed
    }

    /// Stop coordinates in traversal order followed by the depot.
    ///
    /// The depot to first stop leg is never part of the route, vehicles
    /// leave from the first station already loaded.
    pub fn waypoints(&self, depot: GeoPoint) -> Result<Vec<GeoPoint>, WaypointError> {
        if self.stops.is_empty() {
            return Err(WaypointError::NoStops);
        }

        let mut stops: Vec<&Stop> = self.stops.iter().collect();
        stops.sort_by_key(|stop| stop.ordinal);

        let mut waypoints = Vec::with_capacity(stops.len() + 1);
        for stop in stops {
            let coords = stop.coords.ok_or_else(|| WaypointError::MissingCoordinates {
                ordinal: stop.ordinal,
                station_name: stop.station_name.clone(),
            })?;
            waypoints.push(coords);
        }
        waypoints.push(depot);

        Ok(waypoints)
    }
}

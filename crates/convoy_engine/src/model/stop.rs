use serde::{Deserialize, Serialize};

use crate::geopoint::GeoPoint;

/// Delivery status of the cargo aggregated at a stop.
///
/// Ordered by lifecycle, a status only ever moves forward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    Pending,
    InTransit,
    Delivered,
}

impl std::fmt::Display for StopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                StopStatus::Pending => "pending",
                StopStatus::InTransit => "in_transit",
                StopStatus::Delivered => "delivered",
            }
        )
    }
}

/// One station visit within a trip.
#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    /// Position within the trip, defines the traversal order.
    pub ordinal: usize,
    pub station_name: String,
    pub coords: Option<GeoPoint>,
    pub total_weight: f64,
    pub cargo_count: usize,
    pub cargo_ids: Vec<u64>,
    pub senders: Vec<String>,
    status: StopStatus,
}

impl Stop {
    pub fn new(ordinal: usize, station_name: impl Into<String>, coords: Option<GeoPoint>) -> Self {
        Self {
            ordinal,
            station_name: station_name.into(),
            coords,
            total_weight: 0.0,
            cargo_count: 0,
            cargo_ids: Vec::new(),
            senders: Vec::new(),
            status: StopStatus::Pending,
        }
    }

    pub fn with_status(mut self, status: StopStatus) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StopStatus {
        self.status
    }

    /// Moves the status forward. Returns `false` and leaves the stop
    /// untouched when `status` would be a regression.
    pub fn advance_status(&mut self, status: StopStatus) -> bool {
        if status < self.status {
            return false;
        }

        self.status = status;
        true
    }
}

use std::future::Future;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::model::{cargo::CargoRoute, trip::Trip, trip_id::TripId};

/// Backend acknowledgment of a start or complete request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationAck {
    pub message: String,
    pub updated_cargo_count: usize,
}

/// The authoritative record of trips and cargo status.
pub trait SystemOfRecord: Send + Sync + 'static {
    /// Every trip planned for `date`, stops in traversal order.
    fn trips_for_date(&self, date: Date) -> impl Future<Output = anyhow::Result<Vec<Trip>>> + Send;

    fn cargo_route(&self, cargo_id: u64) -> impl Future<Output = anyhow::Result<CargoRoute>> + Send;

    /// Moves the pending cargo of `trip_ids` to in transit.
    fn start_simulation(
        &self,
        trip_ids: &[TripId],
    ) -> impl Future<Output = anyhow::Result<SimulationAck>> + Send;

    /// Moves the in transit cargo of `trip_ids` to delivered.
    fn complete_simulation(
        &self,
        trip_ids: &[TripId],
    ) -> impl Future<Output = anyhow::Result<SimulationAck>> + Send;
}

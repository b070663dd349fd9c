use thiserror::Error;

use crate::model::trip_id::TripId;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("no trip to simulate")]
    EmptyBatch,

    #[error("simulation already running for trips {}", join_ids(.0))]
    AlreadyRunning(Vec<TripId>),

    #[error("delivery of trips {} is already being recorded", join_ids(.0))]
    SyncInFlight(Vec<TripId>),

    #[error("route of trip {0} has fewer than two points")]
    Degenerate(TripId),

    #[error("no route resolved for trip {0}")]
    UnknownTrip(TripId),

    #[error("backend refused to start the simulation: {0}")]
    StartRejected(#[source] anyhow::Error),

    #[error("backend did not record the delivery: {0}")]
    CompletionFailed(#[source] anyhow::Error),

    #[error("simulation was cancelled before it started")]
    Cancelled,
}

impl SimulationError {
    /// Errors the user can act on by retrying the same request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SimulationError::StartRejected(_) | SimulationError::CompletionFailed(_)
        )
    }
}

fn join_ids(trip_ids: &[TripId]) -> String {
    trip_ids
        .iter()
        .map(TripId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

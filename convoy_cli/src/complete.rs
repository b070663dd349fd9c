use std::sync::Arc;

use convoy_backend::client::BackendClient;
use convoy_engine::{
    coordinator::trip_state_coordinator::TripStateCoordinator, model::trip_id::TripId,
    simulation::{session_store::SessionStore, simulation_params::SimulationParams},
};
use tracing::info;

/// Records the delivery of trips whose completion never reached the backend.
pub async fn run(backend: BackendClient, trip_ids: Vec<u64>) -> anyhow::Result<()> {
    let trip_ids: Vec<TripId> = trip_ids.into_iter().map(TripId::from).collect();

    let coordinator = TripStateCoordinator::new(
        Arc::new(backend),
        SessionStore::new(),
        SimulationParams::operator(),
    );
    let ack = coordinator.complete_simulation(&trip_ids).await?;

    info!("{} ({} cargo updated)", ack.message, ack.updated_cargo_count);
    Ok(())
}

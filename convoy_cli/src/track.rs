use std::sync::Arc;

use convoy_backend::client::BackendClient;
use convoy_engine::{
    simulation::simulation_params::SimulationParams, view::tracking_view::TrackingView,
};
use tracing::info;

use crate::{render, router::Router, screen, simulation_args::SimulationArgs};

pub async fn run(
    backend: BackendClient,
    router: Router,
    cargo_id: u64,
    args: SimulationArgs,
) -> anyhow::Result<()> {
    let params = args.params(SimulationParams::customer());
    let mut view = TrackingView::new(Arc::new(backend), router, cargo_id, params);
    view.load().await?;

    if let Some(cargo_route) = view.cargo_route() {
        render::print_cargo(cargo_route);
    }
    render::print_scene(&view.scene());

    if args.dry_run {
        return Ok(());
    }

    if !view.can_simulate() {
        info!("Cargo {} has nothing left to simulate", cargo_id);
        return Ok(());
    }

    screen::run_simulation(&mut view).await
}

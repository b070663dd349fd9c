use std::sync::Arc;

use convoy_backend::client::BackendClient;
use convoy_engine::{
    simulation::simulation_params::SimulationParams, view::operational_view::OperationalView,
};
use jiff::civil::Date;
use tracing::info;

use crate::{render, router::Router, screen, simulation_args::SimulationArgs};

pub async fn run(
    backend: BackendClient,
    router: Router,
    date: Date,
    args: SimulationArgs,
) -> anyhow::Result<()> {
    let params = args.params(SimulationParams::operator());
    let mut view = OperationalView::new(Arc::new(backend), router, date, params);
    view.load().await?;

    info!("{} trips planned for {}", view.trips().len(), date);
    render::print_scene(&view.scene());

    if args.dry_run {
        return Ok(());
    }

    if view.model().startable_trip_ids().is_empty() {
        info!("Every trip of {} is already delivered", date);
        return Ok(());
    }

    screen::run_simulation(&mut view).await
}

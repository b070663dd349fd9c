use convoy_engine::{
    coordinator::{
        simulation_error::SimulationError, system_of_record::SystemOfRecord,
        trip_state_coordinator::StartedBatch,
    },
    routing::routing_service::RoutingService,
    simulation::session_store::SessionEvent,
    view::{map_scene::MapScene, operational_view::OperationalView, tracking_view::TrackingView},
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::render::{self, TripBars};

/// What the simulation runner needs from a view.
pub trait Screen {
    async fn apply(&mut self, event: &SessionEvent) -> anyhow::Result<bool>;
    async fn start(&self) -> Result<StartedBatch, SimulationError>;
    fn cancel(&self);
    fn events(&mut self) -> UnboundedReceiver<SessionEvent>;
    fn scene(&self) -> MapScene;
}

impl<B, S> Screen for TrackingView<B, S>
where
    B: SystemOfRecord,
    S: RoutingService,
{
    async fn apply(&mut self, event: &SessionEvent) -> anyhow::Result<bool> {
        TrackingView::apply(self, event).await
    }

    async fn start(&self) -> Result<StartedBatch, SimulationError> {
        TrackingView::start(self).await
    }

    fn cancel(&self) {
        TrackingView::cancel(self)
    }

    fn events(&mut self) -> UnboundedReceiver<SessionEvent> {
        TrackingView::events(self)
    }

    fn scene(&self) -> MapScene {
        TrackingView::scene(self)
    }
}

impl<B, S> Screen for OperationalView<B, S>
where
    B: SystemOfRecord,
    S: RoutingService,
{
    async fn apply(&mut self, event: &SessionEvent) -> anyhow::Result<bool> {
        OperationalView::apply(self, event).await
    }

    async fn start(&self) -> Result<StartedBatch, SimulationError> {
        OperationalView::start(self).await
    }

    fn cancel(&self) {
        OperationalView::cancel(self)
    }

    fn events(&mut self) -> UnboundedReceiver<SessionEvent> {
        OperationalView::events(self)
    }

    fn scene(&self) -> MapScene {
        OperationalView::scene(self)
    }
}

/// Starts a batch on `screen` and follows it until the backend confirms the
/// delivery, the sync fails, or Ctrl-C cancels it.
pub async fn run_simulation<V: Screen>(screen: &mut V) -> anyhow::Result<()> {
    let mut events = screen.events();

    let started = screen.start().await?;
    info!("{}", started.ack.message);

    let bars = TripBars::new(&started.trip_ids, &screen.scene())?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };

                match event {
                    SessionEvent::Progress { progress, positions, .. } => {
                        bars.update(progress, &positions);
                    }
                    SessionEvent::Completed { .. } => {
                        bars.finish();
                        info!("Vehicles reached the depot, recording the delivery");
                    }
                    SessionEvent::Synced { ref message, .. } => {
                        info!("{}", message);
                        screen.apply(&event).await?;
                        render::print_scene(&screen.scene());
                        break;
                    }
                    SessionEvent::SyncFailed { trip_ids, error, .. } => {
                        bars.finish();
                        let ids = trip_ids
                            .iter()
                            .map(|id| id.to_string())
                            .collect::<Vec<_>>()
                            .join(",");
                        anyhow::bail!(
                            "Delivery was not recorded ({}), retry with `convoy complete {}`",
                            error,
                            ids
                        );
                    }
                    SessionEvent::Started { .. } | SessionEvent::Cancelled { .. } => {}
                }
            }
            _ = &mut ctrl_c => {
                screen.cancel();
                bars.abandon();
                warn!("Simulation cancelled, trips stay in transit");
                break;
            }
        }
    }

    Ok(())
}

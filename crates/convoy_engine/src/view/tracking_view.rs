use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    coordinator::{
        simulation_error::SimulationError,
        system_of_record::{SimulationAck, SystemOfRecord},
        trip_state_coordinator::StartedBatch,
    },
    model::{
        cargo::{Cargo, CargoRoute},
        stop::StopStatus,
    },
    routing::{route_polyline::RoutePolyline, routing_service::RoutingService},
    simulation::{session_store::SessionEvent, simulation_params::SimulationParams},
};

use super::{map_scene::MapScene, view_model::ViewModel};

/// Customer screen following a single shipment.
pub struct TrackingView<B, S> {
    model: ViewModel<B, S>,
    cargo_id: u64,
    cargo_route: Option<CargoRoute>,
    preview: Option<Arc<RoutePolyline>>,
}

impl<B, S> TrackingView<B, S>
where
    B: SystemOfRecord,
    S: RoutingService,
{
    pub fn new(backend: Arc<B>, routing: S, cargo_id: u64, params: SimulationParams) -> Self {
        Self {
            model: ViewModel::new(backend, routing, params),
            cargo_id,
            cargo_route: None,
            preview: None,
        }
    }

    pub fn cargo_id(&self) -> u64 {
        self.cargo_id
    }

    pub fn cargo(&self) -> Option<&Cargo> {
        self.cargo_route.as_ref().map(|route| &route.cargo)
    }

    pub fn cargo_route(&self) -> Option<&CargoRoute> {
        self.cargo_route.as_ref()
    }

    pub fn model(&self) -> &ViewModel<B, S> {
        &self.model
    }

    pub async fn load(&mut self) -> anyhow::Result<()> {
        let cargo_route = self
            .model
            .backend()
            .cargo_route(self.cargo_id)
            .await
            .with_context(|| format!("Failed to load the route of cargo {}", self.cargo_id))?;

        match &cargo_route.trip {
            Some(trip) => {
                self.preview = None;
                self.model.load_trips(vec![trip.clone()]).await;
            }
            None => {
                self.model.load_trips(vec![]).await;

                let waypoints = if cargo_route.route.len() >= 2 {
                    cargo_route.route.clone()
                } else {
                    vec![cargo_route.cargo.station.location, self.model.depot().location]
                };
                self.preview = Some(Arc::new(self.model.resolve(&waypoints).await));
            }
        }

        self.cargo_route = Some(cargo_route);
        Ok(())
    }

    pub async fn refresh(&mut self) -> anyhow::Result<()> {
        self.load().await
    }

    /// Reloads the cargo from the backend once its delivery is recorded.
    /// Returns whether the event triggered a reload.
    pub async fn apply(&mut self, event: &SessionEvent) -> anyhow::Result<bool> {
        match event {
            SessionEvent::Synced { .. } => {
                self.refresh().await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// A shipment can be simulated once it is planned on a trip and until
    /// it is delivered.
    pub fn can_simulate(&self) -> bool {
        self.cargo()
            .is_some_and(|cargo| cargo.status != StopStatus::Delivered)
            && !self.model.startable_trip_ids().is_empty()
    }

    pub async fn start(&self) -> Result<StartedBatch, SimulationError> {
        if !self.can_simulate() {
            return Err(SimulationError::EmptyBatch);
        }

        self.model.start().await
    }

    pub async fn retry_completion(&self) -> Result<SimulationAck, SimulationError> {
        self.model.retry_completion().await
    }

    pub fn cancel(&self) {
        self.model.cancel();
    }

    pub fn events(&mut self) -> UnboundedReceiver<SessionEvent> {
        self.model.events()
    }

    pub fn scene(&self) -> MapScene {
        let mut scene = self.model.scene();
        scene.preview = self.preview.clone();

        if let Some(index) = self
            .cargo_route
            .as_ref()
            .and_then(|route| route.my_stop_index)
        {
            for stop in scene.layers.iter_mut().flat_map(|layer| layer.stops.iter_mut()) {
                stop.highlighted = stop.ordinal == index;
            }
        }

        scene
    }
}

use std::sync::Arc;

use anyhow::Context;
use jiff::civil::Date;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    coordinator::{
        simulation_error::SimulationError,
        system_of_record::{SimulationAck, SystemOfRecord},
        trip_state_coordinator::StartedBatch,
    },
    model::trip::Trip,
    routing::routing_service::RoutingService,
    simulation::{session_store::SessionEvent, simulation_params::SimulationParams},
};

use super::{map_scene::MapScene, view_model::ViewModel};

/// Operator screen showing every trip planned for a date.
pub struct OperationalView<B, S> {
    model: ViewModel<B, S>,
    date: Date,
}

impl<B, S> OperationalView<B, S>
where
    B: SystemOfRecord,
    S: RoutingService,
{
    pub fn new(backend: Arc<B>, routing: S, date: Date, params: SimulationParams) -> Self {
        Self {
            model: ViewModel::new(backend, routing, params),
            date,
        }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn trips(&self) -> &[Trip] {
        self.model.trips()
    }

    pub fn model(&self) -> &ViewModel<B, S> {
        &self.model
    }

    pub async fn load(&mut self) -> anyhow::Result<()> {
        let trips = self
            .model
            .backend()
            .trips_for_date(self.date)
            .await
            .with_context(|| format!("Failed to load the trips of {}", self.date))?;

        self.model.load_trips(trips).await;
        Ok(())
    }

    pub async fn refresh(&mut self) -> anyhow::Result<()> {
        self.load().await
    }

    /// Switches to another date, abandoning the simulations of the
    /// current one.
    /// Reloads the day's trips once the backend recorded a delivery.
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

    pub async fn select_date(&mut self, date: Date) -> anyhow::Result<()> {
        self.model.cancel();
        self.date = date;
        self.load().await
    }

    /// Starts every trip of the date that is not delivered yet.
    pub async fn start(&self) -> Result<StartedBatch, SimulationError> {
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
        self.model.scene()
    }
}

use std::{sync::Arc, time::Duration};

use tokio::time::Instant;

use crate::{
    geopoint::GeoPoint,
    model::trip_id::TripId,
    routing::route_polyline::RoutePolyline,
};

use super::{interpolate::position_at, simulation_params::progress_fraction};

/// Groups the sessions started together by one start request.
pub type BatchId = String;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Idle,
}

/// One simulated traversal of a trip's polyline.
#[derive(Clone, Debug)]
pub struct SimulationSession {
    trip_id: TripId,
    batch_id: BatchId,
    polyline: Arc<RoutePolyline>,
    started_at: Instant,
    duration: Duration,
    progress: f64,
    position: GeoPoint,
    status: SessionStatus,
}

impl SimulationSession {
    /// `None` when the polyline has no point to place the vehicle on.
    pub(crate) fn new(
        trip_id: TripId,
        batch_id: BatchId,
        polyline: Arc<RoutePolyline>,
        started_at: Instant,
        duration: Duration,
    ) -> Option<Self> {
        let position = polyline.first()?;

        Some(SimulationSession {
            trip_id,
            batch_id,
            polyline,
            started_at,
            duration,
            progress: 0.0,
            position,
            status: SessionStatus::Running,
        })
    }

    /// Recomputes progress from the absolute elapsed time. Returns `true`
    /// on the call that brings the session to completion.
    pub(crate) fn advance(&mut self, now: Instant) -> bool {
        if self.status == SessionStatus::Idle {
            return false;
        }

        let elapsed = now.saturating_duration_since(self.started_at);
        self.progress = progress_fraction(elapsed, self.duration).max(self.progress);

        if let Some(position) = position_at(self.polyline.points(), self.progress) {
            self.position = position;
        }

        if self.progress >= 1.0 {
            self.status = SessionStatus::Idle;
            return true;
        }

        false
    }

    pub fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    pub fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    pub fn polyline(&self) -> &Arc<RoutePolyline> {
        &self.polyline
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Progress as a whole percentage, for progress bars.
    pub fn percent(&self) -> u8 {
        (self.progress * 100.0).round() as u8
    }

    pub fn position(&self) -> GeoPoint {
        self.position
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }
}

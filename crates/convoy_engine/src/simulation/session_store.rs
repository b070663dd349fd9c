use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use fxhash::{FxHashMap, FxHashSet};
use parking_lot::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    geopoint::GeoPoint,
    model::trip_id::TripId,
    routing::route_polyline::RoutePolyline,
};

use super::session::{BatchId, SimulationSession};

#[derive(Clone, Debug, PartialEq)]
pub enum BatchState {
    Running,
    /// Every session reached the end, the backend is being notified.
    Completing,
    /// The animation finished but the backend did not record delivery.
    SyncFailed(String),
}

#[derive(Clone, Debug)]
pub struct SimulationBatch {
    id: BatchId,
    trip_ids: Vec<TripId>,
    state: BatchState,
}

impl SimulationBatch {
    pub fn id(&self) -> &BatchId {
        &self.id
    }

    pub fn trip_ids(&self) -> &[TripId] {
        &self.trip_ids
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Started {
        batch_id: BatchId,
        trip_ids: Vec<TripId>,
    },
    Progress {
        batch_id: BatchId,
        progress: f64,
        positions: Vec<(TripId, GeoPoint)>,
    },
    Completed {
        batch_id: BatchId,
        trip_ids: Vec<TripId>,
    },
    Synced {
        trip_ids: Vec<TripId>,
        message: String,
    },
    SyncFailed {
        batch_id: BatchId,
        trip_ids: Vec<TripId>,
        error: String,
    },
    Cancelled {
        batch_id: BatchId,
        trip_ids: Vec<TripId>,
    },
}

pub enum TickOutcome {
    Running,
    /// Returned once, on the tick where the last session reached the end.
    Completed(Vec<TripId>),
    /// The batch was cancelled or already completed, stop ticking.
    Gone,
}

pub type SubscriptionId = usize;

/// A consistent copy of the store, taken under one lock.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    pub sessions: Vec<SimulationSession>,
    pub batches: Vec<SimulationBatch>,
}

impl SessionSnapshot {
    pub fn session(&self, trip_id: &TripId) -> Option<&SimulationSession> {
        self.sessions
            .iter()
            .find(|session| session.trip_id() == trip_id)
    }

    pub fn sync_failed_batches(&self) -> impl Iterator<Item = &SimulationBatch> {
        self.batches
            .iter()
            .filter(|batch| matches!(batch.state, BatchState::SyncFailed(_)))
    }
}

type Subscriber = Box<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Default)]
struct StoreState {
    sessions: FxHashMap<TripId, SimulationSession>,
    batches: FxHashMap<BatchId, SimulationBatch>,
    /// Trips whose start request is waiting on the backend.
    reserved: FxHashSet<TripId>,
}

impl StoreState {
    fn is_running(&self, trip_id: &TripId) -> bool {
        self.reserved.contains(trip_id)
            || self
                .sessions
                .get(trip_id)
                .is_some_and(|session| session.is_running())
    }

    /// The trip's batch finished and its completion request is in flight.
    fn is_syncing(&self, trip_id: &TripId) -> bool {
        self.sessions
            .get(trip_id)
            .and_then(|session| self.batches.get(session.batch_id()))
            .is_some_and(|batch| batch.state == BatchState::Completing)
    }

    /// Running and syncing trips accept neither a start nor a completion.
    fn is_busy(&self, trip_id: &TripId) -> bool {
        self.is_running(trip_id) || self.is_syncing(trip_id)
    }

    fn remove_batch(&mut self, batch_id: &BatchId) -> Option<SimulationBatch> {
        let batch = self.batches.remove(batch_id)?;
        for trip_id in &batch.trip_ids {
            if self
                .sessions
                .get(trip_id)
                .is_some_and(|session| session.batch_id() == batch_id)
            {
                self.sessions.remove(trip_id);
            }
        }
        Some(batch)
    }
}

/// Engine owned record of every simulation session, keyed by trip.
///
/// Only the coordinator and the simulation clock mutate it. Views read
/// copies and observe changes through [`SessionStore::subscribe`].
#[derive(Default)]
pub struct SessionStore {
    state: RwLock<StoreState>,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicUsize,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Callbacks run synchronously on the thread mutating the store and
    /// must not subscribe or unsubscribe themselves.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers
            .write()
            .retain(|(subscription, _)| *subscription != id);
    }

    fn notify(&self, event: SessionEvent) {
        for (_, callback) in self.subscribers.read().iter() {
            callback(&event);
        }
    }

    /// The trip has a running session or a start request in flight.
    pub fn is_running(&self, trip_id: &TripId) -> bool {
        self.state.read().is_running(trip_id)
    }

    pub fn is_syncing(&self, trip_id: &TripId) -> bool {
        self.state.read().is_syncing(trip_id)
    }

    pub fn session(&self, trip_id: &TripId) -> Option<SimulationSession> {
        self.state.read().sessions.get(trip_id).cloned()
    }

    pub fn sessions(&self) -> Vec<SimulationSession> {
        let mut sessions: Vec<SimulationSession> =
            self.state.read().sessions.values().cloned().collect();
        sessions.sort_by(|a, b| a.trip_id().cmp(b.trip_id()));
        sessions
    }

    pub fn batch(&self, batch_id: &BatchId) -> Option<SimulationBatch> {
        self.state.read().batches.get(batch_id).cloned()
    }

    pub fn batches(&self) -> Vec<SimulationBatch> {
        self.state.read().batches.values().cloned().collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        let mut snapshot = SessionSnapshot {
            sessions: state.sessions.values().cloned().collect(),
            batches: state.batches.values().cloned().collect(),
        };
        snapshot
            .sessions
            .sort_by(|a, b| a.trip_id().cmp(b.trip_id()));
        snapshot
    }

    pub fn has_active_batches(&self) -> bool {
        let state = self.state.read();
        !state.reserved.is_empty()
            || state
                .batches
                .values()
                .any(|batch| !matches!(batch.state, BatchState::SyncFailed(_)))
    }

    /// Claims the trips for a start request. Fails with the trips that
    /// already have a running or starting session, or whose completion is
    /// still being recorded.
    pub(crate) fn reserve(&self, trip_ids: &[TripId]) -> Result<(), Vec<TripId>> {
        let mut state = self.state.write();

        let busy: Vec<TripId> = trip_ids
            .iter()
            .filter(|trip_id| state.is_busy(trip_id))
            .cloned()
            .collect();

        if !busy.is_empty() {
            return Err(busy);
        }

        state.reserved.extend(trip_ids.iter().cloned());
        Ok(())
    }

    pub(crate) fn release(&self, trip_ids: &[TripId]) {
        let mut state = self.state.write();
        for trip_id in trip_ids {
            state.reserved.remove(trip_id);
        }
    }

    /// Turns reserved trips into running sessions sharing `started_at`.
    ///
    /// Returns `None` when the reservation was cancelled in the meantime.
    pub(crate) fn create_batch(
        &self,
        polylines: Vec<(TripId, Arc<RoutePolyline>)>,
        started_at: Instant,
        duration: Duration,
    ) -> Option<BatchId> {
        let batch_id = Uuid::new_v4().to_string();
        let trip_ids: Vec<TripId> = polylines.iter().map(|(id, _)| id.clone()).collect();

        {
            let mut state = self.state.write();

            if !trip_ids.iter().all(|id| state.reserved.contains(id)) {
                for trip_id in &trip_ids {
                    state.reserved.remove(trip_id);
                }
                return None;
            }

            let sessions: Option<Vec<SimulationSession>> = polylines
                .into_iter()
                .map(|(trip_id, polyline)| {
                    SimulationSession::new(trip_id, batch_id.clone(), polyline, started_at, duration)
                })
                .collect();

            let Some(sessions) = sessions else {
                for trip_id in &trip_ids {
                    state.reserved.remove(trip_id);
                }
                return None;
            };

            for session in sessions {
                let trip_id = session.trip_id().clone();
                state.reserved.remove(&trip_id);

                // a finished session from an earlier batch is replaced
                if let Some(previous) = state.sessions.insert(trip_id.clone(), session) {
                    let previous_batch = previous.batch_id().clone();
                    let now_empty = state.batches.get_mut(&previous_batch).is_some_and(|batch| {
                        batch.trip_ids.retain(|id| *id != trip_id);
                        batch.trip_ids.is_empty()
                    });
                    if now_empty {
                        state.batches.remove(&previous_batch);
                    }
                }
            }

            state.batches.insert(
                batch_id.clone(),
                SimulationBatch {
                    id: batch_id.clone(),
                    trip_ids: trip_ids.clone(),
                    state: BatchState::Running,
                },
            );
        }

        self.notify(SessionEvent::Started {
            batch_id: batch_id.clone(),
            trip_ids,
        });

        Some(batch_id)
    }

    /// Advances every session of the batch to `now`.
    pub(crate) fn tick(&self, batch_id: &BatchId, now: Instant) -> TickOutcome {
        let mut events = Vec::with_capacity(2);

        let outcome = {
            let mut state = self.state.write();
            let StoreState {
                sessions, batches, ..
            } = &mut *state;

            let Some(batch) = batches.get_mut(batch_id) else {
                return TickOutcome::Gone;
            };

            if batch.state != BatchState::Running {
                return TickOutcome::Gone;
            }

            let mut progress = 1.0_f64;
            let mut positions = Vec::with_capacity(batch.trip_ids.len());
            for trip_id in &batch.trip_ids {
                if let Some(session) = sessions.get_mut(trip_id) {
                    session.advance(now);
                    progress = progress.min(session.progress());
                    positions.push((trip_id.clone(), session.position()));
                }
            }

            events.push(SessionEvent::Progress {
                batch_id: batch_id.clone(),
                progress,
                positions,
            });

            let finished = batch.trip_ids.iter().all(|trip_id| {
                sessions
                    .get(trip_id)
                    .is_none_or(|session| !session.is_running())
            });

            if finished {
                batch.state = BatchState::Completing;
                events.push(SessionEvent::Completed {
                    batch_id: batch_id.clone(),
                    trip_ids: batch.trip_ids.clone(),
                });
                TickOutcome::Completed(batch.trip_ids.clone())
            } else {
                TickOutcome::Running
            }
        };

        for event in events {
            self.notify(event);
        }

        outcome
    }

    pub(crate) fn mark_sync_failed(&self, batch_id: &BatchId, error: String) {
        let trip_ids = {
            let mut state = self.state.write();
            let Some(batch) = state.batches.get_mut(batch_id) else {
                return;
            };
            batch.state = BatchState::SyncFailed(error.clone());
            batch.trip_ids.clone()
        };

        self.notify(SessionEvent::SyncFailed {
            batch_id: batch_id.clone(),
            trip_ids,
            error,
        });
    }

    /// Moves the failed batches fully covered by `trip_ids` back to
    /// `Completing` for a manual retry.
    ///
    /// Fails with the trips whose completion is already in flight.
    pub(crate) fn begin_sync(&self, trip_ids: &[TripId]) -> Result<Vec<BatchId>, Vec<TripId>> {
        let mut state = self.state.write();

        let syncing: Vec<TripId> = trip_ids
            .iter()
            .filter(|trip_id| state.is_syncing(trip_id))
            .cloned()
            .collect();

        if !syncing.is_empty() {
            return Err(syncing);
        }

        let covered: FxHashSet<&TripId> = trip_ids.iter().collect();
        let mut claimed = Vec::new();
        for batch in state.batches.values_mut() {
            if matches!(batch.state, BatchState::SyncFailed(_))
                && batch.trip_ids.iter().all(|id| covered.contains(id))
            {
                batch.state = BatchState::Completing;
                claimed.push(batch.id.clone());
            }
        }

        Ok(claimed)
    }

    /// Drops local state for trips the backend confirmed as delivered.
    pub(crate) fn discard(&self, trip_ids: &[TripId], message: String) {
        {
            let mut state = self.state.write();
            let discarded: FxHashSet<&TripId> = trip_ids.iter().collect();

            state.sessions.retain(|trip_id, session| {
                !(discarded.contains(trip_id) && !session.is_running())
            });
            state.batches.retain(|_, batch| {
                if batch.state == BatchState::Running {
                    return true;
                }
                batch.trip_ids.retain(|id| !discarded.contains(id));
                !batch.trip_ids.is_empty()
            });
        }

        self.notify(SessionEvent::Synced {
            trip_ids: trip_ids.to_vec(),
            message,
        });
    }

    pub(crate) fn cancel_batch(&self, batch_id: &BatchId) -> bool {
        let removed = self.state.write().remove_batch(batch_id);

        match removed {
            Some(batch) => {
                self.notify(SessionEvent::Cancelled {
                    batch_id: batch.id,
                    trip_ids: batch.trip_ids,
                });
                true
            }
            None => false,
        }
    }

    /// Forgets every batch and pending reservation.
    pub(crate) fn cancel_all(&self) -> Vec<BatchId> {
        let removed: Vec<SimulationBatch> = {
            let mut state = self.state.write();
            state.reserved.clear();
            let batch_ids: Vec<BatchId> = state.batches.keys().cloned().collect();
            batch_ids
                .iter()
                .filter_map(|batch_id| state.remove_batch(batch_id))
                .collect()
        };

        removed
            .into_iter()
            .map(|batch| {
                self.notify(SessionEvent::Cancelled {
                    batch_id: batch.id.clone(),
                    trip_ids: batch.trip_ids,
                });
                batch.id
            })
            .collect()
    }
}

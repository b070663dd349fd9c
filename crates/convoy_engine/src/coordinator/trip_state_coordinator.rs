use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::{
    model::trip_id::TripId,
    routing::route_polyline::RoutePolylines,
    simulation::{
        session::BatchId,
        session_store::SessionStore,
        simulation_clock::{RedrawLoop, SimulationClock},
        simulation_params::SimulationParams,
    },
};

use super::{
    simulation_error::SimulationError,
    system_of_record::{SimulationAck, SystemOfRecord},
};

#[derive(Clone, Debug)]
pub struct StartedBatch {
    pub batch_id: BatchId,
    pub trip_ids: Vec<TripId>,
    pub ack: SimulationAck,
}

/// Gates the start and the completion of simulations behind the system of
/// record.
///
/// Sessions only exist for trips the backend moved to in transit, and the
/// backend is told about a completion once per batch. Dropping the
/// coordinator cancels every batch it started.
pub struct TripStateCoordinator<B> {
    backend: Arc<B>,
    clock: SimulationClock,
    loops: Mutex<FxHashMap<BatchId, RedrawLoop>>,
}

impl<B> TripStateCoordinator<B> {
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        self.clock.store()
    }

    pub fn params(&self) -> &SimulationParams {
        self.clock.params()
    }

    /// Stops the redraws of `batch_id` without notifying the backend.
    pub fn cancel(&self, batch_id: &BatchId) -> bool {
        let removed = self.store().cancel_batch(batch_id);

        if let Some(redraw) = self.loops.lock().remove(batch_id) {
            redraw.cancel();
        }

        removed
    }

    pub fn cancel_all(&self) {
        let cancelled = self.store().cancel_all();

        for (_, redraw) in self.loops.lock().drain() {
            redraw.cancel();
        }

        if !cancelled.is_empty() {
            info!("Cancelled {} simulation batches", cancelled.len());
        }
    }
}

impl<B> TripStateCoordinator<B>
where
    B: SystemOfRecord,
{
    pub fn new(backend: Arc<B>, store: Arc<SessionStore>, params: SimulationParams) -> Self {
        Self {
            backend,
            clock: SimulationClock::new(store, params),
            loops: Mutex::new(FxHashMap::default()),
        }
    }

    /// Starts one session per trip, all sharing the same start instant.
    ///
    /// Nothing is started when a trip is already running or when the
    /// backend refuses the request.
    pub async fn start_simulation(
        &self,
        trip_ids: &[TripId],
        polylines: &RoutePolylines,
    ) -> Result<StartedBatch, SimulationError> {
        let trip_ids = unique_trip_ids(trip_ids);
        if trip_ids.is_empty() {
            return Err(SimulationError::EmptyBatch);
        }

        let batch = trip_ids
            .iter()
            .map(|trip_id| {
                let polyline = polylines
                    .get(trip_id)
                    .ok_or_else(|| SimulationError::UnknownTrip(trip_id.clone()))?;

                if !polyline.is_simulatable() {
                    return Err(SimulationError::Degenerate(trip_id.clone()));
                }

                Ok((trip_id.clone(), Arc::clone(polyline)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Err(busy) = self.store().reserve(&trip_ids) {
            info!("Ignoring start request, {} trips already running", busy.len());
            return Err(SimulationError::AlreadyRunning(busy));
        }

        info!("Starting simulation of {} trips", trip_ids.len());
        let ack = match self.backend.start_simulation(&trip_ids).await {
            Ok(ack) => ack,
            Err(err) => {
                self.store().release(&trip_ids);
                warn!("Start request rejected: {:#}", err);
                return Err(SimulationError::StartRejected(err));
            }
        };
        info!("{}", ack.message);

        let Some(batch_id) = self
            .store()
            .create_batch(batch, Instant::now(), self.params().duration)
        else {
            warn!("Simulation cancelled while the backend was starting it");
            return Err(SimulationError::Cancelled);
        };

        let backend = Arc::clone(&self.backend);
        let store = Arc::clone(self.store());
        let redraw = self
            .clock
            .start(batch_id.clone(), move |batch_id, trip_ids| async move {
                // failures are kept in the store for a manual retry
                let _ = sync_completion(&*backend, &store, &trip_ids, &[batch_id]).await;
            });

        let mut loops = self.loops.lock();
        loops.retain(|_, redraw| !redraw.is_finished());
        loops.insert(batch_id.clone(), redraw);

        Ok(StartedBatch {
            batch_id,
            trip_ids,
            ack,
        })
    }

    /// Tells the backend the trips were delivered.
    ///
    /// Runs automatically when a batch finishes. Calling it again after a
    /// failed sync is the only way to retry. Trips whose completion is
    /// still in flight are refused.
    pub async fn complete_simulation(
        &self,
        trip_ids: &[TripId],
    ) -> Result<SimulationAck, SimulationError> {
        let trip_ids = unique_trip_ids(trip_ids);
        if trip_ids.is_empty() {
            return Err(SimulationError::EmptyBatch);
        }

        let running: Vec<TripId> = trip_ids
            .iter()
            .filter(|trip_id| self.store().is_running(trip_id))
            .cloned()
            .collect();
        if !running.is_empty() {
            return Err(SimulationError::AlreadyRunning(running));
        }

        let batch_ids = self
            .store()
            .begin_sync(&trip_ids)
            .map_err(SimulationError::SyncInFlight)?;

        sync_completion(&*self.backend, self.store(), &trip_ids, &batch_ids).await
    }
}

impl<B> Drop for TripStateCoordinator<B> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn sync_completion<B>(
    backend: &B,
    store: &SessionStore,
    trip_ids: &[TripId],
    batch_ids: &[BatchId],
) -> Result<SimulationAck, SimulationError>
where
    B: SystemOfRecord,
{
    info!("Completing simulation of {} trips", trip_ids.len());

    match backend.complete_simulation(trip_ids).await {
        Ok(ack) => {
            info!("{}", ack.message);
            store.discard(trip_ids, ack.message.clone());
            Ok(ack)
        }
        Err(err) => {
            warn!("Delivery was not recorded: {:#}", err);
            for batch_id in batch_ids {
                store.mark_sync_failed(batch_id, format!("{:#}", err));
            }
            Err(SimulationError::CompletionFailed(err))
        }
    }
}

fn unique_trip_ids(trip_ids: &[TripId]) -> Vec<TripId> {
    let mut seen = FxHashSet::default();
    trip_ids
        .iter()
        .filter(|trip_id| seen.insert(*trip_id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use jiff::civil::Date;

    use super::*;
    use crate::{
        geopoint::GeoPoint,
        model::{cargo::CargoRoute, trip::Trip},
        routing::route_polyline::RoutePolyline,
    };

    #[derive(Default)]
    struct CountingBackend {
        starts: AtomicUsize,
        completes: AtomicUsize,
        complete_delay: Duration,
    }

    impl SystemOfRecord for CountingBackend {
        async fn trips_for_date(&self, _date: Date) -> anyhow::Result<Vec<Trip>> {
            Ok(vec![])
        }

        async fn cargo_route(&self, cargo_id: u64) -> anyhow::Result<CargoRoute> {
            anyhow::bail!("cargo {} not found", cargo_id)
        }

        async fn start_simulation(&self, trip_ids: &[TripId]) -> anyhow::Result<SimulationAck> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(SimulationAck {
                message: String::from("started"),
                updated_cargo_count: trip_ids.len(),
            })
        }

        async fn complete_simulation(&self, trip_ids: &[TripId]) -> anyhow::Result<SimulationAck> {
            self.completes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.complete_delay).await;
            Ok(SimulationAck {
                message: String::from("completed"),
                updated_cargo_count: trip_ids.len(),
            })
        }
    }

    fn coordinator() -> TripStateCoordinator<CountingBackend> {
        TripStateCoordinator::new(
            Arc::new(CountingBackend::default()),
            SessionStore::new(),
            SimulationParams::customer(),
        )
    }

    fn two_point_polylines() -> RoutePolylines {
        let mut polylines = RoutePolylines::default();
        polylines.insert(
            TripId::from("T1"),
            Arc::new(RoutePolyline::straight(vec![
                GeoPoint::new(40.77, 29.94),
                GeoPoint::new(40.82, 29.93),
            ])),
        );
        polylines
    }

    #[tokio::test]
    async fn test_start_validates_before_calling_backend() {
        let coordinator = coordinator();
        let mut polylines = RoutePolylines::default();
        polylines.insert(
            TripId::from("T1"),
            Arc::new(RoutePolyline::straight(vec![GeoPoint::new(40.77, 29.94)])),
        );

        assert!(matches!(
            coordinator.start_simulation(&[], &polylines).await,
            Err(SimulationError::EmptyBatch)
        ));
        assert!(matches!(
            coordinator.start_simulation(&[TripId::from("T1")], &polylines).await,
            Err(SimulationError::Degenerate(id)) if id == TripId::from("T1")
        ));
        assert!(matches!(
            coordinator.start_simulation(&[TripId::from("T9")], &polylines).await,
            Err(SimulationError::UnknownTrip(_))
        ));
        assert_eq!(coordinator.backend().starts.load(Ordering::SeqCst), 0);
        assert!(!coordinator.store().is_running(&TripId::from("T1")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_ids_start_one_session() {
        let coordinator = coordinator();
        let polylines = two_point_polylines();

        let started = coordinator
            .start_simulation(&[TripId::from("T1"), TripId::from("T1")], &polylines)
            .await
            .unwrap();

        assert_eq!(started.trip_ids, vec![TripId::from("T1")]);
        assert_eq!(coordinator.store().sessions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_running_batches() {
        let coordinator = coordinator();
        let store = Arc::clone(coordinator.store());
        let polylines = two_point_polylines();

        coordinator
            .start_simulation(&[TripId::from("T1")], &polylines)
            .await
            .unwrap();
        drop(coordinator);

        assert!(!store.has_active_batches());
        assert!(store.session(&TripId::from("T1")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_in_flight_blocks_retry_and_restart() {
        let coordinator = TripStateCoordinator::new(
            Arc::new(CountingBackend {
                complete_delay: Duration::from_secs(5),
                ..CountingBackend::default()
            }),
            SessionStore::new(),
            SimulationParams::customer(),
        );
        let polylines = two_point_polylines();
        let trip_ids = [TripId::from("T1")];

        coordinator.start_simulation(&trip_ids, &polylines).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10_100)).await;

        assert_eq!(coordinator.backend().completes.load(Ordering::SeqCst), 1);
        assert!(coordinator.store().is_syncing(&trip_ids[0]));
        assert!(matches!(
            coordinator.complete_simulation(&trip_ids).await,
            Err(SimulationError::SyncInFlight(ids)) if ids == trip_ids
        ));
        assert!(matches!(
            coordinator.start_simulation(&trip_ids, &polylines).await,
            Err(SimulationError::AlreadyRunning(_))
        ));

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(coordinator.backend().completes.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.backend().starts.load(Ordering::SeqCst), 1);
        assert!(coordinator.store().session(&trip_ids[0]).is_none());

        coordinator.start_simulation(&trip_ids, &polylines).await.unwrap();
        assert_eq!(coordinator.backend().starts.load(Ordering::SeqCst), 2);
    }
}

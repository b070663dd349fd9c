use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::model::trip_id::TripId;

use super::{
    session::BatchId,
    session_store::{SessionStore, TickOutcome},
    simulation_params::SimulationParams,
};

/// The recurring redraw task of one batch.
///
/// Dropping it leaves the task running, call [`RedrawLoop::cancel`] to
/// deregister it.
pub struct RedrawLoop {
    batch_id: BatchId,
    handle: JoinHandle<()>,
}

impl RedrawLoop {
    pub fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

/// Converts wall clock time into session progress, one redraw per frame.
pub struct SimulationClock {
    store: Arc<SessionStore>,
    params: SimulationParams,
}

impl SimulationClock {
    pub fn new(store: Arc<SessionStore>, params: SimulationParams) -> Self {
        Self { store, params }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// One redraw of `batch_id` at `now`.
    ///
    /// Progress derives from the elapsed time since the batch started, not
    /// from the number of ticks, so a slow frame rate never skews it.
    pub fn tick(&self, batch_id: &BatchId, now: Instant) -> TickOutcome {
        self.store.tick(batch_id, now)
    }

    /// Schedules redraws of `batch_id` until every session completes,
    /// then runs `on_complete` exactly once. A batch removed from the store
    /// stops the loop without running it.
    pub fn start<F, Fut>(&self, batch_id: BatchId, on_complete: F) -> RedrawLoop
    where
        F: FnOnce(BatchId, Vec<TripId>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let frame_interval = self.params.frame_interval.max(Duration::from_millis(1));
        let id = batch_id.clone();

        let handle = tokio::spawn(async move {
            let mut frames = tokio::time::interval(frame_interval);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                frames.tick().await;

                match store.tick(&id, Instant::now()) {
                    TickOutcome::Running => {}
                    TickOutcome::Completed(trip_ids) => {
                        debug!("Batch {} reached the end of its route", id);
                        on_complete(id, trip_ids).await;
                        break;
                    }
                    TickOutcome::Gone => {
                        debug!("Batch {} is gone, stopping redraws", id);
                        break;
                    }
                }
            }
        });

        RedrawLoop { batch_id, handle }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::{
        geopoint::GeoPoint,
        routing::route_polyline::RoutePolyline,
        simulation::{session_store::SessionEvent, simulation_params::DEFAULT_FRAME_INTERVAL},
    };

    fn start_batch(store: &SessionStore, started_at: Instant) -> BatchId {
        let trip_ids = vec![TripId::from("T1")];
        store.reserve(&trip_ids).unwrap();
        store
            .create_batch(
                vec![(
                    TripId::from("T1"),
                    Arc::new(RoutePolyline::straight(vec![
                        GeoPoint::new(40.77, 29.94),
                        GeoPoint::new(40.80, 29.935),
                        GeoPoint::new(40.82, 29.93),
                    ])),
                )],
                started_at,
                Duration::from_secs(10),
            )
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_completes_within_one_frame() {
        let store = SessionStore::new();
        let clock = SimulationClock::new(Arc::clone(&store), SimulationParams::customer());

        let progress = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&progress);
        store.subscribe(move |event| {
            if let SessionEvent::Progress { progress, .. } = event {
                sink.lock().push(*progress);
            }
        });

        let completions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completions);
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        let start = Instant::now();
        let batch_id = start_batch(&store, start);
        clock.start(batch_id, move |_, trip_ids| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = done_tx.send((Instant::now(), trip_ids));
        });

        let (finished_at, trip_ids) = done_rx.await.unwrap();

        assert_eq!(trip_ids, vec![TripId::from("T1")]);
        assert_eq!(completions.load(Ordering::SeqCst), 1);

        let elapsed = finished_at - start;
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed <= Duration::from_secs(10) + DEFAULT_FRAME_INTERVAL);

        let progress = progress.lock();
        assert_eq!(progress.first(), Some(&0.0));
        assert_eq!(progress.last(), Some(&1.0));
        assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_loop_never_completes() {
        let store = SessionStore::new();
        let clock = SimulationClock::new(Arc::clone(&store), SimulationParams::customer());
        let completions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completions);

        let batch_id = start_batch(&store, Instant::now());
        let redraw = clock.start(batch_id.clone(), move |_, _| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(3)).await;
        store.cancel_batch(&batch_id);
        redraw.cancel();
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert!(redraw.is_finished());
        assert!(store.session(&TripId::from("T1")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_batch_stops_the_loop() {
        let store = SessionStore::new();
        let clock = SimulationClock::new(Arc::clone(&store), SimulationParams::customer());

        let batch_id = start_batch(&store, Instant::now());
        let redraw = clock.start(batch_id.clone(), |_, _| async {});

        tokio::time::sleep(Duration::from_secs(1)).await;
        store.cancel_batch(&batch_id);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(redraw.is_finished());
    }
}

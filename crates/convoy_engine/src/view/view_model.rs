use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, warn};

use crate::{
    coordinator::{
        simulation_error::SimulationError,
        system_of_record::{SimulationAck, SystemOfRecord},
        trip_state_coordinator::{StartedBatch, TripStateCoordinator},
    },
    geopoint::GeoPoint,
    model::{depot::Depot, trip::Trip, trip_id::TripId},
    routing::{
        route_polyline::{RoutePolyline, RoutePolylines},
        route_resolver::RouteResolver,
        routing_service::RoutingService,
    },
    simulation::{
        session_store::{SessionEvent, SessionSnapshot, SessionStore, SubscriptionId},
        simulation_params::SimulationParams,
    },
};

use super::map_scene::{DepotMarker, MapScene, StopMarker, TripLayer, VehicleMarker, route_color};

/// Session handling shared by the customer and the operator screens.
///
/// Holds the trips on screen and their resolved polylines, starts them
/// through the coordinator and turns the session store into a [`MapScene`].
pub struct ViewModel<B, S> {
    resolver: RouteResolver<S>,
    coordinator: TripStateCoordinator<B>,
    depot: Depot,
    trips: Vec<Trip>,
    polylines: RoutePolylines,
    subscriptions: Vec<SubscriptionId>,
}

impl<B, S> ViewModel<B, S>
where
    B: SystemOfRecord,
    S: RoutingService,
{
    pub fn new(backend: Arc<B>, routing: S, params: SimulationParams) -> Self {
        Self {
            resolver: RouteResolver::new(routing),
            coordinator: TripStateCoordinator::new(backend, SessionStore::new(), params),
            depot: Depot::default(),
            trips: Vec::new(),
            polylines: RoutePolylines::default(),
            subscriptions: Vec::new(),
        }
    }

    pub fn depot(&self) -> &Depot {
        &self.depot
    }

    pub fn backend(&self) -> &Arc<B> {
        self.coordinator.backend()
    }

    pub fn coordinator(&self) -> &TripStateCoordinator<B> {
        &self.coordinator
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        self.coordinator.store()
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn trip(&self, trip_id: &TripId) -> Option<&Trip> {
        self.trips.iter().find(|trip| trip.id == *trip_id)
    }

    pub fn polylines(&self) -> &RoutePolylines {
        &self.polylines
    }

    /// Replaces the trips on screen and resolves one polyline per trip.
    ///
    /// Trips without a usable waypoint sequence stay listed but get no
    /// polyline, so they are neither drawn nor simulated.
    pub async fn load_trips(&mut self, trips: Vec<Trip>) {
        let depot = self.depot.location;

        let waypoints: Vec<(TripId, Vec<GeoPoint>)> = trips
            .iter()
            .filter_map(|trip| match trip.waypoints(depot) {
                Ok(waypoints) => Some((trip.id.clone(), waypoints)),
                Err(err) => {
                    warn!("Not drawing trip {}: {}", trip.id, err);
                    None
                }
            })
            .collect();

        debug!("Resolving routes of {} trips", waypoints.len());
        let mut polylines = self.resolver.resolve_all(waypoints).await;
        polylines.retain(|trip_id, polyline| {
            let usable = polyline.is_simulatable();
            if !usable {
                warn!("Not drawing trip {}: route has {} points", trip_id, polyline.len());
            }
            usable
        });

        self.polylines = polylines;
        self.trips = trips;
    }

    /// Resolves a route that is drawn but never simulated.
    pub async fn resolve(&self, waypoints: &[GeoPoint]) -> RoutePolyline {
        self.resolver.resolve(waypoints).await
    }

    /// Loaded trips a start request would cover: drawn and not delivered.
    pub fn startable_trip_ids(&self) -> Vec<TripId> {
        self.trips
            .iter()
            .filter(|trip| !trip.is_delivered() && self.polylines.contains_key(&trip.id))
            .map(|trip| trip.id.clone())
            .collect()
    }

    pub async fn start(&self) -> Result<StartedBatch, SimulationError> {
        let trip_ids = self.startable_trip_ids();
        self.coordinator
            .start_simulation(&trip_ids, &self.polylines)
            .await
    }

    /// Retries the backend sync of every batch whose completion failed.
    pub async fn retry_completion(&self) -> Result<SimulationAck, SimulationError> {
        let trip_ids: Vec<TripId> = self
            .store()
            .snapshot()
            .sync_failed_batches()
            .flat_map(|batch| batch.trip_ids().iter().cloned())
            .collect();

        self.coordinator.complete_simulation(&trip_ids).await
    }

    pub fn cancel(&self) {
        self.coordinator.cancel_all();
    }

    /// Streams session events until the view is dropped.
    pub fn events(&mut self) -> UnboundedReceiver<SessionEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = self.store().subscribe(move |event| {
            let _ = sender.send(event.clone());
        });
        self.subscriptions.push(subscription);
        receiver
    }

    pub fn scene(&self) -> MapScene {
        let snapshot = self.store().snapshot();

        let layers = self
            .trips
            .iter()
            .enumerate()
            .filter_map(|(index, trip)| self.trip_layer(index, trip, &snapshot))
            .collect();

        MapScene {
            depot: DepotMarker {
                name: self.depot.name.clone(),
                location: self.depot.location,
            },
            layers,
            preview: None,
        }
    }

    fn trip_layer(&self, index: usize, trip: &Trip, snapshot: &SessionSnapshot) -> Option<TripLayer> {
        let polyline = self.polylines.get(&trip.id)?;

        let mut stops: Vec<StopMarker> = trip
            .stops
            .iter()
            .filter_map(|stop| {
                Some(StopMarker {
                    ordinal: stop.ordinal,
                    station_name: stop.station_name.clone(),
                    location: stop.coords?,
                    status: stop.status(),
                    cargo_count: stop.cargo_count,
                    total_weight: stop.total_weight,
                    highlighted: false,
                })
            })
            .collect();
        stops.sort_by_key(|stop| stop.ordinal);

        let vehicle = match snapshot.session(&trip.id) {
            Some(session) => Some(VehicleMarker {
                plate: trip.vehicle.plate.clone(),
                location: session.position(),
                progress: session.progress(),
                percent: session.percent(),
                running: session.is_running(),
            }),
            // delivered trips are drawn without a vehicle
            None if trip.is_delivered() => None,
            None => polyline.first().map(|location| VehicleMarker {
                plate: trip.vehicle.plate.clone(),
                location,
                progress: 0.0,
                percent: 0,
                running: false,
            }),
        };

        Some(TripLayer {
            trip_id: trip.id.clone(),
            status: trip.status,
            color: route_color(index),
            polyline: Arc::clone(polyline),
            stops,
            vehicle,
            distance_km: trip.distance,
        })
    }
}

impl<B, S> Drop for ViewModel<B, S> {
    fn drop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            self.coordinator.store().unsubscribe(subscription);
        }
    }
}

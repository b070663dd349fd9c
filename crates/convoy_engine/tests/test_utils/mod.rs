#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use convoy_engine::{
    coordinator::system_of_record::{SimulationAck, SystemOfRecord},
    geopoint::GeoPoint,
    model::{
        cargo::{Cargo, CargoRoute},
        station::Station,
        stop::{Stop, StopStatus},
        trip::{Trip, TripStatus},
        trip_id::TripId,
        vehicle::Vehicle,
    },
    routing::routing_service::{RoutingError, RoutingService},
    simulation::session_store::SessionEvent,
};
use fxhash::FxHashMap;
use jiff::civil::Date;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

//
//  Stations used by the fixtures, all in Kocaeli:
//
//  Gebze     (40.8027, 29.4307)
//  Darıca    (40.7692, 29.3753)
//  Körfez    (40.7760, 29.7360)
//  Derince   (40.7553, 29.8147)
//  Başiskele (40.7150, 29.9300)
//
//  Every trip ends at the Umuttepe depot (40.8225, 29.9250).
//
pub const GEBZE: GeoPoint = GeoPoint::new(40.8027, 29.4307);
pub const DARICA: GeoPoint = GeoPoint::new(40.7692, 29.3753);
pub const KORFEZ: GeoPoint = GeoPoint::new(40.7760, 29.7360);
pub const DERINCE: GeoPoint = GeoPoint::new(40.7553, 29.8147);
pub const BASISKELE: GeoPoint = GeoPoint::new(40.7150, 29.9300);

pub fn create_stop(ordinal: usize, name: &str, coords: Option<GeoPoint>, cargo_ids: &[u64]) -> Stop {
    let mut stop = Stop::new(ordinal, name, coords);
    stop.cargo_ids = cargo_ids.to_vec();
    stop.cargo_count = cargo_ids.len();
    stop.total_weight = 25.0 * cargo_ids.len() as f64;
    stop.senders = cargo_ids.iter().map(|id| format!("Sender {}", id)).collect();
    stop
}

pub fn create_trip(id: u64, plate: &str, stops: Vec<Stop>) -> Trip {
    Trip {
        id: TripId::from(id),
        vehicle: Vehicle {
            id,
            plate: String::from(plate),
            capacity_kg: 500.0,
            is_rental: false,
        },
        stops,
        distance: 42.0,
        total_cost: 42.0,
        start_station: None,
        status: TripStatus::Pending,
    }
}

/// Two trips, `1` through Gebze and Körfez, `2` through Darıca and Derince.
pub fn create_two_trips() -> Vec<Trip> {
    vec![
        create_trip(
            1,
            "41 ABC 01",
            vec![
                create_stop(0, "Gebze", Some(GEBZE), &[11, 12]),
                create_stop(1, "Körfez", Some(KORFEZ), &[13]),
            ],
        ),
        create_trip(
            2,
            "41 ABC 02",
            vec![
                create_stop(0, "Darıca", Some(DARICA), &[21]),
                create_stop(1, "Derince", Some(DERINCE), &[22]),
            ],
        ),
    ]
}

pub fn create_cargo(id: u64, status: StopStatus, location: GeoPoint) -> Cargo {
    Cargo {
        id,
        station: Station {
            id: 1,
            name: String::from("Başiskele"),
            location,
        },
        weight: 12.5,
        quantity: 1,
        status,
        target_date: Date::new(2025, 1, 15).ok(),
    }
}

/// In memory system of record, applying start and complete requests to
/// its own trips like the real backend does.
#[derive(Default)]
pub struct MockBackend {
    trips: Mutex<Vec<Trip>>,
    cargo_routes: Mutex<FxHashMap<u64, CargoRoute>>,
    start_calls: Mutex<Vec<Vec<TripId>>>,
    complete_calls: Mutex<Vec<Vec<TripId>>>,
    fail_start: AtomicBool,
    fail_complete: AtomicBool,
    reads: AtomicUsize,
}

impl MockBackend {
    pub fn new(trips: Vec<Trip>) -> Self {
        Self {
            trips: Mutex::new(trips),
            ..Self::default()
        }
    }

    pub fn with_cargo_route(self, cargo_route: CargoRoute) -> Self {
        self.cargo_routes
            .lock()
            .insert(cargo_route.cargo.id, cargo_route);
        self
    }

    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn fail_complete(&self, fail: bool) {
        self.fail_complete.store(fail, Ordering::SeqCst);
    }

    pub fn start_calls(&self) -> Vec<Vec<TripId>> {
        self.start_calls.lock().clone()
    }

    pub fn complete_calls(&self) -> Vec<Vec<TripId>> {
        self.complete_calls.lock().clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn trip(&self, trip_id: &TripId) -> Option<Trip> {
        self.trips
            .lock()
            .iter()
            .find(|trip| trip.id == *trip_id)
            .cloned()
    }

    fn transition(&self, trip_ids: &[TripId], from: StopStatus, to: StopStatus) -> usize {
        let mut updated = 0;

        for trip in self
            .trips
            .lock()
            .iter_mut()
            .filter(|trip| trip_ids.contains(&trip.id))
        {
            for stop in trip.stops.iter_mut().filter(|stop| stop.status() == from) {
                stop.advance_status(to);
                updated += stop.cargo_count;
            }
            trip.status = trip.derived_status();
        }

        updated
    }
}

impl SystemOfRecord for MockBackend {
    async fn trips_for_date(&self, _date: Date) -> anyhow::Result<Vec<Trip>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.trips.lock().clone())
    }

    async fn cargo_route(&self, cargo_id: u64) -> anyhow::Result<CargoRoute> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.cargo_routes
            .lock()
            .get(&cargo_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("cargo {} not found", cargo_id))
    }

    async fn start_simulation(&self, trip_ids: &[TripId]) -> anyhow::Result<SimulationAck> {
        self.start_calls.lock().push(trip_ids.to_vec());

        if self.fail_start.load(Ordering::SeqCst) {
            anyhow::bail!("503 Service Unavailable");
        }

        let updated = self.transition(trip_ids, StopStatus::Pending, StopStatus::InTransit);
        Ok(SimulationAck {
            message: format!("Simulation started, {} cargo on the road", updated),
            updated_cargo_count: updated,
        })
    }

    async fn complete_simulation(&self, trip_ids: &[TripId]) -> anyhow::Result<SimulationAck> {
        self.complete_calls.lock().push(trip_ids.to_vec());

        if self.fail_complete.load(Ordering::SeqCst) {
            anyhow::bail!("503 Service Unavailable");
        }

        let updated = self.transition(trip_ids, StopStatus::InTransit, StopStatus::Delivered);
        Ok(SimulationAck {
            message: format!("Simulation completed, {} cargo delivered", updated),
            updated_cargo_count: updated,
        })
    }
}

/// Routing service adding the midpoint of every leg to the waypoints, or
/// failing every call.
#[derive(Default)]
pub struct ScriptedRouting {
    fail: bool,
}

impl ScriptedRouting {
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl RoutingService for ScriptedRouting {
    async fn route(&self, waypoints: &[GeoPoint]) -> Result<Vec<GeoPoint>, RoutingError> {
        if self.fail {
            return Err(RoutingError::Unavailable(String::from("connection refused")));
        }

        let mut path = Vec::with_capacity(waypoints.len() * 2);
        for pair in waypoints.windows(2) {
            path.push(pair[0]);
            path.push(GeoPoint::new(
                (pair[0].lat + pair[1].lat) / 2.0,
                (pair[0].lng + pair[1].lng) / 2.0,
            ));
        }
        path.extend(waypoints.last().copied());
        Ok(path)
    }
}

/// Waits for the first event matching `predicate`, skipping the others.
pub async fn next_event<F>(events: &mut UnboundedReceiver<SessionEvent>, predicate: F) -> SessionEvent
where
    F: Fn(&SessionEvent) -> bool,
{
    loop {
        let event = events.recv().await.expect("event stream closed");
        if predicate(&event) {
            return event;
        }
    }
}

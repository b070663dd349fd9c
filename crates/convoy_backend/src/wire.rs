//! JSON bodies exchanged with the backend and their conversion into the
//! engine model.

use convoy_engine::{
    geopoint::GeoPoint,
    model::{
        cargo::{Cargo, CargoRoute},
        station::Station,
        stop::{Stop, StopStatus},
        trip::{Trip, TripStatus},
        trip_id::TripId,
        vehicle::Vehicle,
    },
};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub(crate) struct MessageBody {
    pub message: String,
}

#[derive(Deserialize)]
pub(crate) struct TripsResponse {
    #[serde(default)]
    pub trips: Vec<TripBody>,
}

#[derive(Deserialize)]
struct VehicleBody {
    id: u64,
    #[serde(default)]
    plate: Option<String>,
    // the customer API names it `capacity`
    #[serde(alias = "capacity")]
    capacity_kg: f64,
    #[serde(default)]
    is_rental: bool,
}

impl From<VehicleBody> for Vehicle {
    fn from(body: VehicleBody) -> Self {
        Vehicle {
            plate: body.plate.unwrap_or_else(|| format!("Vehicle-{}", body.id)),
            id: body.id,
            capacity_kg: body.capacity_kg,
            is_rental: body.is_rental,
        }
    }
}

#[derive(Deserialize)]
struct StopBody {
    #[serde(default)]
    station_name: Option<String>,
    #[serde(default)]
    coords: Option<[f64; 2]>,
    #[serde(default)]
    total_weight: f64,
    #[serde(default)]
    cargo_count: usize,
    #[serde(default)]
    senders: Vec<String>,
    #[serde(default)]
    status: Option<StopStatus>,
    #[serde(default)]
    is_my_cargo: bool,
}

impl StopBody {
    fn into_stop(self, ordinal: usize, default_status: StopStatus) -> Stop {
        let mut stop = Stop::new(
            ordinal,
            self.station_name.unwrap_or_default(),
            stop_coords(self.coords),
        )
        .with_status(self.status.unwrap_or(default_status));
        stop.total_weight = self.total_weight;
        stop.cargo_count = self.cargo_count;
        stop.senders = self.senders;
        stop
    }
}

/// The backend fills unknown stop coordinates with `[0, 0]`.
fn stop_coords(coords: Option<[f64; 2]>) -> Option<GeoPoint> {
    coords
        .filter(|coords| *coords != [0.0, 0.0])
        .map(GeoPoint::from)
}

#[derive(Deserialize)]
pub(crate) struct TripBody {
    trip_id: u64,
    vehicle: VehicleBody,
    #[serde(default)]
    start_station: Option<String>,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    total_cost: Option<f64>,
    #[serde(default)]
    stops: Vec<StopBody>,
    #[serde(default)]
    status: Option<TripStatus>,
}

impl From<TripBody> for Trip {
    fn from(body: TripBody) -> Self {
        let stops = body
            .stops
            .into_iter()
            .enumerate()
            .map(|(ordinal, stop)| stop.into_stop(ordinal, StopStatus::Pending))
            .collect();

        let mut trip = Trip {
            id: TripId::from(body.trip_id),
            vehicle: body.vehicle.into(),
            stops,
            distance: body.distance.unwrap_or_default(),
            total_cost: body.total_cost.unwrap_or_default(),
            start_station: body.start_station.filter(|name| !name.is_empty()),
            status: TripStatus::Empty,
        };
        trip.status = body.status.unwrap_or_else(|| trip.derived_status());
        trip
    }
}

#[derive(Deserialize)]
struct StationBody {
    id: u64,
    name: String,
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct CargoBody {
    id: u64,
    status: StopStatus,
    weight: f64,
    #[serde(default)]
    quantity: u32,
    #[serde(rename = "targetDate", default)]
    target_date: Option<Date>,
    station: StationBody,
}

impl From<CargoBody> for Cargo {
    fn from(body: CargoBody) -> Self {
        Cargo {
            id: body.id,
            station: Station {
                id: body.station.id,
                name: body.station.name,
                location: GeoPoint::new(body.station.lat, body.station.lng),
            },
            weight: body.weight,
            quantity: body.quantity,
            status: body.status,
            target_date: body.target_date,
        }
    }
}

#[derive(Deserialize)]
struct CargoTripBody {
    trip_id: u64,
    vehicle: VehicleBody,
    #[serde(default)]
    total_distance: Option<f64>,
    #[serde(default)]
    stops: Vec<StopBody>,
    /// `-1` when the cargo is on none of the stops.
    #[serde(default)]
    my_stop_index: Option<i64>,
}

#[derive(Deserialize)]
pub(crate) struct CargoRouteResponse {
    #[serde(default)]
    route: Vec<[f64; 2]>,
    cargo: CargoBody,
    #[serde(default)]
    trip: Option<CargoTripBody>,
}

impl From<CargoRouteResponse> for CargoRoute {
    fn from(body: CargoRouteResponse) -> Self {
        let cargo = Cargo::from(body.cargo);

        // the customer API only knows the status of the followed cargo
        let my_stop_index = body
            .trip
            .as_ref()
            .and_then(|trip| trip.my_stop_index)
            .and_then(|index| usize::try_from(index).ok());

        let trip = body.trip.map(|trip| {
            let stops = trip
                .stops
                .into_iter()
                .enumerate()
                .map(|(ordinal, stop)| {
                    let is_my_cargo = stop.is_my_cargo;
                    let mut stop = stop.into_stop(ordinal, cargo.status);
                    if is_my_cargo {
                        stop.cargo_ids.push(cargo.id);
                    }
                    stop
                })
                .collect();

            let mut trip = Trip {
                id: TripId::from(trip.trip_id),
                vehicle: trip.vehicle.into(),
                stops,
                distance: trip.total_distance.unwrap_or_default(),
                total_cost: 0.0,
                start_station: None,
                status: TripStatus::Empty,
            };
            trip.status = trip.derived_status();
            trip
        });

        CargoRoute {
            route: body.route.into_iter().map(GeoPoint::from).collect(),
            cargo,
            trip,
            my_stop_index,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct SimulationRequest<'a> {
    pub trip_ids: &'a [TripId],
}

#[derive(Deserialize)]
pub(crate) struct SimulationResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub updated_cargo_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_body() {
        let body: TripBody = serde_json::from_value(serde_json::json!({
            "trip_id": 12,
            "vehicle": { "id": 3, "plate": "41 ABC 03", "capacity_kg": 750, "is_rental": true },
            "start_station": "",
            "distance": 38.4,
            "total_cost": 38.4,
            "stops": [
                {
                    "station_name": "Gebze",
                    "total_weight": 40,
                    "coords": [40.8027, 29.4307],
                    "cargo_count": 2,
                    "senders": ["Ayşe Yılmaz", "Mehmet Kaya"],
                    "status": "in_transit"
                },
                { "station_name": "Kandıra", "coords": [0, 0], "cargo_count": 1 }
            ],
            "status": "in_transit"
        }))
        .unwrap();

        let trip = Trip::from(body);

        assert_eq!(trip.id, TripId::from(12u64));
        assert!(trip.vehicle.is_rental);
        assert_eq!(trip.start_station, None);
        assert_eq!(trip.status, TripStatus::InTransit);
        assert_eq!(trip.stops[0].coords, Some(GeoPoint::new(40.8027, 29.4307)));
        assert_eq!(trip.stops[0].status(), StopStatus::InTransit);
        assert_eq!(trip.stops[1].ordinal, 1);
        assert_eq!(trip.stops[1].coords, None);
        assert_eq!(trip.stops[1].status(), StopStatus::Pending);
    }

    #[test]
    fn test_cargo_route_without_stop_index() {
        let body: CargoRouteResponse = serde_json::from_value(serde_json::json!({
            "route": [[40.7150, 29.9300], [40.8225, 29.9250]],
            "cargo": {
                "id": 9,
                "status": "in_transit",
                "weight": 4.5,
                "quantity": 1,
                "targetDate": null,
                "createdAt": "2025-01-14T09:30:00+00:00",
                "station": { "id": 2, "name": "Başiskele", "lat": 40.7150, "lng": 29.9300 }
            },
            "trip": {
                "trip_id": 4,
                "vehicle": { "id": 1, "plate": "41 KOU 01", "capacity": 500, "is_rental": false },
                "total_distance": 12.0,
                "stops": [{ "station_name": "Başiskele", "coords": [40.7150, 29.9300], "is_my_cargo": false }],
                "my_stop_index": -1
            }
        }))
        .unwrap();

        let route = CargoRoute::from(body);

        assert_eq!(route.my_stop_index, None);
        assert_eq!(route.cargo.target_date, None);

        let trip = route.trip.unwrap();
        assert_eq!(trip.vehicle.capacity_kg, 500.0);
        assert_eq!(trip.status, TripStatus::InTransit);
        assert!(trip.stops[0].cargo_ids.is_empty());
    }
}

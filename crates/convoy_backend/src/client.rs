use convoy_engine::{
    coordinator::system_of_record::{SimulationAck, SystemOfRecord},
    model::{cargo::CargoRoute, trip::Trip, trip_id::TripId},
};
use jiff::civil::Date;
use reqwest::{RequestBuilder, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::wire::{
    CargoRouteResponse, MessageBody, SimulationRequest, SimulationResponse, TripsResponse,
};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_OPERATOR_API_URL: &str = "http://localhost:8000/yonetici";

pub struct BackendClientParams {
    /// Customer API, serves cargo routes.
    pub api_url: String,
    /// Operator API, serves trips and the simulation endpoints.
    pub operator_api_url: String,
    /// Sent as `Authorization: Session <token>`.
    pub session_token: Option<String>,
}

impl Default for BackendClientParams {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            operator_api_url: DEFAULT_OPERATOR_API_URL.to_string(),
            session_token: None,
        }
    }
}

pub struct BackendClient {
    params: BackendClientParams,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(params: BackendClientParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }

    pub fn params(&self) -> &BackendClientParams {
        &self.params
    }

    fn operator_url(&self, path: &str) -> String {
        format!("{}/{}", self.params.operator_api_url.trim_end_matches('/'), path)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.params.api_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.params.session_token {
            Some(token) => request.header(AUTHORIZATION, format!("Session {}", token)),
            None => request,
        }
    }

    async fn send<T>(&self, request: RequestBuilder) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
    {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            // error bodies are `{"message": ...}`, fall back to the raw text
            let message = serde_json::from_slice::<MessageBody>(&bytes)
                .map(|body| body.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());

            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn fetch_trips(&self, date: Date) -> Result<Vec<Trip>, BackendError> {
        debug!("Backend: fetching trips of {}", date);

        let request = self
            .client
            .get(self.operator_url("trips/details/"))
            .query(&[("date", date.to_string())]);
        let response: TripsResponse = self.send(request).await?;

        Ok(response.trips.into_iter().map(Trip::from).collect())
    }

    pub async fn fetch_cargo_route(&self, cargo_id: u64) -> Result<CargoRoute, BackendError> {
        debug!("Backend: fetching route of cargo {}", cargo_id);

        let request = self
            .client
            .get(self.api_url(&format!("cargo/{}/route/", cargo_id)));
        let response: CargoRouteResponse = self.send(request).await?;

        Ok(response.into())
    }

    async fn post_simulation(
        &self,
        path: &str,
        trip_ids: &[TripId],
    ) -> Result<SimulationAck, BackendError> {
        debug!("Backend: posting {} for {} trips", path, trip_ids.len());

        let request = self
            .client
            .post(self.operator_url(path))
            .json(&SimulationRequest { trip_ids });
        let response: SimulationResponse = self.send(request).await?;

        if response.success == Some(false) {
            return Err(BackendError::Rejected(response.message));
        }

        Ok(SimulationAck {
            message: response.message,
            updated_cargo_count: response.updated_cargo_count,
        })
    }

    pub async fn notify_start(&self, trip_ids: &[TripId]) -> Result<SimulationAck, BackendError> {
        self.post_simulation("simulation/start/", trip_ids).await
    }

    pub async fn notify_complete(
        &self,
        trip_ids: &[TripId],
    ) -> Result<SimulationAck, BackendError> {
        self.post_simulation("simulation/complete/", trip_ids).await
    }
}

impl SystemOfRecord for BackendClient {
    async fn trips_for_date(&self, date: Date) -> anyhow::Result<Vec<Trip>> {
        Ok(self.fetch_trips(date).await?)
    }

    async fn cargo_route(&self, cargo_id: u64) -> anyhow::Result<CargoRoute> {
        Ok(self.fetch_cargo_route(cargo_id).await?)
    }

    async fn start_simulation(&self, trip_ids: &[TripId]) -> anyhow::Result<SimulationAck> {
        Ok(self.notify_start(trip_ids).await?)
    }

    async fn complete_simulation(&self, trip_ids: &[TripId]) -> anyhow::Result<SimulationAck> {
        Ok(self.notify_complete(trip_ids).await?)
    }
}

#[cfg(test)]
mod tests {
    use convoy_engine::{geopoint::GeoPoint, model::stop::StopStatus};
    use jiff::civil::date;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    use super::*;

    fn client(server: &MockServer) -> BackendClient {
        BackendClient::new(BackendClientParams {
            api_url: format!("{}/api", server.uri()),
            operator_api_url: format!("{}/yonetici/", server.uri()),
            session_token: Some(String::from("s3ss10n")),
        })
    }

    #[tokio::test]
    async fn test_fetch_trips() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/yonetici/trips/details/"))
            .and(query_param("date", "2025-01-15"))
            .and(header("Authorization", "Session s3ss10n"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "date": "2025-01-15",
                "trips": [{
                    "trip_id": 1,
                    "vehicle": { "id": 1, "plate": "41 ABC 01", "capacity_kg": 500, "is_rental": false },
                    "start_station": "Gebze",
                    "distance": 51.2,
                    "total_cost": 51.2,
                    "total_weight": 35,
                    "cargo_count": 2,
                    "stops": [
                        { "station_name": "Gebze", "total_weight": 20, "coords": [40.8027, 29.4307], "cargo_count": 1, "senders": ["Ayşe Yılmaz"], "status": "pending" },
                        { "station_name": "Körfez", "total_weight": 15, "coords": [40.7760, 29.7360], "cargo_count": 1, "senders": ["Can Demir"], "status": "pending" }
                    ],
                    "status": "pending"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let trips = client(&server).fetch_trips(date(2025, 1, 15)).await.unwrap();

        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].start_station.as_deref(), Some("Gebze"));
        assert_eq!(trips[0].total_weight(), 35.0);
        assert_eq!(trips[0].stops[1].coords, Some(GeoPoint::new(40.7760, 29.7360)));
        assert_eq!(trips[0].stops[1].senders, vec![String::from("Can Demir")]);
    }

    #[tokio::test]
    async fn test_fetch_cargo_route_without_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cargo/9/route/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "route": [[40.7150, 29.9300], [40.8225, 29.9250]],
                "cargo": {
                    "id": 9,
                    "status": "pending",
                    "weight": 4.5,
                    "quantity": 2,
                    "targetDate": "2025-01-16",
                    "createdAt": "2025-01-14T09:30:00+00:00",
                    "station": { "id": 2, "name": "Başiskele", "lat": 40.7150, "lng": 29.9300 }
                },
                "trip": null
            })))
            .mount(&server)
            .await;

        let route = client(&server).fetch_cargo_route(9).await.unwrap();

        assert!(route.trip.is_none());
        assert_eq!(route.cargo.status, StopStatus::Pending);
        assert_eq!(route.cargo.target_date, Some(date(2025, 1, 16)));
        assert_eq!(route.route[0], GeoPoint::new(40.7150, 29.9300));
    }

    #[tokio::test]
    async fn test_notify_start() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/yonetici/simulation/start/"))
            .and(body_json(json!({ "trip_ids": [1, 2] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Simülasyon başlatıldı! 5 kargo yola çıktı.",
                "updated_cargo_count": 5
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ack = client(&server)
            .notify_start(&[TripId::from(1u64), TripId::from(2u64)])
            .await
            .unwrap();

        assert_eq!(ack.updated_cargo_count, 5);
        assert_eq!(ack.message, "Simülasyon başlatıldı! 5 kargo yola çıktı.");
    }

    #[tokio::test]
    async fn test_forbidden_reports_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/yonetici/simulation/complete/"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({ "message": "Yetki gerekiyor." })),
            )
            .mount(&server)
            .await;

        let result = client(&server).notify_complete(&[TripId::from(1u64)]).await;

        assert!(matches!(
            result,
            Err(BackendError::Api { status: 403, message }) if message == "Yetki gerekiyor."
        ));
    }

    #[tokio::test]
    async fn test_unsuccessful_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/yonetici/simulation/start/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Sefer bulunamadı."
            })))
            .mount(&server)
            .await;

        let error = client(&server)
            .start_simulation(&[TripId::from(8u64)])
            .await
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<BackendError>(),
            Some(BackendError::Rejected(message)) if message == "Sefer bulunamadı."
        ));
    }
}

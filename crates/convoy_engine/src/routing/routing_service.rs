use std::future::Future;

use convoy_osrm::client::{OsrmError, OsrmRouteClient};
use thiserror::Error;

use crate::geopoint::GeoPoint;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error(transparent)]
    Osrm(#[from] OsrmError),

    #[error("routing service unavailable: {0}")]
    Unavailable(String),
}

/// An external road routing service.
pub trait RoutingService: Send + Sync {
    /// Returns a dense path in `(lat, lng)` order following the roads
    /// between `waypoints`, visited in the given order.
    fn route(
        &self,
        waypoints: &[GeoPoint],
    ) -> impl Future<Output = Result<Vec<GeoPoint>, RoutingError>> + Send;
}

impl RoutingService for OsrmRouteClient {
    async fn route(&self, waypoints: &[GeoPoint]) -> Result<Vec<GeoPoint>, RoutingError> {
        let route = self.fetch_route(waypoints).await?;

        // OSRM answers in (lng, lat)
        Ok(route.points.into_iter().map(GeoPoint::from).collect())
    }
}

/// Joins the waypoints with straight segments, for offline use.
pub struct StraightLineService;

impl RoutingService for StraightLineService {
    async fn route(&self, waypoints: &[GeoPoint]) -> Result<Vec<GeoPoint>, RoutingError> {
        Ok(waypoints.to_vec())
    }
}

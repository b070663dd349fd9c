use convoy_engine::{
    geopoint::GeoPoint,
    routing::routing_service::{RoutingError, RoutingService, StraightLineService},
};
use convoy_osrm::client::{OsrmRouteClient, OsrmRouteClientParams};

/// The routing service picked on the command line.
pub enum Router {
    Osrm(OsrmRouteClient),
    StraightLine(StraightLineService),
}

impl Router {
    pub fn new(params: OsrmRouteClientParams, offline: bool) -> Self {
        if offline {
            Router::StraightLine(StraightLineService)
        } else {
            Router::Osrm(OsrmRouteClient::new(params))
        }
    }
}

impl RoutingService for Router {
    async fn route(&self, waypoints: &[GeoPoint]) -> Result<Vec<GeoPoint>, RoutingError> {
        match self {
            Router::Osrm(client) => client.route(waypoints).await,
            Router::StraightLine(service) => service.route(waypoints).await,
        }
    }
}

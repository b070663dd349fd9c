use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::{geopoint::GeoPoint, model::trip_id::TripId};

use super::{
    route_polyline::{PolylineSource, RoutePolyline, RoutePolylines},
    routing_service::RoutingService,
};

/// Turns waypoints into road following polylines.
///
/// Resolution never fails: whenever the routing service cannot produce a
/// usable path the waypoints are returned unchanged and the simulation
/// runs along straight segments instead.
pub struct RouteResolver<S> {
    service: S,
}

impl<S> RouteResolver<S>
where
    S: RoutingService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn resolve(&self, waypoints: &[GeoPoint]) -> RoutePolyline {
        if waypoints.len() < 2 {
            return RoutePolyline::straight(waypoints.to_vec());
        }

        match self.service.route(waypoints).await {
            Ok(path) if path.len() >= 2 => {
                debug!(
                    "Resolved {} waypoints into {} points",
                    waypoints.len(),
                    path.len()
                );
                RoutePolyline::new(pin_endpoints(path, waypoints), PolylineSource::Road)
            }
            Ok(path) => {
                warn!(
                    "Routing service returned {} points, using straight segments",
                    path.len()
                );
                RoutePolyline::straight(waypoints.to_vec())
            }
            Err(err) => {
                warn!("Routing service failed, using straight segments: {}", err);
                RoutePolyline::straight(waypoints.to_vec())
            }
        }
    }

    /// Resolves every trip concurrently, one service call per trip.
    pub async fn resolve_all<I>(&self, trips: I) -> RoutePolylines
    where
        I: IntoIterator<Item = (TripId, Vec<GeoPoint>)>,
    {
        let resolutions = trips.into_iter().map(|(trip_id, waypoints)| async move {
            let polyline = self.resolve(&waypoints).await;
            (trip_id, Arc::new(polyline))
        });

        join_all(resolutions).await.into_iter().collect()
    }
}

/// Snapped road geometry may start or end a few meters away from the
/// requested waypoints, the path must still begin and end on them.
fn pin_endpoints(mut path: Vec<GeoPoint>, waypoints: &[GeoPoint]) -> Vec<GeoPoint> {
    if let Some(&first) = waypoints.first() {
        if path.first() != Some(&first) {
            path.insert(0, first);
        }
    }

    if let Some(&last) = waypoints.last() {
        if path.last() != Some(&last) {
            path.push(last);
        }
    }

    path
}

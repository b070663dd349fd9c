use std::sync::Arc;

use fxhash::FxHashMap;

use crate::{geopoint::GeoPoint, model::trip_id::TripId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PolylineSource {
    /// Dense geometry from the routing service.
    Road,
    /// The waypoints themselves, joined by straight segments.
    StraightLine,
}

/// Ordered points approximating the travel path of one trip.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutePolyline {
    points: Vec<GeoPoint>,
    source: PolylineSource,
}

pub type RoutePolylines = FxHashMap<TripId, Arc<RoutePolyline>>;

impl RoutePolyline {
    pub fn new(points: Vec<GeoPoint>, source: PolylineSource) -> Self {
        Self { points, source }
    }

    pub fn straight(points: Vec<GeoPoint>) -> Self {
        Self::new(points, PolylineSource::StraightLine)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn source(&self) -> PolylineSource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A simulation needs somewhere to go.
    pub fn is_simulatable(&self) -> bool {
        self.points.len() >= 2
    }

    pub fn first(&self) -> Option<GeoPoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }

    pub fn length_meters(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].haversine_distance(&pair[1]))
            .sum()
    }
}

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OsrmError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("No route found: {0}")]
    NoRoute(String),

    #[error("Route geometry has fewer than two points")]
    InvalidGeometry,
}

#[derive(Deserialize)]
struct RouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteSolution>,
}

#[derive(Deserialize)]
struct RouteSolution {
    geometry: RouteGeometry,

    /// Distance in meters
    distance: f64,

    /// Duration in seconds
    duration: f64,
}

#[derive(Deserialize)]
struct RouteGeometry {
    /// GeoJSON order, `[lng, lat]`
    coordinates: Vec<[f64; 2]>,
}

/// A road following path returned by OSRM.
#[derive(Debug, Clone)]
pub struct OsrmRoute {
    /// Points in travel order, `x` is the longitude and `y` the latitude.
    pub points: Vec<geo_types::Point>,

    /// Distance in meters
    pub distance: f64,

    /// Travel time in seconds
    pub duration: f64,
}

pub struct OsrmRouteClientParams {
    pub osrm_url: String,
    pub profile: String,
}

pub const OSRM_PUBLIC_URL: &str = "https://router.project-osrm.org";
pub const OSRM_ROUTE_API_PATH: &str = "/route/v1/";

impl Default for OsrmRouteClientParams {
    fn default() -> Self {
        Self {
            osrm_url: OSRM_PUBLIC_URL.to_string(),
            profile: String::from("driving"),
        }
    }
}

pub struct OsrmRouteClient {
    params: OsrmRouteClientParams,
    client: reqwest::Client,
}

impl OsrmRouteClient {
    pub fn new(params: OsrmRouteClientParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }

    pub fn params(&self) -> &OsrmRouteClientParams {
        &self.params
    }

    fn route_url<P>(&self, points: &[P]) -> String
    where
        P: Copy + Into<geo_types::Point>,
    {
        let mut url = self.params.osrm_url.trim_end_matches('/').to_string();
        url.push_str(OSRM_ROUTE_API_PATH);
        url.push_str(&self.params.profile);
        url.push('/');

        for (i, point) in points.iter().enumerate() {
            let point: geo_types::Point = (*point).into();
            url.push_str(&format!("{},{}", point.x(), point.y()));

            if i < points.len() - 1 {
                url.push(';');
            }
        }

        url
    }

    /// Requests the full road geometry passing through `points` in order.
    pub async fn fetch_route<P>(&self, points: &[P]) -> Result<OsrmRoute, OsrmError>
    where
        P: Copy + Into<geo_types::Point>,
    {
        let url = self.route_url(points);

        debug!("OSRM: requesting route through {} points", points.len());

        let response = self
            .client
            .get(url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        // OSRM reports routing failures as JSON bodies with a 400 status
        let body: RouteResponse = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(err) => {
                let message = if status.is_success() {
                    err.to_string()
                } else {
                    String::from_utf8_lossy(&bytes).into_owned()
                };
                return Err(OsrmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
        };

        if body.code != "Ok" {
            return Err(OsrmError::NoRoute(body.message.unwrap_or(body.code)));
        }

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| OsrmError::NoRoute(String::from("empty routes")))?;

        if route.geometry.coordinates.len() < 2 {
            return Err(OsrmError::InvalidGeometry);
        }

        let points = route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| geo_types::Point::new(lng, lat))
            .collect();

        Ok(OsrmRoute {
            points,
            distance: route.distance,
            duration: route.duration,
        })
    }
}

use convoy_backend::client::{BackendClientParams, DEFAULT_API_URL, DEFAULT_OPERATOR_API_URL};
use convoy_osrm::client::{OSRM_PUBLIC_URL, OsrmRouteClientParams};

pub const OSRM_URL_VAR: &str = "CONVOY_OSRM_URL";
pub const OSRM_PROFILE_VAR: &str = "CONVOY_OSRM_PROFILE";
pub const API_URL_VAR: &str = "CONVOY_API_URL";
pub const OPERATOR_API_URL_VAR: &str = "CONVOY_OPERATOR_API_URL";
pub const SESSION_TOKEN_VAR: &str = "CONVOY_SESSION_TOKEN";

/// Endpoints read from the environment, `.env.local` included.
pub struct Config {
    pub osrm: OsrmRouteClientParams,
    pub backend: BackendClientParams,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            osrm: OsrmRouteClientParams {
                osrm_url: var(OSRM_URL_VAR).unwrap_or_else(|| OSRM_PUBLIC_URL.to_string()),
                profile: var(OSRM_PROFILE_VAR).unwrap_or_else(|| String::from("driving")),
            },
            backend: BackendClientParams {
                api_url: var(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                operator_api_url: var(OPERATOR_API_URL_VAR)
                    .unwrap_or_else(|| DEFAULT_OPERATOR_API_URL.to_string()),
                session_token: var(SESSION_TOKEN_VAR),
            },
        }
    }
}

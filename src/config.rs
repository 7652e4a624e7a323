//! Server configuration from environment.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub incidents_path: PathBuf,
    pub mapbox_access_token: String,
    pub mapbox_base_url: String,
    pub mapbox_profile: String,
    pub provider_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SAFENAV_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            incidents_path: env::var("SAFENAV_INCIDENTS_PATH")
                .unwrap_or_else(|_| "assets/crimes.json".to_string())
                .into(),
            mapbox_access_token: env::var("MAPBOX_ACCESS_TOKEN").unwrap_or_default(),
            mapbox_base_url: env::var("MAPBOX_BASE_URL")
                .unwrap_or_else(|_| "https://api.mapbox.com".to_string()),
            mapbox_profile: env::var("MAPBOX_PROFILE")
                .unwrap_or_else(|_| "mapbox/walking".to_string()),
            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(10),
        }
    }
}

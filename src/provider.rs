//! External routing provider.

use std::time::Duration;

use async_trait::async_trait;
use geo::Point;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::ProviderError;
use crate::route::CandidateRoute;

/// Source of candidate walking routes between two points.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn fetch_routes(
        &self,
        start: Point<f64>,
        end: Point<f64>,
    ) -> Result<Vec<CandidateRoute>, ProviderError>;
}

/// Mapbox Directions API client.
pub struct MapboxProvider {
    client: Client,
    base_url: String,
    profile: String,
    access_token: String,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Option<Vec<DirectionsRoute>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    geometry: String,
    duration: f64,
    distance: f64,
}

impl MapboxProvider {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.mapbox_base_url.trim_end_matches('/').to_string(),
            profile: config.mapbox_profile.clone(),
            access_token: config.mapbox_access_token.clone(),
            timeout_secs: config.provider_timeout_secs,
        })
    }

    /// Mapbox takes `lng,lat` pairs.
    fn directions_url(&self, start: Point<f64>, end: Point<f64>) -> String {
        format!(
            "{}/directions/v5/{}/{},{};{},{}",
            self.base_url,
            self.profile,
            start.x(),
            start.y(),
            end.x(),
            end.y()
        )
    }

    // Drop the URL so the access token never ends up in logs or payloads.
    fn classify(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else if error.is_connect() {
            ProviderError::Unavailable(error.without_url().to_string())
        } else {
            ProviderError::Transport(error.without_url().to_string())
        }
    }
}

#[async_trait]
impl RoutingProvider for MapboxProvider {
    async fn fetch_routes(
        &self,
        start: Point<f64>,
        end: Point<f64>,
    ) -> Result<Vec<CandidateRoute>, ProviderError> {
        let url = self.directions_url(start, end);
        tracing::debug!(%url, "requesting walking directions");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("alternatives", "true"),
                ("geometries", "polyline"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        parse_directions(status, &body)
    }
}

fn parse_directions(status: u16, body: &str) -> Result<Vec<CandidateRoute>, ProviderError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<DirectionsResponse>(body)
            .ok()
            .and_then(|response| response.message)
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(ProviderError::Status { status, message });
    }

    let response: DirectionsResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let routes = response.routes.unwrap_or_default();
    if routes.is_empty() {
        tracing::debug!(code = ?response.code, message = ?response.message, "directions response has no routes");
    }

    Ok(routes
        .into_iter()
        .map(|route| CandidateRoute {
            geometry: route.geometry,
            duration: route.duration,
            distance: route.distance,
        })
        .collect())
}

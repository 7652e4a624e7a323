//! HTTP surface: zone listing and safe-route queries.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use geo::Point;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::Instrument;

use crate::incident::{IncidentStore, current_hour};
use crate::provider::RoutingProvider;
use crate::route::{SafeRouteOutcome, find_safest_route};


// Shared across every request, never mutated after startup
pub struct AppState {
    pub store: Arc<IncidentStore>,
    pub provider: Arc<dyn RoutingProvider>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_origin(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(|| async { "OK" }))
        .route("/zones", get(get_danger_zones))
        .route("/get-safe-route", post(calculate_safe_route))
        .layer(cors)
        .with_state(state)
}

// --- API DTOs ---

#[derive(Debug, Deserialize)]
struct ZonesQuery {
    simulated_hour: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RouteRequest {
    start_lat: f64,
    start_lng: f64,
    end_lat: f64,
    end_lng: f64,
    user_id: Option<String>,
    simulated_hour: Option<i32>,
}

// --- Handlers ---

async fn health_check() -> Json<Value> {
    Json(json!({"status": "online", "system": "SafeNav Routing"}))
}

async fn get_danger_zones(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ZonesQuery>,
) -> Response {
    let hour = query.simulated_hour.unwrap_or_else(current_hour);
    let listing = state.store.zone_listing(hour);
    tracing::debug!(hour, count = listing.count, "listing active zones");
    Json(listing).into_response()
}

async fn calculate_safe_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> (StatusCode, Json<SafeRouteOutcome>) {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_request(rejection.body_text()),
    };

    let (start, end) = match (
        validate_coordinate("start", request.start_lat, request.start_lng),
        validate_coordinate("end", request.end_lat, request.end_lng),
    ) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(message), _) | (_, Err(message)) => return invalid_request(message),
    };

    let hour = request.simulated_hour.unwrap_or_else(current_hour);
    let user_id = request.user_id.as_deref().unwrap_or("guest");
    let span = tracing::info_span!("safe_route", user_id, hour);

    async move {
        tracing::info!(
            "calculating safe route {},{} -> {},{}",
            start.y(),
            start.x(),
            end.y(),
            end.x()
        );
        let outcome = find_safest_route(state.provider.as_ref(), &state.store, start, end, hour).await;
        (status_for(&outcome), Json(outcome))
    }
    .instrument(span)
    .await
}

fn invalid_request(message: String) -> (StatusCode, Json<SafeRouteOutcome>) {
    tracing::debug!(%message, "rejecting safe-route request");
    (
        StatusCode::BAD_REQUEST,
        Json(SafeRouteOutcome::Error {
            kind: "invalid_request",
            message,
        }),
    )
}

fn validate_coordinate(label: &str, lat: f64, lng: f64) -> Result<Point<f64>, String> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("{label} latitude {lat} is outside -90..=90"));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("{label} longitude {lng} is outside -180..=180"));
    }
    Ok(Point::new(lng, lat))
}

fn status_for(outcome: &SafeRouteOutcome) -> StatusCode {
    match outcome {
        SafeRouteOutcome::Success { .. } | SafeRouteOutcome::NoRoutes { .. } => StatusCode::OK,
        SafeRouteOutcome::Error {
            kind: "provider_timeout",
            ..
        } => StatusCode::GATEWAY_TIMEOUT,
        SafeRouteOutcome::Error {
            kind: "invalid_request",
            ..
        } => StatusCode::BAD_REQUEST,
        SafeRouteOutcome::Error { .. } => StatusCode::BAD_GATEWAY,
    }
}

//! Candidate scoring and safest-route selection.

use geo::Point;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::incident::{Incident, IncidentId, IncidentStore};
use crate::provider::RoutingProvider;
use crate::safety::analyze_route;

// Mapbox `geometries=polyline`
pub const POLYLINE_PRECISION: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRoute {
    pub geometry: String,
    pub duration: f64, // seconds
    pub distance: f64, // meters
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRoute {
    pub route_geometry: String,
    pub duration: f64,
    pub distance: f64,
    pub safety_score: u32,
    pub risk_count: usize,
    pub detected_ids: Vec<IncidentId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteSelection {
    Recommended {
        recommended: ScoredRoute,
        alternatives: Vec<ScoredRoute>,
    },
    NoRoutes,
}

/// Result of a safe-route query. Always well-formed, even on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SafeRouteOutcome {
    Success {
        recommended_route: ScoredRoute,
        alternatives: Vec<ScoredRoute>,
        effective_hour: i32,
    },
    NoRoutes {
        message: String,
    },
    Error {
        kind: &'static str,
        message: String,
    },
}

pub fn decode_geometry(encoded: &str) -> Result<Vec<Point<f64>>, RouteError> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|e| RouteError::Geometry(e.to_string()))?;
    Ok(line.points().collect())
}

pub fn score_candidate(
    candidate: CandidateRoute,
    incidents: &[&Incident],
) -> Result<ScoredRoute, RouteError> {
    let geometry = decode_geometry(&candidate.geometry)?;
    let analysis = analyze_route(&geometry, incidents);

    Ok(ScoredRoute {
        risk_count: analysis.risk_count(),
        safety_score: analysis.safety_score,
        detected_ids: analysis.detected_ids,
        route_geometry: candidate.geometry,
        duration: candidate.duration,
        distance: candidate.distance,
    })
}

// Safest first, then fastest.
pub fn rank_routes(routes: Vec<ScoredRoute>) -> Vec<ScoredRoute> {
    routes
        .into_iter()
        .sorted_by(|a, b| {
            b.safety_score
                .cmp(&a.safety_score)
                .then_with(|| a.duration.total_cmp(&b.duration))
        })
        .collect()
}

pub fn select_route(candidates: Vec<CandidateRoute>, incidents: &[&Incident]) -> RouteSelection {
    let scored = candidates
        .into_iter()
        .enumerate()
        .filter_map(|(index, candidate)| match score_candidate(candidate, incidents) {
            Ok(route) => Some(route),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping unusable candidate route");
                None
            }
        })
        .collect();

    let mut ranked = rank_routes(scored).into_iter();
    match ranked.next() {
        Some(recommended) => RouteSelection::Recommended {
            recommended,
            alternatives: ranked.collect(),
        },
        None => RouteSelection::NoRoutes,
    }
}

/// One provider call, no retries. Candidates are scored only against the
/// incidents active at `hour`.
pub async fn find_safest_route(
    provider: &dyn RoutingProvider,
    store: &IncidentStore,
    start: Point<f64>,
    end: Point<f64>,
    hour: i32,
) -> SafeRouteOutcome {
    let candidates = match provider.fetch_routes(start, end).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind(), "routing provider call failed");
            return SafeRouteOutcome::Error {
                kind: e.kind(),
                message: e.to_string(),
            };
        }
    };

    let active = store.active_at(hour);
    tracing::debug!(
        candidates = candidates.len(),
        active_incidents = active.len(),
        hour,
        "scoring candidate routes"
    );

    match select_route(candidates, &active) {
        RouteSelection::Recommended {
            recommended,
            alternatives,
        } => {
            tracing::info!(
                safety_score = recommended.safety_score,
                risk_count = recommended.risk_count,
                alternatives = alternatives.len(),
                "recommended route selected"
            );
            SafeRouteOutcome::Success {
                recommended_route: recommended,
                alternatives,
                effective_hour: hour,
            }
        }
        RouteSelection::NoRoutes => {
            tracing::info!("routing provider returned no usable routes");
            SafeRouteOutcome::NoRoutes {
                message: "No routes found".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn scored(safety_score: u32, duration: f64) -> ScoredRoute {
        ScoredRoute {
            route_geometry: format!("{safety_score}/{duration}"),
            duration,
            distance: duration * 1.4,
            safety_score,
            risk_count: 0,
            detected_ids: Vec::new(),
        }
    }

    fn encode(points: &[(f64, f64)]) -> String {
        let coords = points.iter().map(|&(lat, lng)| Coord { x: lng, y: lat });
        polyline::encode_coordinates(coords, POLYLINE_PRECISION).unwrap()
    }

    #[test]
    fn decodes_reference_polyline() {
        // Reference string from the encoded polyline algorithm description.
        let points = decode_geometry("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(points.len(), 3);
        assert!((points[0].y() - 38.5).abs() < 1e-9);
        assert!((points[0].x() - -120.2).abs() < 1e-9);
        assert!((points[2].y() - 43.252).abs() < 1e-9);
        assert!((points[2].x() - -126.453).abs() < 1e-9);
    }

    #[test]
    fn safer_route_is_recommended() {
        let ranked = rank_routes(vec![scored(80, 300.0), scored(95, 900.0)]);
        assert_eq!(ranked[0].safety_score, 95);
        assert_eq!(ranked[1].safety_score, 80);
    }

    #[test]
    fn ties_go_to_faster_route() {
        let ranked = rank_routes(vec![scored(70, 600.0), scored(70, 450.0)]);
        assert_eq!(ranked[0].duration, 450.0);
        assert_eq!(ranked[1].duration, 600.0);
    }

    #[test]
    fn select_scores_and_ranks_candidates() {
        let store = IncidentStore::from_json_str(
            r#"[{"id": "fort", "lat": 12.9204, "lng": 79.1325, "severity": "HIGH"}]"#,
        )
        .unwrap();
        let incidents: Vec<&Incident> = store.incidents().iter().collect();

        let through_fort = CandidateRoute {
            geometry: encode(&[(12.9204, 79.1325), (12.93, 79.14)]),
            duration: 400.0,
            distance: 1_500.0,
        };
        let around = CandidateRoute {
            geometry: encode(&[(12.95, 79.16), (12.96, 79.17)]),
            duration: 700.0,
            distance: 2_300.0,
        };

        match select_route(vec![through_fort.clone(), around.clone()], &incidents) {
            RouteSelection::Recommended {
                recommended,
                alternatives,
            } => {
                assert_eq!(recommended.route_geometry, around.geometry);
                assert_eq!(recommended.safety_score, 100);
                assert_eq!(alternatives.len(), 1);
                assert_eq!(alternatives[0].safety_score, 50);
                assert_eq!(alternatives[0].detected_ids, vec![IncidentId::new("fort")]);
            }
            RouteSelection::NoRoutes => panic!("expected a recommendation"),
        }
    }

    #[test]
    fn empty_or_unusable_candidates_mean_no_routes() {
        assert_eq!(select_route(Vec::new(), &[]), RouteSelection::NoRoutes);

        let broken = CandidateRoute {
            geometry: "!!".to_string(),
            duration: 10.0,
            distance: 10.0,
        };
        assert_eq!(select_route(vec![broken], &[]), RouteSelection::NoRoutes);
    }

    #[test]
    fn outcome_is_tagged_by_status() {
        let body = serde_json::to_value(SafeRouteOutcome::NoRoutes {
            message: "No routes found".to_string(),
        })
        .unwrap();
        assert_eq!(body["status"], "no_routes");

        let body = serde_json::to_value(SafeRouteOutcome::Error {
            kind: "provider_timeout",
            message: "routing provider timed out after 10s".to_string(),
        })
        .unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "provider_timeout");
    }
}

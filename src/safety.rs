use std::collections::HashSet;

use geo::Point;

use crate::distance::haversine_distance;
use crate::incident::{Incident, IncidentId, Severity};

/// Only every Nth route point is checked; dense polylines repeat themselves.
pub const SAMPLE_STRIDE: usize = 10;
pub const PROXIMITY_THRESHOLD_M: f64 = 300.0;
pub const HIGH_SEVERITY_PENALTY: u32 = 50;
pub const DEFAULT_PENALTY: u32 = 20;
pub const MAX_SCORE: u32 = 100;
pub const MIN_SCORE: u32 = 10;

// 100 = no detected risk, 10 = floor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAnalysis {
    pub safety_score: u32,
    /// Each incident at most once, in the order it was first hit.
    pub detected_ids: Vec<IncidentId>,
}

impl RiskAnalysis {
    pub fn risk_count(&self) -> usize {
        self.detected_ids.len()
    }
}

fn penalty_for(severity: Severity) -> u32 {
    match severity {
        Severity::High => HIGH_SEVERITY_PENALTY,
        Severity::Other => DEFAULT_PENALTY,
    }
}

// No time-of-day filtering here; callers pass the set they consider dangerous.
pub fn analyze_route(geometry: &[Point<f64>], incidents: &[&Incident]) -> RiskAnalysis {
    let mut seen: HashSet<&IncidentId> = HashSet::new();
    let mut detected_ids = Vec::new();
    let mut total_penalty: u32 = 0;

    for &point in geometry.iter().step_by(SAMPLE_STRIDE) {
        for incident in incidents {
            let Some(position) = incident.position() else {
                continue;
            };

            if haversine_distance(point, position) < PROXIMITY_THRESHOLD_M
                && seen.insert(incident.id())
            {
                total_penalty = total_penalty.saturating_add(penalty_for(incident.severity()));
                detected_ids.push(incident.id().clone());
            }
        }
    }

    RiskAnalysis {
        safety_score: MAX_SCORE.saturating_sub(total_penalty).max(MIN_SCORE),
        detected_ids,
    }
}

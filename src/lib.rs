//! Safety-aware pedestrian routing: ranks provider routes by exposure to known incidents.

pub mod api;
pub mod config;
pub mod distance;
pub mod error;
pub mod incident;
pub mod provider;
pub mod route;
pub mod safety;

pub use distance::haversine_distance;
pub use incident::{ActiveHours, Incident, IncidentId, IncidentStore, Severity};
pub use route::{CandidateRoute, SafeRouteOutcome, ScoredRoute, find_safest_route};
pub use safety::{RiskAnalysis, analyze_route};

//! Incident records, the read-only incident store, and time-of-day activation.

use std::fmt;
use std::path::Path;

use chrono::Timelike;
use geo::Point;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::StoreError;

// Numeric and text ids never compare equal, and positional ids never collide
// with source ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IncidentId {
    Number(Number),
    Text(String),
    Positional(usize),
}

impl IncidentId {
    pub fn new(id: impl Into<String>) -> Self {
        IncidentId::Text(id.into())
    }
}

impl From<u64> for IncidentId {
    fn from(id: u64) -> Self {
        IncidentId::Number(Number::from(id))
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentId::Number(id) => write!(f, "{id}"),
            IncidentId::Text(id) => f.write_str(id),
            IncidentId::Positional(index) => write!(f, "#{index}"),
        }
    }
}

impl Serialize for IncidentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IncidentId::Number(id) => id.serialize(serializer),
            IncidentId::Text(id) => serializer.serialize_str(id),
            IncidentId::Positional(_) => serializer.collect_str(self),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Other,
}

/// Outcome of parsing an `"HH-HH"` active-hours field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveHours {
    /// Half-open `[start, end)`; wraps past midnight when `start >= end`.
    Window { start: i32, end: i32 },
    /// Present but not two integers. Treated as always active.
    Unparseable(String),
}

impl ActiveHours {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split('-');
        let window = match (parts.next(), parts.next(), parts.next()) {
            (Some(start), Some(end), None) => parse_hour(start).zip(parse_hour(end)),
            _ => None,
        };

        match window {
            Some((start, end)) => ActiveHours::Window { start, end },
            None => ActiveHours::Unparseable(raw.to_string()),
        }
    }

    // Neither the window nor `hour` is range-checked.
    pub fn is_active_at(&self, hour: i32) -> bool {
        match *self {
            ActiveHours::Window { start, end } if start < end => start <= hour && hour < end,
            ActiveHours::Window { start, end } => hour >= start || hour < end,
            ActiveHours::Unparseable(_) => true,
        }
    }
}

fn parse_hour(part: &str) -> Option<i32> {
    part.trim().parse::<i32>().ok()
}

/// A recorded point of elevated risk.
///
/// The source record is kept verbatim so zone listings can echo every field the
/// data source provides (location, description, radius, ...).
#[derive(Debug, Clone, Serialize)]
pub struct Incident {
    #[serde(skip)]
    id: IncidentId,
    #[serde(skip)]
    position: Option<Point<f64>>,
    #[serde(skip)]
    severity: Severity,
    #[serde(skip)]
    active_hours: Option<ActiveHours>,
    #[serde(flatten)]
    record: Map<String, Value>,
}

impl Incident {
    // Malformed fields never fail the record.
    pub fn from_record(index: usize, mut record: Map<String, Value>) -> Self {
        let id = match record.get("id") {
            Some(Value::String(id)) => IncidentId::Text(id.clone()),
            Some(Value::Number(id)) => IncidentId::Number(id.clone()),
            _ => {
                let id = IncidentId::Positional(index);
                tracing::warn!(index, %id, "incident has no usable id, assigning positional id");
                record.insert("id".to_string(), Value::String(id.to_string()));
                id
            }
        };

        let coordinate = |key: &str| {
            record
                .get(key)
                .and_then(Value::as_f64)
                .filter(|value| value.is_finite())
        };
        let position = match (coordinate("lat"), coordinate("lng")) {
            (Some(lat), Some(lng)) => Some(Point::new(lng, lat)),
            _ => None,
        };

        let severity = match record.get("severity").and_then(Value::as_str) {
            Some("HIGH") => Severity::High,
            _ => Severity::Other,
        };

        let active_hours = match record.get("active_hours") {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(ActiveHours::parse(raw)),
            Some(other) => Some(ActiveHours::Unparseable(other.to_string())),
        };

        Self {
            id,
            position,
            severity,
            active_hours,
            record,
        }
    }

    pub fn id(&self) -> &IncidentId {
        &self.id
    }

    // None when either coordinate is missing or not a finite number
    pub fn position(&self) -> Option<Point<f64>> {
        self.position
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn active_hours(&self) -> Option<&ActiveHours> {
        self.active_hours.as_ref()
    }

    /// Incidents without a window are always dangerous.
    pub fn is_active_at(&self, hour: i32) -> bool {
        self.active_hours
            .as_ref()
            .is_none_or(|window| window.is_active_at(hour))
    }
}

/// Immutable snapshot of every known incident, loaded once at startup.
#[derive(Debug, Default)]
pub struct IncidentStore {
    incidents: Vec<Incident>,
}

impl IncidentStore {
    pub fn from_incidents(incidents: Vec<Incident>) -> Self {
        Self { incidents }
    }

    /// Accepts `{"incidents": [...]}` or a bare array of records.
    pub fn from_json_str(data: &str) -> Result<Self, StoreError> {
        let document: Value = serde_json::from_str(data)?;
        let records = match document {
            Value::Array(records) => records,
            Value::Object(mut root) => match root.remove("incidents") {
                Some(Value::Array(records)) => records,
                Some(_) => return Err(StoreError::Shape("non-array `incidents`")),
                None => {
                    tracing::warn!("incident data has no `incidents` field");
                    Vec::new()
                }
            },
            Value::Null => return Err(StoreError::Shape("null")),
            Value::Bool(_) => return Err(StoreError::Shape("boolean")),
            Value::Number(_) => return Err(StoreError::Shape("number")),
            Value::String(_) => return Err(StoreError::Shape("string")),
        };

        let incidents = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match record {
                Value::Object(record) => Some(Incident::from_record(index, record)),
                _ => {
                    tracing::warn!(index, "skipping incident record that is not an object");
                    None
                }
            })
            .collect();

        Ok(Self { incidents })
    }

    // Any failure yields an empty store; routes are then scored as incident-free.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "incident data not found, starting with an empty store");
            return Self::default();
        }

        let loaded = std::fs::read_to_string(path)
            .map_err(StoreError::from)
            .and_then(|data| Self::from_json_str(&data));

        match loaded {
            Ok(store) => {
                let unpositioned = store.incidents.iter().filter(|i| i.position().is_none()).count();
                tracing::info!(
                    path = %path.display(),
                    incidents = store.len(),
                    unpositioned,
                    "loaded incident data"
                );
                store
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to load incident data, starting with an empty store");
                Self::default()
            }
        }
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// Positioned incidents that are dangerous at `hour`, in store order.
    pub fn active_at(&self, hour: i32) -> Vec<&Incident> {
        self.incidents
            .iter()
            .filter(|incident| incident.position().is_some() && incident.is_active_at(hour))
            .collect()
    }

    pub fn zone_listing(&self, hour: i32) -> ZoneListing<'_> {
        let zones = self.active_at(hour);
        ZoneListing {
            server_time: format!("{hour}:00"),
            effective_hour: hour,
            count: zones.len(),
            zones,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ZoneListing<'a> {
    pub server_time: String,
    pub effective_hour: i32,
    pub count: usize,
    pub zones: Vec<&'a Incident>,
}

pub fn current_hour() -> i32 {
    chrono::Local::now().hour() as i32
}

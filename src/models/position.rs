use serde::Serialize;
use serde_json::Value;
use crate::models::error::{Result, SyncError};

/// A point on the map, replaced wholesale on every update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Decodes a `{ "lat": .., "lng": .. }` snapshot delivered for `path`.
    ///
    /// Integer numbers are accepted. Anything else in either field, including
    /// a `null` snapshot, is reported as the first missing field.
    pub fn from_snapshot(path: &str, raw: &Value) -> Result<Self> {
        let lat = numeric_child(raw, "lat").ok_or_else(|| SyncError::missing_field(path, "lat"))?;
        let lng = numeric_child(raw, "lng").ok_or_else(|| SyncError::missing_field(path, "lng"))?;
        Ok(Self { lat, lng })
    }
}

fn numeric_child(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(Value::as_f64)
}

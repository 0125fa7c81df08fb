use serde_json::Value;
use crate::models::error::{Result, SyncError};

/// Whether Santa is currently ho-ho-hoing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HohohoFlag(pub bool);

impl HohohoFlag {
    pub fn from_snapshot(path: &str, raw: &Value) -> Result<Self> {
        raw.as_bool()
            .map(HohohoFlag)
            .ok_or_else(|| SyncError::missing_field(path, "value"))
    }

    pub fn is_set(self) -> bool {
        self.0
    }
}

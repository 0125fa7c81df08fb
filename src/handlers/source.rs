use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use crate::models::error::{Result, SyncError};

/// A single delivery on a subscribed path.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Snapshot(Value),
    /// The source gave up on the subscription. No further events follow.
    Cancelled(String),
}

pub type SnapshotStream = mpsc::UnboundedReceiver<SourceEvent>;

/// A key-value store that pushes change notifications.
///
/// Dropping the returned stream releases the subscription.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    async fn subscribe(&self, path: &str) -> Result<SnapshotStream>;
}

#[derive(Default)]
struct PathEntry {
    value: Option<Value>,
    listeners: Vec<mpsc::UnboundedSender<SourceEvent>>,
}

/// In-process realtime store. Last write wins per path.
#[derive(Default)]
pub struct MemoryStore {
    paths: DashMap<String, PathEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.paths.get(path).and_then(|entry| entry.value.clone())
    }

    /// Stores `value` at `path` and notifies every live listener.
    /// Returns how many listeners were notified.
    pub fn set(&self, path: &str, value: Value) -> Result<usize> {
        validate_path(path)?;
        let mut entry = self.paths.entry(path.to_string()).or_default();
        entry.listeners.retain(|tx| tx.send(SourceEvent::Snapshot(value.clone())).is_ok());
        entry.value = Some(value);
        debug!("Set {} for {} listeners", path, entry.listeners.len());
        Ok(entry.listeners.len())
    }

    /// Fails every subscription on `path` with `reason` and forgets them.
    pub fn cancel(&self, path: &str, reason: &str) -> Result<usize> {
        validate_path(path)?;
        let Some(mut entry) = self.paths.get_mut(path) else {
            return Ok(0);
        };
        let cancelled = entry.listeners
            .drain(..)
            .filter(|tx| tx.send(SourceEvent::Cancelled(reason.to_string())).is_ok())
            .count();
        warn!("Cancelled {} listeners on {}: {}", cancelled, path, reason);
        Ok(cancelled)
    }

    pub fn listener_count(&self, path: &str) -> usize {
        self.paths.get_mut(path)
            .map(|mut entry| {
                entry.listeners.retain(|tx| !tx.is_closed());
                entry.listeners.len()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl ChangeSource for MemoryStore {
    async fn subscribe(&self, path: &str) -> Result<SnapshotStream> {
        validate_path(path)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let mut entry = self.paths.entry(path.to_string()).or_default();
        let current = entry.value.clone().unwrap_or(Value::Null);
        tx.send(SourceEvent::Snapshot(current))
            .map_err(|_| SyncError::subscription(path, "listener closed before registration"))?;
        entry.listeners.retain(|listener| !listener.is_closed());
        entry.listeners.push(tx);
        debug!("Subscribed to {} ({} listeners)", path, entry.listeners.len());
        Ok(rx)
    }
}

/// Paths must be non-empty and free of `.`, `#`, `$`, `[` and `]`.
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() || path.contains(['.', '#', '$', '[', ']']) {
        return Err(SyncError::InvalidPath(path.to_string()));
    }
    Ok(())
}

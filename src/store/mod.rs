//! Bounded time series of snapshots over a [`Backend`].

pub mod backend;
pub mod memory;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::system::snapshot::Snapshot;

pub use backend::{Backend, BackendError, BackendInfo, Command, Reply};
pub use memory::MemoryBackend;

pub const DEFAULT_CAPACITY: usize = 100;

const CURRENT_KEY: &str = "current_metrics";
const HISTORY_KEY: &str = "metrics_history";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Unavailable(#[from] BackendError),
    #[error("snapshot encoding failed: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub connected: bool,
    pub total_stored: u64,
    pub backing_memory_usage: Option<String>,
    pub backing_uptime_seconds: Option<u64>,
}

/// Latest snapshot plus a newest-first history capped at `capacity`.
///
/// Every write is a single backend batch, so readers see either the state
/// before a `store` or after it, and the history never exceeds its capacity.
pub struct TimeSeriesStore {
    backend: Arc<dyn Backend>,
    capacity: usize,
}

impl TimeSeriesStore {
    pub fn new(backend: Arc<dyn Backend>, capacity: usize) -> Self {
        TimeSeriesStore {
            backend,
            capacity: capacity.max(1),
        }
    }

    pub fn in_memory(capacity: usize) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Publishes `snapshot` as current and prepends it to the history,
    /// dropping the oldest entries beyond capacity in the same batch.
    pub fn store(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(snapshot)?;
        let last = self.capacity as i64 - 1;
        self.backend.execute(vec![
            Command::set(CURRENT_KEY, encoded.clone()),
            Command::list_push(HISTORY_KEY, encoded),
            Command::list_trim(HISTORY_KEY, 0, last),
        ])?;
        debug!(timestamp = %snapshot.timestamp, "snapshot stored");
        Ok(())
    }

    /// `None` when nothing is stored yet or the backend cannot be read.
    pub fn current(&self) -> Option<Snapshot> {
        let reply = match self.backend.execute(vec![Command::get(CURRENT_KEY)]) {
            Ok(mut replies) => replies.pop()?,
            Err(err) => {
                warn!(error = %err, "failed to read current snapshot");
                return None;
            }
        };
        let encoded = match reply.into_value() {
            Ok(value) => value?,
            Err(err) => {
                warn!(error = %err, "failed to read current snapshot");
                return None;
            }
        };
        match serde_json::from_str(&encoded) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(error = %err, "discarding undecodable current snapshot");
                None
            }
        }
    }

    /// Up to `limit` snapshots, newest first. Empty when the backend cannot
    /// be read; entries that fail to decode are skipped.
    pub fn history(&self, limit: usize) -> Vec<Snapshot> {
        let limit = limit.min(self.capacity);
        if limit == 0 {
            return Vec::new();
        }
        let entries = self
            .backend
            .execute(vec![Command::list_range(HISTORY_KEY, 0, limit as i64 - 1)])
            .and_then(|mut replies| {
                replies
                    .pop()
                    .ok_or(BackendError::UnexpectedReply)?
                    .into_values()
            });
        let entries = match entries {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "failed to read snapshot history");
                return Vec::new();
            }
        };

        entries
            .iter()
            .filter_map(|encoded| match serde_json::from_str(encoded) {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    warn!(error = %err, "skipping undecodable history entry");
                    None
                }
            })
            .collect()
    }

    /// Best effort: an unreachable backend reports `connected: false` and
    /// zeroes instead of an error.
    pub fn stats(&self) -> StoreStats {
        if let Err(err) = self.backend.ping() {
            debug!(error = %err, "backing store ping failed");
            return StoreStats::default();
        }
        let total_stored = self
            .backend
            .execute(vec![Command::list_len(HISTORY_KEY)])
            .and_then(|mut replies| {
                replies
                    .pop()
                    .ok_or(BackendError::UnexpectedReply)?
                    .into_int()
            });
        let total_stored = match total_stored {
            Ok(n) => n,
            Err(err) => {
                warn!(error = %err, "failed to read history length");
                return StoreStats::default();
            }
        };
        let info = self.backend.info().unwrap_or_else(|err| {
            warn!(error = %err, "backing store info unavailable");
            BackendInfo::default()
        });
        StoreStats {
            connected: true,
            total_stored,
            backing_memory_usage: info.memory_usage,
            backing_uptime_seconds: info.uptime_seconds,
        }
    }

    /// Removes the current snapshot and the whole history in one batch.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.execute(vec![
            Command::delete(CURRENT_KEY),
            Command::delete(HISTORY_KEY),
        ])?;
        debug!("stored snapshots cleared");
        Ok(())
    }
}

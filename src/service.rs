//! The entry points a presentation layer is allowed to call.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::poller::{LoopCounters, PollerController, Sampler, StartOutcome, StopOutcome};
use crate::store::{Backend, MemoryBackend, StoreError, StoreStats, TimeSeriesStore};
use crate::system::snapshot::{Snapshot, SystemInfo};
use crate::system::{HostProbe, SnapshotCollector, SysinfoProbe};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("collection task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

/// Collector and store composed into one collect-and-store cycle.
struct Pipeline {
    collector: SnapshotCollector,
    store: TimeSeriesStore,
}

impl Pipeline {
    /// Always returns the collected snapshot, alongside whether it was kept.
    fn collect_and_store(&self) -> (Snapshot, Result<(), StoreError>) {
        let snapshot = self.collector.collect();
        let stored = self.store.store(&snapshot);
        (snapshot, stored)
    }
}

impl Sampler for Pipeline {
    fn sample(&self) -> Result<(), StoreError> {
        self.collect_and_store().1
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Health {
    pub healthy: bool,
    pub connected: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ServiceStatus {
    pub store: StoreStats,
    pub system: SystemInfo,
    pub monitoring_active: bool,
    pub poller: LoopCounters,
}

/// Owns the collector, store and poller for one host.
pub struct MonitoringService {
    pipeline: Arc<Pipeline>,
    poller: PollerController<Pipeline>,
}

impl MonitoringService {
    pub fn new(probe: Arc<dyn HostProbe>, backend: Arc<dyn Backend>, config: &Config) -> Self {
        let collector = SnapshotCollector::new(
            probe,
            config.collector.disk_path.clone(),
            config.collector.top_processes,
        );
        let store = TimeSeriesStore::new(backend, config.store.capacity);
        let pipeline = Arc::new(Pipeline { collector, store });
        let poller = PollerController::new(Arc::clone(&pipeline), config.poller.settings());
        MonitoringService { pipeline, poller }
    }

    /// Live `sysinfo` probe with an in-process backend.
    pub fn from_config(config: &Config) -> Self {
        let probe = SysinfoProbe::new(Duration::from_millis(config.collector.cpu_sample_ms));
        Self::new(Arc::new(probe), Arc::new(MemoryBackend::new()), config)
    }

    /// Collects on the blocking pool and stores the result. A store failure
    /// is logged and the snapshot still returned.
    pub async fn collect_and_store(&self) -> Result<Snapshot, ServiceError> {
        let pipeline = Arc::clone(&self.pipeline);
        let (snapshot, stored) =
            tokio::task::spawn_blocking(move || pipeline.collect_and_store()).await?;
        if let Err(err) = stored {
            warn!(error = %err, "on-demand snapshot collected but not retained");
        }
        Ok(snapshot)
    }

    pub async fn current_or_collect(&self) -> Result<Snapshot, ServiceError> {
        match self.pipeline.store.current() {
            Some(snapshot) => Ok(snapshot),
            None => self.collect_and_store().await,
        }
    }

    pub fn current(&self) -> Option<Snapshot> {
        self.pipeline.store.current()
    }

    pub fn history(&self, limit: usize) -> Vec<Snapshot> {
        self.pipeline.store.history(limit)
    }

    pub fn stats(&self) -> StoreStats {
        self.pipeline.store.stats()
    }

    pub async fn start(&self) -> StartOutcome {
        self.poller.start().await
    }

    pub async fn stop(&self) -> StopOutcome {
        self.poller.stop().await
    }

    /// Stops the poller and waits for its loop to exit.
    pub async fn shutdown(&self) {
        self.poller.shutdown().await
    }

    pub fn is_active(&self) -> bool {
        self.poller.is_active()
    }

    pub fn clear(&self) -> bool {
        match self.pipeline.store.clear() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to clear stored snapshots");
                false
            }
        }
    }

    pub fn poller_counters(&self) -> LoopCounters {
        self.poller.counters()
    }

    pub fn health(&self) -> Health {
        Health {
            healthy: true,
            connected: self.stats().connected,
            timestamp: Utc::now(),
        }
    }

    pub async fn status(&self) -> Result<ServiceStatus, ServiceError> {
        let pipeline = Arc::clone(&self.pipeline);
        let system = tokio::task::spawn_blocking(move || pipeline.collector.system_info()).await?;
        Ok(ServiceStatus {
            store: self.stats(),
            system,
            monitoring_active: self.is_active(),
            poller: self.poller.counters(),
        })
    }
}

//! Raw host readings and the capability that produces them.
//!
//! A [`HostProbe`] returns values in OS units (bytes, MHz, epoch seconds).
//! Normalization into a [`Snapshot`](super::snapshot::Snapshot) is the
//! collector's job.

use std::path::Path;

use thiserror::Error;

use super::snapshot::MetricGroup;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{group} readings unavailable: {reason}")]
    Unavailable { group: MetricGroup, reason: String },
    #[error("no mounted filesystem contains {0}")]
    MountNotFound(String),
}

impl ProbeError {
    pub fn unavailable(group: MetricGroup, reason: impl Into<String>) -> Self {
        ProbeError::Unavailable {
            group,
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CpuReading {
    pub usage_percent: f64,
    pub frequency_mhz: f64,
    pub core_count: u32,
    pub load_average: [f64; 3],
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiskReading {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkReading {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SystemReading {
    pub hostname: String,
    pub platform: String,
    pub processor: String,
    /// Seconds since the Unix epoch.
    pub boot_time: u64,
    pub uptime_seconds: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessReading {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
}

/// Source of raw host counters.
///
/// Every method may fail on its own. Processes that vanish or deny access
/// during enumeration are left out of [`list_processes`](Self::list_processes)
/// rather than reported as errors.
pub trait HostProbe: Send + Sync {
    /// May block for a sampling window.
    fn read_cpu(&self) -> Result<CpuReading, ProbeError>;
    fn read_memory(&self) -> Result<MemoryReading, ProbeError>;
    fn read_disk(&self, path: &Path) -> Result<DiskReading, ProbeError>;
    fn read_network(&self) -> Result<NetworkReading, ProbeError>;
    fn read_system(&self) -> Result<SystemReading, ProbeError>;
    fn list_processes(&self) -> Result<Vec<ProcessReading>, ProbeError>;
}

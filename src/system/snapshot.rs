use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::process::ProcessSample;

pub const UNKNOWN: &str = "Unknown";

/// One collection cycle. Never mutated after the collector assembles it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disk: DiskInfo,
    pub network: NetworkInfo,
    pub system: SystemInfo,
    pub top_processes: Vec<ProcessSample>,
    /// Groups that failed to read and were zero-filled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<MetricGroup>,
}

impl Snapshot {
    /// A snapshot with every group at its zero-value sentinel.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Snapshot {
            timestamp,
            cpu: CpuInfo::default(),
            memory: MemoryInfo::default(),
            disk: DiskInfo::default(),
            network: NetworkInfo::default(),
            system: SystemInfo::default(),
            top_processes: Vec::new(),
            degraded: Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricGroup {
    Cpu,
    Memory,
    Disk,
    Network,
    System,
    TopProcesses,
}

impl MetricGroup {
    pub const ALL: [MetricGroup; 6] = [
        MetricGroup::Cpu,
        MetricGroup::Memory,
        MetricGroup::Disk,
        MetricGroup::Network,
        MetricGroup::System,
        MetricGroup::TopProcesses,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricGroup::Cpu => "cpu",
            MetricGroup::Memory => "memory",
            MetricGroup::Disk => "disk",
            MetricGroup::Network => "network",
            MetricGroup::System => "system",
            MetricGroup::TopProcesses => "top_processes",
        }
    }
}

impl fmt::Display for MetricGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub usage_percent: f64,
    pub frequency_mhz: f64,
    pub core_count: u32,
    /// 1, 5 and 15 minute averages.
    pub load_average: [f64; 3],
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total_gb: f64,
    pub available_gb: f64,
    pub used_gb: f64,
    pub usage_percent: f64,
    pub swap_total_gb: f64,
    pub swap_used_gb: f64,
    pub swap_percent: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub usage_percent: f64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub bytes_sent_mb: f64,
    pub bytes_recv_mb: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub platform: String,
    pub processor: String,
    pub boot_time: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub uptime_hours: f64,
}

impl Default for SystemInfo {
    fn default() -> Self {
        SystemInfo {
            hostname: UNKNOWN.to_string(),
            platform: UNKNOWN.to_string(),
            processor: UNKNOWN.to_string(),
            boot_time: DateTime::<Utc>::UNIX_EPOCH,
            uptime_seconds: 0,
            uptime_hours: 0.0,
        }
    }
}

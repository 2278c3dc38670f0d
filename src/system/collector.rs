use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::format::{bytes_to_gb, bytes_to_mb, clamp_percent, percent, round_2};

use super::probe::{
    CpuReading, DiskReading, HostProbe, MemoryReading, NetworkReading, ProbeError, ProcessReading,
    SystemReading,
};
use super::process::{ProcessSample, rank_top_processes};
use super::snapshot::{
    CpuInfo, DiskInfo, MemoryInfo, MetricGroup, NetworkInfo, Snapshot, SystemInfo,
};

pub const DEFAULT_TOP_PROCESSES: usize = 10;

/// Assembles snapshots from a [`HostProbe`].
///
/// `collect` never fails: a group whose read errors is logged, zero-filled
/// and listed in [`Snapshot::degraded`]. Storing the result is the caller's
/// job.
pub struct SnapshotCollector {
    probe: Arc<dyn HostProbe>,
    disk_path: PathBuf,
    top_processes: usize,
}

impl SnapshotCollector {
    pub fn new(probe: Arc<dyn HostProbe>, disk_path: impl Into<PathBuf>, top_processes: usize) -> Self {
        SnapshotCollector {
            probe,
            disk_path: disk_path.into(),
            top_processes,
        }
    }

    /// Blocks for the probe's CPU sampling window.
    pub fn collect(&self) -> Snapshot {
        let mut snapshot = Snapshot::empty(Utc::now());
        let mut degraded = Vec::new();

        if let Some(cpu) = isolate(MetricGroup::Cpu, self.probe.read_cpu(), &mut degraded) {
            snapshot.cpu = cpu_info(cpu);
        }
        if let Some(memory) = isolate(MetricGroup::Memory, self.probe.read_memory(), &mut degraded)
        {
            snapshot.memory = memory_info(memory);
        }
        if let Some(disk) = isolate(
            MetricGroup::Disk,
            self.probe.read_disk(&self.disk_path),
            &mut degraded,
        ) {
            snapshot.disk = disk_info(disk);
        }
        if let Some(network) =
            isolate(MetricGroup::Network, self.probe.read_network(), &mut degraded)
        {
            snapshot.network = network_info(network);
        }
        if let Some(system) = isolate(MetricGroup::System, self.probe.read_system(), &mut degraded)
        {
            snapshot.system = system_info(system);
        }
        if let Some(processes) = isolate(
            MetricGroup::TopProcesses,
            self.ranked_processes(self.top_processes),
            &mut degraded,
        ) {
            snapshot.top_processes = processes;
        }

        snapshot.degraded = degraded;
        debug!(
            timestamp = %snapshot.timestamp,
            degraded = snapshot.degraded.len(),
            "snapshot collected"
        );
        snapshot
    }

    /// Re-enumerates the process table on every call.
    pub fn top_processes(&self, limit: usize) -> Vec<ProcessSample> {
        match self.ranked_processes(limit) {
            Ok(processes) => processes,
            Err(err) => {
                warn!(group = %MetricGroup::TopProcesses, error = %err, "probe read failed");
                Vec::new()
            }
        }
    }

    /// Reads only the system group, zero-filled on failure.
    pub fn system_info(&self) -> SystemInfo {
        let mut degraded = Vec::new();
        isolate(MetricGroup::System, self.probe.read_system(), &mut degraded)
            .map(system_info)
            .unwrap_or_default()
    }

    fn ranked_processes(&self, limit: usize) -> Result<Vec<ProcessSample>, ProbeError> {
        let processes = self.probe.list_processes()?;
        Ok(rank_top_processes(
            processes.into_iter().map(process_sample).collect(),
            limit,
        ))
    }
}

fn isolate<T>(
    group: MetricGroup,
    reading: Result<T, ProbeError>,
    degraded: &mut Vec<MetricGroup>,
) -> Option<T> {
    match reading {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(group = %group, error = %err, "probe read failed, zero-filling group");
            degraded.push(group);
            None
        }
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

fn cpu_info(r: CpuReading) -> CpuInfo {
    CpuInfo {
        usage_percent: clamp_percent(r.usage_percent),
        frequency_mhz: round_2(non_negative(r.frequency_mhz)),
        core_count: r.core_count,
        load_average: r.load_average.map(|v| round_2(non_negative(v))),
    }
}

fn memory_info(r: MemoryReading) -> MemoryInfo {
    MemoryInfo {
        total_gb: bytes_to_gb(r.total_bytes),
        available_gb: bytes_to_gb(r.available_bytes),
        used_gb: bytes_to_gb(r.used_bytes),
        usage_percent: percent(
            r.total_bytes.saturating_sub(r.available_bytes),
            r.total_bytes,
        ),
        swap_total_gb: bytes_to_gb(r.swap_total_bytes),
        swap_used_gb: bytes_to_gb(r.swap_used_bytes),
        swap_percent: percent(r.swap_used_bytes, r.swap_total_bytes),
    }
}

fn disk_info(r: DiskReading) -> DiskInfo {
    let used = r.total_bytes.saturating_sub(r.available_bytes);
    DiskInfo {
        total_gb: bytes_to_gb(r.total_bytes),
        used_gb: bytes_to_gb(used),
        free_gb: bytes_to_gb(r.available_bytes),
        usage_percent: percent(used, r.total_bytes),
        read_bytes: r.read_bytes,
        write_bytes: r.write_bytes,
    }
}

fn network_info(r: NetworkReading) -> NetworkInfo {
    NetworkInfo {
        bytes_sent: r.bytes_sent,
        bytes_recv: r.bytes_recv,
        packets_sent: r.packets_sent,
        packets_recv: r.packets_recv,
        bytes_sent_mb: bytes_to_mb(r.bytes_sent),
        bytes_recv_mb: bytes_to_mb(r.bytes_recv),
    }
}

fn system_info(r: SystemReading) -> SystemInfo {
    let boot_time = i64::try_from(r.boot_time)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    SystemInfo {
        hostname: r.hostname,
        platform: r.platform,
        processor: r.processor,
        boot_time,
        uptime_seconds: r.uptime_seconds,
        uptime_hours: round_2(r.uptime_seconds as f64 / 3600.0),
    }
}

fn process_sample(r: ProcessReading) -> ProcessSample {
    ProcessSample {
        pid: r.pid,
        name: r.name,
        cpu_percent: r.cpu_percent.map(|v| round_2(non_negative(v))),
        memory_percent: r.memory_percent.map(|v| round_2(non_negative(v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn memory_usage_counts_unavailable_bytes() {
        let info = memory_info(MemoryReading {
            total_bytes: 8 * GIB,
            available_bytes: 6 * GIB,
            used_bytes: GIB,
            swap_total_bytes: 0,
            swap_used_bytes: 0,
        });
        assert_eq!(info.total_gb, 8.0);
        assert_eq!(info.used_gb, 1.0);
        assert_eq!(info.usage_percent, 25.0);
        assert_eq!(info.swap_percent, 0.0);
    }

    #[test]
    fn disk_derives_used_and_free() {
        let info = disk_info(DiskReading {
            total_bytes: 100 * GIB,
            available_bytes: 40 * GIB,
            read_bytes: 7,
            write_bytes: 9,
        });
        assert_eq!(info.used_gb, 60.0);
        assert_eq!(info.free_gb, 40.0);
        assert_eq!(info.usage_percent, 60.0);
        assert_eq!((info.read_bytes, info.write_bytes), (7, 9));
    }

    #[test]
    fn cpu_values_are_clamped() {
        let info = cpu_info(CpuReading {
            usage_percent: 104.2,
            frequency_mhz: f64::NAN,
            core_count: 4,
            load_average: [0.123, -1.0, 2.0],
        });
        assert_eq!(info.usage_percent, 100.0);
        assert_eq!(info.frequency_mhz, 0.0);
        assert_eq!(info.load_average, [0.12, 0.0, 2.0]);
    }

    #[test]
    fn system_uptime_in_hours() {
        let info = system_info(SystemReading {
            hostname: "box".into(),
            platform: "linux".into(),
            processor: "cpu".into(),
            boot_time: 1_700_000_000,
            uptime_seconds: 5400,
        });
        assert_eq!(info.uptime_hours, 1.5);
        assert_eq!(info.boot_time.timestamp(), 1_700_000_000);
    }
}

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use sysinfo::{Disks, Networks, ProcessRefreshKind, ProcessesToUpdate, System};

use super::platform;
use super::probe::{
    CpuReading, DiskReading, HostProbe, MemoryReading, NetworkReading, ProbeError, ProcessReading,
    SystemReading,
};
use super::snapshot::{MetricGroup, UNKNOWN};

/// [`HostProbe`] backed by `sysinfo`.
///
/// One `System` is kept across calls so CPU usage, host-wide and per process,
/// is measured against the previous refresh.
pub struct SysinfoProbe {
    sys: Mutex<System>,
    cpu_sample: Duration,
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

impl SysinfoProbe {
    pub fn new(cpu_sample: Duration) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        SysinfoProbe {
            sys: Mutex::new(sys),
            cpu_sample: cpu_sample.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    pub fn cpu_sample(&self) -> Duration {
        self.cpu_sample
    }
}

impl HostProbe for SysinfoProbe {
    fn read_cpu(&self) -> Result<CpuReading, ProbeError> {
        // The lock is not held across the sampling window.
        self.sys.lock().refresh_cpu_all();
        std::thread::sleep(self.cpu_sample);

        let mut sys = self.sys.lock();
        sys.refresh_cpu_all();
        let cpus = sys.cpus();
        if cpus.is_empty() {
            return Err(ProbeError::unavailable(MetricGroup::Cpu, "no cpus reported"));
        }
        let load = System::load_average();
        Ok(CpuReading {
            usage_percent: f64::from(sys.global_cpu_usage()),
            frequency_mhz: cpus[0].frequency() as f64,
            core_count: cpus.len() as u32,
            load_average: [load.one, load.five, load.fifteen],
        })
    }

    fn read_memory(&self) -> Result<MemoryReading, ProbeError> {
        let mut sys = self.sys.lock();
        sys.refresh_memory();
        let total = sys.total_memory();
        if total == 0 {
            return Err(ProbeError::unavailable(
                MetricGroup::Memory,
                "total memory reported as zero",
            ));
        }
        Ok(MemoryReading {
            total_bytes: total,
            available_bytes: sys.available_memory(),
            used_bytes: sys.used_memory(),
            swap_total_bytes: sys.total_swap(),
            swap_used_bytes: sys.used_swap(),
        })
    }

    fn read_disk(&self, path: &Path) -> Result<DiskReading, ProbeError> {
        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .filter(|d| path.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
            .ok_or_else(|| ProbeError::MountNotFound(path.display().to_string()))?;

        let io = platform::disk_io_counters().unwrap_or_default();
        Ok(DiskReading {
            total_bytes: disk.total_space(),
            available_bytes: disk.available_space(),
            read_bytes: io.read_bytes,
            write_bytes: io.write_bytes,
        })
    }

    fn read_network(&self) -> Result<NetworkReading, ProbeError> {
        let networks = Networks::new_with_refreshed_list();
        let mut reading = NetworkReading::default();
        for (_, data) in &networks {
            reading.bytes_sent = reading.bytes_sent.saturating_add(data.total_transmitted());
            reading.bytes_recv = reading.bytes_recv.saturating_add(data.total_received());
            reading.packets_sent = reading
                .packets_sent
                .saturating_add(data.total_packets_transmitted());
            reading.packets_recv = reading
                .packets_recv
                .saturating_add(data.total_packets_received());
        }
        Ok(reading)
    }

    fn read_system(&self) -> Result<SystemReading, ProbeError> {
        let boot_time = System::boot_time();
        if boot_time == 0 {
            return Err(ProbeError::unavailable(
                MetricGroup::System,
                "boot time unavailable",
            ));
        }
        let platform = match (System::long_os_version(), System::kernel_version()) {
            (Some(os), Some(kernel)) => format!("{os} (kernel {kernel}, {})", std::env::consts::ARCH),
            (Some(os), None) => format!("{os} ({})", std::env::consts::ARCH),
            _ => std::env::consts::OS.to_string(),
        };
        let processor = {
            let sys = self.sys.lock();
            sys.cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .filter(|brand| !brand.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string())
        };
        Ok(SystemReading {
            hostname: System::host_name().unwrap_or_else(|| UNKNOWN.to_string()),
            platform,
            processor,
            boot_time,
            uptime_seconds: System::uptime(),
        })
    }

    fn list_processes(&self) -> Result<Vec<ProcessReading>, ProbeError> {
        let mut sys = self.sys.lock();
        sys.refresh_memory();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        let total_memory = sys.total_memory();

        let processes = sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessReading {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().to_string(),
                cpu_percent: Some(f64::from(process.cpu_usage())),
                memory_percent: (total_memory > 0)
                    .then(|| process.memory() as f64 / total_memory as f64 * 100.0),
            })
            .collect();
        Ok(processes)
    }
}

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use hostpulse::config::Config;
use hostpulse::service::MonitoringService;
use hostpulse::store::{Backend, BackendError, BackendInfo, Command, MemoryBackend, Reply};
use hostpulse::system::MetricGroup;
use hostpulse::system::probe::{
    CpuReading, DiskReading, HostProbe, MemoryReading, NetworkReading, ProbeError, ProcessReading,
    SystemReading,
};
use parking_lot::Mutex;

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Deterministic probe with switchable failures and overlap tracking.
#[derive(Default)]
pub struct StubProbe {
    failing: Mutex<HashSet<MetricGroup>>,
    panic_next: AtomicBool,
    cpu_delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    cpu_reads: AtomicUsize,
    process_lists: AtomicUsize,
    processes: Mutex<Vec<ProcessReading>>,
}

impl StubProbe {
    pub fn new() -> Self {
        let probe = StubProbe::default();
        *probe.processes.lock() = vec![
            process(1, "init", Some(0.1), Some(0.5)),
            process(42, "postgres", Some(35.0), Some(12.0)),
            process(7, "zombie", None, None),
            process(99, "cargo", Some(80.0), Some(4.0)),
        ];
        probe
    }

    pub fn with_cpu_delay(delay: Duration) -> Self {
        let probe = Self::new();
        *probe.cpu_delay.lock() = delay;
        probe
    }

    pub fn fail(&self, group: MetricGroup) {
        self.failing.lock().insert(group);
    }

    pub fn recover(&self, group: MetricGroup) {
        self.failing.lock().remove(&group);
    }

    pub fn panic_once(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    pub fn set_processes(&self, processes: Vec<ProcessReading>) {
        *self.processes.lock() = processes;
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn cpu_reads(&self) -> usize {
        self.cpu_reads.load(Ordering::SeqCst)
    }

    pub fn process_lists(&self) -> usize {
        self.process_lists.load(Ordering::SeqCst)
    }

    fn check(&self, group: MetricGroup) -> Result<(), ProbeError> {
        if self.failing.lock().contains(&group) {
            return Err(ProbeError::unavailable(group, "injected failure"));
        }
        Ok(())
    }
}

pub fn process(pid: u32, name: &str, cpu: Option<f64>, memory: Option<f64>) -> ProcessReading {
    ProcessReading {
        pid,
        name: name.to_string(),
        cpu_percent: cpu,
        memory_percent: memory,
    }
}

impl HostProbe for StubProbe {
    fn read_cpu(&self) -> Result<CpuReading, ProbeError> {
        self.cpu_reads.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.cpu_delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("probe blew up");
        }
        self.check(MetricGroup::Cpu)?;
        Ok(CpuReading {
            usage_percent: 12.5,
            frequency_mhz: 2400.0,
            core_count: 8,
            load_average: [0.5, 0.25, 0.125],
        })
    }

    fn read_memory(&self) -> Result<MemoryReading, ProbeError> {
        self.check(MetricGroup::Memory)?;
        Ok(MemoryReading {
            total_bytes: 16 * GIB,
            available_bytes: 12 * GIB,
            used_bytes: 4 * GIB,
            swap_total_bytes: 2 * GIB,
            swap_used_bytes: GIB,
        })
    }

    fn read_disk(&self, _path: &Path) -> Result<DiskReading, ProbeError> {
        self.check(MetricGroup::Disk)?;
        Ok(DiskReading {
            total_bytes: 500 * GIB,
            available_bytes: 125 * GIB,
            read_bytes: 1_000,
            write_bytes: 2_000,
        })
    }

    fn read_network(&self) -> Result<NetworkReading, ProbeError> {
        self.check(MetricGroup::Network)?;
        Ok(NetworkReading {
            bytes_sent: 3 * 1024 * 1024,
            bytes_recv: 5 * 1024 * 1024,
            packets_sent: 30,
            packets_recv: 50,
        })
    }

    fn read_system(&self) -> Result<SystemReading, ProbeError> {
        self.check(MetricGroup::System)?;
        Ok(SystemReading {
            hostname: "stub-host".to_string(),
            platform: "StubOS 1.0".to_string(),
            processor: "Stub CPU".to_string(),
            boot_time: 1_700_000_000,
            uptime_seconds: 7200,
        })
    }

    fn list_processes(&self) -> Result<Vec<ProcessReading>, ProbeError> {
        self.process_lists.fetch_add(1, Ordering::SeqCst);
        self.check(MetricGroup::TopProcesses)?;
        Ok(self.processes.lock().clone())
    }
}

/// Memory backend that can be switched offline.
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    offline: AtomicBool,
}

impl FlakyBackend {
    pub fn offline() -> Self {
        let backend = FlakyBackend::default();
        backend.set_offline(true);
        backend
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn reachable(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Unreachable("connection refused".to_string()));
        }
        Ok(())
    }
}

impl Backend for FlakyBackend {
    fn execute(&self, batch: Vec<Command>) -> Result<Vec<Reply>, BackendError> {
        self.reachable()?;
        self.inner.execute(batch)
    }

    fn ping(&self) -> Result<(), BackendError> {
        self.reachable()
    }

    fn info(&self) -> Result<BackendInfo, BackendError> {
        self.reachable()?;
        self.inner.info()
    }
}

pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.poller.interval_ms = 10;
    config.poller.backoff_ms = 30;
    config
}

pub fn service(probe: Arc<StubProbe>, backend: Arc<dyn Backend>) -> MonitoringService {
    MonitoringService::new(probe, backend, &fast_config())
}

pub async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

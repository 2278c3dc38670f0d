pub mod collector;
pub mod platform;
pub mod probe;
pub mod process;
pub mod snapshot;
pub mod sysinfo_probe;

pub use collector::SnapshotCollector;
pub use probe::{HostProbe, ProbeError};
pub use snapshot::{MetricGroup, Snapshot};
pub use sysinfo_probe::SysinfoProbe;

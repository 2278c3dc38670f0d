use super::{IoStats, PlatformExtensions};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn disk_io_counters() -> Option<IoStats> {
        // Host-wide counters need IOCTL_DISK_PERFORMANCE per physical drive.
        None
    }
}

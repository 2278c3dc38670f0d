use super::{IoStats, PlatformExtensions};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn disk_io_counters() -> Option<IoStats> {
        // IOKit block storage statistics are not wired up; callers zero-fill.
        None
    }
}

use std::path::Path;

use super::{IoStats, PlatformExtensions};

const SECTOR_SIZE: u64 = 512;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn disk_io_counters() -> Option<IoStats> {
        let contents = std::fs::read_to_string("/proc/diskstats").ok()?;
        // Partitions are not listed under /sys/block, so only whole devices count.
        parse_diskstats(&contents, |name| {
            Path::new("/sys/block").join(name.replace('/', "!")).exists()
        })
    }
}

/// Sums sectors read and written over the devices accepted by `is_device`.
///
/// Each line is `major minor name reads merged sectors_read ms writes merged
/// sectors_written ...`; malformed lines are skipped.
pub(crate) fn parse_diskstats(contents: &str, is_device: impl Fn(&str) -> bool) -> Option<IoStats> {
    let mut total = IoStats::default();
    let mut seen = false;
    for line in contents.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 || !is_device(fields[2]) {
            continue;
        }
        let (Ok(sectors_read), Ok(sectors_written)) =
            (fields[5].parse::<u64>(), fields[9].parse::<u64>())
        else {
            continue;
        };
        total.read_bytes = total
            .read_bytes
            .saturating_add(sectors_read.saturating_mul(SECTOR_SIZE));
        total.write_bytes = total
            .write_bytes
            .saturating_add(sectors_written.saturating_mul(SECTOR_SIZE));
        seen = true;
    }
    seen.then_some(total)
}

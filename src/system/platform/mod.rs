#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IoStats {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

pub trait PlatformExtensions {
    /// Host-wide cumulative block device I/O, if the platform exposes it.
    fn disk_io_counters() -> Option<IoStats>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn disk_io_counters() -> Option<IoStats> {
    platform_impl::Platform::disk_io_counters()
}

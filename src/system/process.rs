use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One entry of the process table as reported in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
}

impl ProcessSample {
    fn cpu_sort_key(&self) -> f64 {
        match self.cpu_percent {
            Some(v) if v.is_finite() => v,
            _ => 0.0,
        }
    }
}

/// Orders by CPU usage, busiest first, and keeps at most `limit` entries.
///
/// Missing CPU values rank as zero but stay `None` in the output. The sort is
/// stable so ties keep enumeration order.
pub fn rank_top_processes(mut processes: Vec<ProcessSample>, limit: usize) -> Vec<ProcessSample> {
    processes.sort_by(|a, b| {
        b.cpu_sort_key()
            .partial_cmp(&a.cpu_sort_key())
            .unwrap_or(Ordering::Equal)
    });
    processes.truncate(limit);
    processes
}

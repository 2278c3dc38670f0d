//! Lifecycle of the background sampling loop.
//!
//! At most one loop runs per controller. `start` and `stop` are serialized by
//! one async mutex, and a stopped loop is awaited before a new one is spawned,
//! so a stop immediately followed by a start never leaves two loops running.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::store::StoreError;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(10);

/// One blocking collect-and-store cycle.
pub trait Sampler: Send + Sync + 'static {
    /// A returned error is a soft failure: the snapshot was computed but not
    /// retained. Panics are treated as failed iterations.
    fn sample(&self) -> Result<(), StoreError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollerSettings {
    pub interval: Duration,
    pub backoff: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        PollerSettings {
            interval: DEFAULT_INTERVAL,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyActive,
}

impl StartOutcome {
    pub fn message(self) -> &'static str {
        match self {
            StartOutcome::Started => "Background monitoring started",
            StartOutcome::AlreadyActive => "Background monitoring already active",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    AlreadyIdle,
}

impl StopOutcome {
    pub fn message(self) -> &'static str {
        match self {
            StopOutcome::Stopped => "Background monitoring stopped",
            StopOutcome::AlreadyIdle => "Background monitoring already stopped",
        }
    }
}

/// Counters accumulated across every loop this controller has run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoopCounters {
    pub loops_spawned: u64,
    pub cycles: u64,
    pub store_failures: u64,
    pub iteration_failures: u64,
}

#[derive(Default)]
struct LoopStats {
    loops_spawned: AtomicU64,
    cycles: AtomicU64,
    store_failures: AtomicU64,
    iteration_failures: AtomicU64,
}

struct Running {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Lifecycle {
    running: Option<Running>,
    /// A loop that was told to stop and may still be finishing its cycle.
    stopping: Option<JoinHandle<()>>,
}

pub struct PollerController<S: Sampler> {
    sampler: Arc<S>,
    settings: PollerSettings,
    lifecycle: Mutex<Lifecycle>,
    active: AtomicBool,
    stats: Arc<LoopStats>,
}

impl<S: Sampler> PollerController<S> {
    pub fn new(sampler: Arc<S>, settings: PollerSettings) -> Self {
        PollerController {
            sampler,
            settings,
            lifecycle: Mutex::new(Lifecycle::default()),
            active: AtomicBool::new(false),
            stats: Arc::new(LoopStats::default()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Spawns the loop unless one is already active. If a previously stopped
    /// loop is still finishing its last cycle, waits for it first.
    pub async fn start(&self) -> StartOutcome {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.running.is_some() {
            return StartOutcome::AlreadyActive;
        }
        if let Some(previous) = lifecycle.stopping.take() {
            debug!("waiting for previous poller loop to exit");
            join_loop(previous).await;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.sampler),
            self.settings,
            stop_rx,
            Arc::clone(&self.stats),
        ));
        self.stats.loops_spawned.fetch_add(1, Ordering::Relaxed);
        lifecycle.running = Some(Running { stop_tx, task });
        self.active.store(true, Ordering::SeqCst);
        info!(
            interval_ms = self.settings.interval.as_millis() as u64,
            backoff_ms = self.settings.backoff.as_millis() as u64,
            "background monitoring started"
        );
        StartOutcome::Started
    }

    /// Signals the loop to exit. Does not interrupt a cycle in flight; the
    /// loop exits once that cycle completes.
    pub async fn stop(&self) -> StopOutcome {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(running) = lifecycle.running.take() else {
            return StopOutcome::AlreadyIdle;
        };
        self.active.store(false, Ordering::SeqCst);
        // The loop may already be gone; a closed channel is fine.
        let _ = running.stop_tx.send(true);
        lifecycle.stopping = Some(running.task);
        info!("background monitoring stopped");
        StopOutcome::Stopped
    }

    /// Stops the loop and waits until it has exited.
    pub async fn shutdown(&self) {
        self.stop().await;
        let previous = self.lifecycle.lock().await.stopping.take();
        if let Some(previous) = previous {
            join_loop(previous).await;
        }
    }

    pub fn counters(&self) -> LoopCounters {
        LoopCounters {
            loops_spawned: self.stats.loops_spawned.load(Ordering::Relaxed),
            cycles: self.stats.cycles.load(Ordering::Relaxed),
            store_failures: self.stats.store_failures.load(Ordering::Relaxed),
            iteration_failures: self.stats.iteration_failures.load(Ordering::Relaxed),
        }
    }
}

async fn join_loop(task: JoinHandle<()>) {
    if let Err(err) = task.await {
        error!(error = %err, "poller loop terminated abnormally");
    }
}

async fn run_loop<S: Sampler>(
    sampler: Arc<S>,
    settings: PollerSettings,
    mut stop_rx: watch::Receiver<bool>,
    stats: Arc<LoopStats>,
) {
    debug!("poller loop running");
    loop {
        if *stop_rx.borrow_and_update() {
            break;
        }

        let worker = Arc::clone(&sampler);
        let started = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || worker.sample()).await;
        let elapsed = started.elapsed();
        stats.cycles.fetch_add(1, Ordering::Relaxed);

        let pause = match outcome {
            Ok(Ok(())) => {
                debug!(duration_ms = elapsed.as_millis() as u64, "poll cycle completed");
                if elapsed > settings.interval {
                    warn!(
                        duration_ms = elapsed.as_millis() as u64,
                        interval_ms = settings.interval.as_millis() as u64,
                        "poll cycle exceeded interval"
                    );
                }
                settings.interval
            }
            Ok(Err(err)) => {
                stats.store_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "snapshot collected but not retained");
                settings.interval
            }
            Err(err) => {
                stats.iteration_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    error = %err,
                    backoff_ms = settings.backoff.as_millis() as u64,
                    "poll cycle failed, backing off"
                );
                settings.backoff
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            changed = stop_rx.changed() => {
                // Sender dropped: the controller is gone.
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!("poller loop exited");
}

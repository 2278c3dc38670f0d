use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use hostpulse::config::{self, Config, ConfigError};
use hostpulse::logging::init_tracing;
use hostpulse::service::{DEFAULT_HISTORY_LIMIT, MonitoringService};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "hostpulse",
    about = "Samples host resource usage into a bounded time series"
)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect one snapshot and print it as JSON
    Snapshot {
        /// Pretty-print the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Run the background poller until Ctrl-C or the given duration elapses
    Run {
        /// Sampling interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Number of snapshots kept in history
        #[arg(long)]
        capacity: Option<usize>,

        /// Stop after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Write the retained history as JSON to this file on exit
        #[arg(long)]
        dump: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let (mut config, config_error) = load_config_for_cli(&cli);
    init_tracing(&config.logging);
    if let Some(err) = config_error {
        warn!(error = %err, "using default configuration");
    }

    match cli.command {
        Command::Snapshot { pretty } => snapshot(&config, pretty).await,
        Command::Run {
            interval_ms,
            capacity,
            duration_secs,
            dump,
        } => {
            if let Some(ms) = interval_ms {
                config.poller.interval_ms = ms;
            }
            if let Some(capacity) = capacity {
                config.store.capacity = capacity;
            }
            run(&config, duration_secs.map(Duration::from_secs), dump.as_deref()).await
        }
    }
}

fn load_config_for_cli(cli: &Cli) -> (Config, Option<ConfigError>) {
    let (mut config, error) = match &cli.config {
        Some(path) => match config::try_load_config_from_path(path) {
            Ok(config) => (config, None),
            Err(err) => (Config::default(), Some(err)),
        },
        None => (config::load_config(), None),
    };

    if cli.log_json {
        config.logging.json = true;
    }

    (config, error)
}

async fn snapshot(config: &Config, pretty: bool) -> Result<()> {
    let service = MonitoringService::from_config(config);
    let snapshot = service.collect_and_store().await?;
    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");
    Ok(())
}

async fn run(config: &Config, duration: Option<Duration>, dump: Option<&Path>) -> Result<()> {
    let service = MonitoringService::from_config(config);
    if config.poller.autostart {
        let outcome = service.start().await;
        info!("{}", outcome.message());
    } else {
        // Without the poller, fill `current` once so the report has data.
        service.current_or_collect().await?;
    }

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut report = tokio::time::interval(config.poller.settings().interval);
    report.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = report.tick() => {
                let stats = service.stats();
                match service.current() {
                    Some(snap) => info!(
                        stored = stats.total_stored,
                        cpu_percent = snap.cpu.usage_percent,
                        memory_percent = snap.memory.usage_percent,
                        disk_percent = snap.disk.usage_percent,
                        degraded = snap.is_degraded(),
                        "latest snapshot"
                    ),
                    None => info!(stored = stats.total_stored, "no snapshot stored yet"),
                }
            }
            _ = &mut deadline => break,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("interrupt received, shutting down");
                break;
            }
        }
    }

    service.shutdown().await;

    if let Some(path) = dump {
        let history = service.history(config.store.capacity);
        std::fs::write(path, serde_json::to_string_pretty(&history)?)?;
        info!(path = %path.display(), entries = history.len(), "history written");
    }

    let status = service.status().await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    info!(
        recent = service.history(DEFAULT_HISTORY_LIMIT).len(),
        "poller stopped"
    );
    Ok(())
}

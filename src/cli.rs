// Command line: live table, counter-file replication, HTTP export, metric export.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::{oneshot, watch};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

use crate::config::AppConfig;
use crate::models::MetricsReport;
use crate::monitor::{JsonLinesSink, MetricsSink, MonitorSettings, StatsMonitor};
use crate::report::Table;
use crate::session::{DiskSession, NetworkSession};
use crate::{replicate, routes, worker};

/// Network and disk I/O stats monitor.
#[derive(Parser, Debug)]
#[command(name = "iometrics", version, about = "Network and disk I/O stats monitor")]
pub struct Cli {
    /// Config file (TOML). Defaults to $CONFIG_FILE, then ./iometrics.toml.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a live table of network and disk rates.
    Start {
        /// Stop after this many rows.
        #[arg(short = 'n', long, value_name = "ROWS")]
        iterations: Option<usize>,
    },
    /// Copy the network counter file to a path a container can read.
    Replicate,
    /// Serve the latest readings over HTTP.
    Serve,
    /// Write metrics as JSON lines to stdout, one object per logged step.
    Export {
        /// Number of sampling steps to run.
        #[arg(long, default_value_t = 100)]
        steps: u64,
        /// Log every n-th step (overrides tracking.log_every_n_steps).
        #[arg(long, value_name = "N")]
        every: Option<u64>,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Start { iterations } => run_start(&config, iterations).await,
        Command::Replicate => run_replicate(&config).await,
        Command::Serve => run_serve(&config).await,
        Command::Export { steps, every } => run_export(&config, steps, every).await,
    }
}

/// Builds the sessions enabled in `[tracking]`, taking their baseline snapshots.
pub fn build_sessions(
    config: &AppConfig,
) -> anyhow::Result<(Option<NetworkSession>, Option<DiskSession>)> {
    let options = config.sampling.session_options();
    let network = if config.tracking.track_network {
        Some(NetworkSession::from_path(&config.sources.net_dev, options)?)
    } else {
        None
    };
    let disk = if config.tracking.track_disk {
        Some(DiskSession::from_paths(
            &config.sources.diskstats,
            &config.sources.block_devices,
            options,
        )?)
    } else {
        None
    };
    Ok((network, disk))
}

async fn spawn_worker(
    config: &AppConfig,
) -> anyhow::Result<(
    watch::Receiver<MetricsReport>,
    oneshot::Sender<()>,
    tokio::task::JoinHandle<()>,
)> {
    let baseline_config = config.clone();
    let (network, disk) =
        tokio::task::spawn_blocking(move || build_sessions(&baseline_config)).await??;
    let (tx, rx) = watch::channel(MetricsReport::default());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = worker::spawn(
        worker::WorkerDeps {
            network,
            disk,
            tx,
            shutdown_rx,
        },
        worker::WorkerConfig {
            sample_interval_ms: config.sampling.interval_ms,
        },
    );
    Ok((rx, shutdown_tx, handle))
}

async fn run_start(config: &AppConfig, iterations: Option<usize>) -> anyhow::Result<()> {
    let (mut rx, shutdown_tx, handle) = spawn_worker(config).await?;
    let mut table = Table::new(config.report.header_every);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let report = rx.borrow_and_update().clone();
                println!("{}", table.next_lines(&report));
                if iterations.is_some_and(|n| table.rows() >= n) {
                    break;
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(());
    handle.await?;
    Ok(())
}

async fn run_replicate(config: &AppConfig) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = replicate::spawn(config.replicate.clone(), shutdown_rx);
    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    handle.await?;
    Ok(())
}

async fn run_serve(config: &AppConfig) -> anyhow::Result<()> {
    let (rx, shutdown_tx, handle) = spawn_worker(config).await?;
    let app = routes::app(rx);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Received shutdown signal");
        })
        .await?;

    let _ = shutdown_tx.send(());
    handle.await?;
    Ok(())
}

async fn run_export(config: &AppConfig, steps: u64, every: Option<u64>) -> anyhow::Result<()> {
    let mut settings = MonitorSettings::from(config.tracking.clone());
    if let Some(every) = every {
        settings.log_every_n_steps = every;
    }
    let mut monitor = StatsMonitor::new(
        settings,
        config.sources.clone(),
        config.sampling.session_options(),
        JsonLinesSink::new(std::io::stdout()),
    )?;

    let period = Duration::from_millis(config.sampling.interval_ms);
    let mut tick = interval_at(Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    // Baseline before the first measured step.
    monitor = tokio::task::spawn_blocking(move || {
        monitor.on_epoch_start();
        monitor.collect();
        monitor
    })
    .await?;
    for step in 0..steps {
        tokio::select! {
            _ = tick.tick() => {}
            _ = &mut shutdown => {
                tracing::info!(step, "Received shutdown signal");
                export_step(monitor, step, true).await?;
                return Ok(());
            }
        }
        monitor = export_step(monitor, step, step + 1 == steps).await?;
    }
    Ok(())
}

/// Runs one monitor step on the blocking pool and hands the monitor back.
async fn export_step<K>(
    mut monitor: StatsMonitor<K>,
    step: u64,
    should_stop: bool,
) -> anyhow::Result<StatsMonitor<K>>
where
    K: MetricsSink + Send + 'static,
{
    let (monitor, logged) = tokio::task::spawn_blocking(move || {
        let logged = monitor.on_batch_end(step, should_stop);
        (monitor, logged)
    })
    .await?;
    logged?;
    Ok(monitor)
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

// Background sampling worker: ticks the sessions on a fixed cadence and
// publishes the latest report on a watch channel (live table, HTTP export).

use tokio::sync::{oneshot, watch};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::Instrument;

use crate::models::MetricsReport;
use crate::session::{DiskSession, NetworkSession, TickOutcome};

/// Sessions, channels, and shutdown for the worker.
pub struct WorkerDeps {
    pub network: Option<NetworkSession>,
    pub disk: Option<DiskSession>,
    pub tx: watch::Sender<MetricsReport>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    pub sample_interval_ms: u64,
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}

/// Ticks every tracked session once and builds the report from their stats.
/// A failed tick is logged; the report then carries the last good values.
pub fn sample(network: Option<&mut NetworkSession>, disk: Option<&mut DiskSession>) -> MetricsReport {
    let network = network.map(|session| {
        match session.update() {
            Ok(TickOutcome::Updated) => {}
            Ok(TickOutcome::Skipped) => {
                tracing::debug!(operation = "update_network", "network tick skipped")
            }
            Err(e) => tracing::warn!(
                error = %e,
                operation = "update_network",
                "network stats failed"
            ),
        }
        session.reading()
    });
    let disk = disk.map(|session| {
        match session.update() {
            Ok(TickOutcome::Updated) => {}
            Ok(TickOutcome::Skipped) => {
                tracing::debug!(operation = "update_disk", "disk tick skipped")
            }
            Err(e) => tracing::warn!(
                error = %e,
                operation = "update_disk",
                "disk stats failed"
            ),
        }
        session.reading()
    });
    MetricsReport {
        timestamp: now_millis(),
        network,
        disk,
    }
}

/// Sessions handed back from a blocking sample, with the report they produced.
pub struct Sampled {
    pub network: Option<NetworkSession>,
    pub disk: Option<DiskSession>,
    pub report: MetricsReport,
}

/// Runs [`sample`] on the blocking pool; the counter reads are synchronous file I/O.
pub async fn sample_blocking(
    mut network: Option<NetworkSession>,
    mut disk: Option<DiskSession>,
) -> Result<Sampled, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || {
        let report = sample(network.as_mut(), disk.as_mut());
        Sampled {
            network,
            disk,
            report,
        }
    })
    .await
}

/// Spawns the sampling loop. The first sample is taken one full interval after
/// start so the first window is never shorter than the cadence.
pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        mut network,
        mut disk,
        tx,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig { sample_interval_ms } = config;

    let worker_span = tracing::debug_span!("worker", sample_interval_ms);
    tokio::spawn(
        async move {
            let period = Duration::from_millis(sample_interval_ms);
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        match sample_blocking(network.take(), disk.take()).await {
                            Ok(sampled) => {
                                network = sampled.network;
                                disk = sampled.disk;
                                tx.send_replace(sampled.report);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, operation = "sample", "sampling task failed");
                                break;
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Worker shutting down");
                        break;
                    }
                }
            }
        }
        .instrument(worker_span),
    )
}

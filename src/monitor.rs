// Training-loop adapter: polls one network and one disk session at step
// boundaries and forwards named metrics to a sink.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use crate::config::{SourcesConfig, TrackingConfig};
use crate::error::MetricsError;
use crate::session::{DiskSession, NetworkSession, SessionOptions};

pub const LOG_KEY_NETW_BYTES_RECV: &str = "network/recv_MB_per_sec";
pub const LOG_KEY_NETW_BYTES_SENT: &str = "network/sent_MB_per_sec";
pub const LOG_KEY_DISK_UTIL: &str = "disk/util%";
pub const LOG_KEY_DISK_MB_READ: &str = "disk/read_MB_per_sec";
pub const LOG_KEY_DISK_MB_WRIT: &str = "disk/writ_MB_per_sec";
pub const LOG_KEY_DISK_IO_READ: &str = "disk/io_read_count_per_sec";
pub const LOG_KEY_DISK_IO_WRIT: &str = "disk/io_writ_count_per_sec";

/// Metric name to latest value for one logged step.
pub type Metrics = BTreeMap<&'static str, f64>;

/// Destination for logged metrics (an experiment tracker, a log, a file...).
pub trait MetricsSink {
    fn log_metrics(&mut self, metrics: &Metrics, step: u64) -> anyhow::Result<()>;
}

impl<T: MetricsSink + ?Sized> MetricsSink for &mut T {
    fn log_metrics(&mut self, metrics: &Metrics, step: u64) -> anyhow::Result<()> {
        (**self).log_metrics(metrics, step)
    }
}

impl<T: MetricsSink + ?Sized> MetricsSink for Box<T> {
    fn log_metrics(&mut self, metrics: &Metrics, step: u64) -> anyhow::Result<()> {
        (**self).log_metrics(metrics, step)
    }
}

/// Emits every logged step as one structured log event.
#[derive(Debug, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn log_metrics(&mut self, metrics: &Metrics, step: u64) -> anyhow::Result<()> {
        tracing::info!(step, metrics = ?metrics, "io metrics");
        Ok(())
    }
}

#[derive(Serialize)]
struct StepRecord<'a> {
    step: u64,
    metrics: &'a Metrics,
}

/// Writes `{"step": n, "metrics": {...}}` per logged step, one JSON object per line.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsSink for JsonLinesSink<W> {
    fn log_metrics(&mut self, metrics: &Metrics, step: u64) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, &StepRecord { step, metrics })?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Logs on every `every`-th step (counting from 1) and always when the run stops.
pub fn should_log(step: u64, every: u64, should_stop: bool) -> bool {
    should_stop || (every > 0 && (step + 1) % every == 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub track_network: bool,
    pub track_disk: bool,
    pub log_every_n_steps: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        TrackingConfig::default().into()
    }
}

impl From<TrackingConfig> for MonitorSettings {
    fn from(c: TrackingConfig) -> Self {
        Self {
            track_network: c.track_network,
            track_disk: c.track_disk,
            log_every_n_steps: c.log_every_n_steps,
        }
    }
}

/// Step-driven metrics logger.
///
/// Sessions are created on first collection and dropped at each epoch start,
/// so every epoch measures from a fresh baseline; the collection that creates
/// a session only takes its baseline and reports zeros. A section whose session
/// cannot be created or updated is left out of that step's metrics (with a
/// warning) and retried on the next step.
pub struct StatsMonitor<K> {
    settings: MonitorSettings,
    sources: SourcesConfig,
    options: SessionOptions,
    sink: K,
    network: Option<NetworkSession>,
    disk: Option<DiskSession>,
}

impl<K: MetricsSink> StatsMonitor<K> {
    pub fn new(
        settings: MonitorSettings,
        sources: SourcesConfig,
        options: SessionOptions,
        sink: K,
    ) -> Result<Self, MetricsError> {
        if settings.log_every_n_steps == 0 {
            return Err(MetricsError::Misconfigured(
                "log_every_n_steps must be > 0".into(),
            ));
        }
        Ok(Self {
            settings,
            sources,
            options,
            sink,
            network: None,
            disk: None,
        })
    }

    pub fn on_epoch_start(&mut self) {
        self.network = None;
        self.disk = None;
    }

    /// Returns whether this step was logged.
    pub fn on_batch_start(&mut self, step: u64, should_stop: bool) -> anyhow::Result<bool> {
        self.log_step(step, should_stop)
    }

    pub fn on_batch_end(&mut self, step: u64, should_stop: bool) -> anyhow::Result<bool> {
        self.log_step(step, should_stop)
    }

    fn log_step(&mut self, step: u64, should_stop: bool) -> anyhow::Result<bool> {
        if !should_log(step, self.settings.log_every_n_steps, should_stop) {
            return Ok(false);
        }
        let metrics = self.collect();
        self.sink.log_metrics(&metrics, step)?;
        Ok(true)
    }

    /// Updates the tracked sessions and returns their latest values.
    pub fn collect(&mut self) -> Metrics {
        let mut metrics = Metrics::new();
        if self.settings.track_network {
            if let Err(e) = self.collect_network(&mut metrics) {
                tracing::warn!(error = %e, operation = "collect_network", "network metrics unavailable");
            }
        }
        if self.settings.track_disk {
            if let Err(e) = self.collect_disk(&mut metrics) {
                tracing::warn!(error = %e, operation = "collect_disk", "disk metrics unavailable");
            }
        }
        metrics
    }

    fn collect_network(&mut self, metrics: &mut Metrics) -> Result<(), MetricsError> {
        let (session, fresh) = match self.network.take() {
            Some(s) => (s, false),
            None => (
                NetworkSession::from_path(&self.sources.net_dev, self.options)?,
                true,
            ),
        };
        let session = self.network.insert(session);
        if !fresh {
            session.update()?;
        }
        metrics.insert(LOG_KEY_NETW_BYTES_RECV, session.recv().last());
        metrics.insert(LOG_KEY_NETW_BYTES_SENT, session.sent().last());
        Ok(())
    }

    fn collect_disk(&mut self, metrics: &mut Metrics) -> Result<(), MetricsError> {
        let (session, fresh) = match self.disk.take() {
            Some(s) => (s, false),
            None => (
                DiskSession::from_paths(
                    &self.sources.diskstats,
                    &self.sources.block_devices,
                    self.options,
                )?,
                true,
            ),
        };
        let session = self.disk.insert(session);
        if !fresh {
            session.update()?;
        }
        metrics.insert(LOG_KEY_DISK_UTIL, session.util().last());
        metrics.insert(LOG_KEY_DISK_MB_READ, session.read_mb().last());
        metrics.insert(LOG_KEY_DISK_MB_WRIT, session.writ_mb().last());
        metrics.insert(LOG_KEY_DISK_IO_READ, session.read_ops().last());
        metrics.insert(LOG_KEY_DISK_IO_WRIT, session.writ_ops().last());
        Ok(())
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }
}

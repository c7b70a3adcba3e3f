use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::procfs::{DEFAULT_BLOCK_DIR, DEFAULT_DISKSTATS_PATH, DEFAULT_NET_DEV_PATH};
use crate::rates::MissingDevicePolicy;
use crate::session::SessionOptions;
use crate::stats::DEFAULT_SMOOTHING_FACTOR;

/// Looked up in the working directory when neither `--config` nor `CONFIG_FILE` is given.
pub const DEFAULT_CONFIG_FILE: &str = "iometrics.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampling: SamplingConfig,
    pub sources: SourcesConfig,
    pub tracking: TrackingConfig,
    pub report: ReportConfig,
    pub server: ServerConfig,
    pub replicate: ReplicateConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_ms: u64,
    /// Weight on history when blending a new sample into the smoothed value (0..=1).
    pub smoothing_factor: f64,
    /// `"fail"` aborts a tick when a device vanishes; `"skip"` leaves it out.
    pub missing_device: MissingDevicePolicy,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            missing_device: MissingDevicePolicy::Fail,
        }
    }
}

impl SamplingConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            smoothing_factor: self.smoothing_factor,
            missing_device: self.missing_device,
        }
    }
}

/// Where the kernel counters are read from. Point `net_dev` at a replicated
/// copy when running inside a container.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub net_dev: PathBuf,
    pub diskstats: PathBuf,
    pub block_devices: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            net_dev: DEFAULT_NET_DEV_PATH.into(),
            diskstats: DEFAULT_DISKSTATS_PATH.into(),
            block_devices: DEFAULT_BLOCK_DIR.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub track_network: bool,
    pub track_disk: bool,
    /// Metric export logs on every n-th step (and on the final step).
    pub log_every_n_steps: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            track_network: true,
            track_disk: true,
            log_every_n_steps: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rows printed between header repeats in the live table.
    pub header_every: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { header_every: 15 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8090,
            host: "127.0.0.1".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplicateConfig {
    pub source: PathBuf,
    pub target: PathBuf,
    pub interval_ms: u64,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_NET_DEV_PATH.into(),
            target: "/tmp/proc_net_dev".into(),
            interval_ms: 500,
        }
    }
}

impl AppConfig {
    /// Loads from `explicit`, else `CONFIG_FILE`, else `iometrics.toml` when it
    /// exists, else built-in defaults. An explicitly named file must exist.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match std::env::var("CONFIG_FILE") {
                Ok(p) => PathBuf::from(p),
                Err(_) => {
                    let fallback = Path::new(DEFAULT_CONFIG_FILE);
                    if !fallback.exists() {
                        tracing::debug!("no config file; using defaults");
                        let config = Self::default();
                        config.validate()?;
                        return Ok(config);
                    }
                    fallback.to_path_buf()
                }
            },
        };
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("config {}: {}", path.display(), e))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.sampling.interval_ms > 0,
            "sampling.interval_ms must be > 0, got {}",
            self.sampling.interval_ms
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.sampling.smoothing_factor),
            "sampling.smoothing_factor must be within 0..=1, got {}",
            self.sampling.smoothing_factor
        );
        anyhow::ensure!(
            !self.sources.net_dev.as_os_str().is_empty(),
            "sources.net_dev must be non-empty"
        );
        anyhow::ensure!(
            !self.sources.diskstats.as_os_str().is_empty(),
            "sources.diskstats must be non-empty"
        );
        anyhow::ensure!(
            !self.sources.block_devices.as_os_str().is_empty(),
            "sources.block_devices must be non-empty"
        );
        anyhow::ensure!(
            self.tracking.log_every_n_steps > 0,
            "tracking.log_every_n_steps must be > 0, got {}",
            self.tracking.log_every_n_steps
        );
        anyhow::ensure!(
            self.report.header_every > 0,
            "report.header_every must be > 0, got {}",
            self.report.header_every
        );
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            self.replicate.interval_ms > 0,
            "replicate.interval_ms must be > 0, got {}",
            self.replicate.interval_ms
        );
        anyhow::ensure!(
            self.replicate.source != self.replicate.target,
            "replicate.source and replicate.target must differ"
        );
        Ok(())
    }
}

// Disk session: read/write MB/s, read/write ops/s and average utilization

use std::path::Path;
use std::time::Instant;

use tracing::instrument;

use super::{SessionOptions, TickOutcome};
use crate::error::MetricsError;
use crate::models::{DiskCounters, DiskRates, DiskReading, Snapshot};
use crate::procfs::{ProcDiskStats, SnapshotSource, non_virtual_devices};
use crate::rates::disk_rates;
use crate::stats::RunningStat;

#[derive(Debug)]
pub struct DiskSession<S = ProcDiskStats> {
    source: S,
    options: SessionOptions,
    previous: Snapshot<DiskCounters>,
    previous_at: Instant,
    read_mb: RunningStat,
    writ_mb: RunningStat,
    read_ops: RunningStat,
    writ_ops: RunningStat,
    util: RunningStat,
    rates: DiskRates,
}

impl DiskSession<ProcDiskStats> {
    /// Session over the non-virtual devices listed under `block_dir`, read from
    /// a `/proc/diskstats`-formatted file. The device set is fixed from here on.
    pub fn from_paths(
        diskstats: impl AsRef<Path>,
        block_dir: impl AsRef<Path>,
        options: SessionOptions,
    ) -> Result<Self, MetricsError> {
        let devices = non_virtual_devices(block_dir)?;
        if devices.is_empty() {
            tracing::warn!("no non-virtual block devices found; disk ticks will fail");
        }
        Self::new(ProcDiskStats::new(diskstats.as_ref(), devices), options)
    }
}

impl<S> DiskSession<S>
where
    S: SnapshotSource<Counters = DiskCounters>,
{
    pub fn new(source: S, options: SessionOptions) -> Result<Self, MetricsError> {
        Self::starting_at(source, options, Instant::now())
    }

    pub fn starting_at(
        mut source: S,
        options: SessionOptions,
        now: Instant,
    ) -> Result<Self, MetricsError> {
        let previous = source.read_snapshot()?;
        let stat = || RunningStat::new(options.smoothing_factor);
        Ok(Self {
            source,
            options,
            previous,
            previous_at: now,
            read_mb: stat(),
            writ_mb: stat(),
            read_ops: stat(),
            writ_ops: stat(),
            util: stat(),
            rates: DiskRates::default(),
        })
    }

    pub fn update(&mut self) -> Result<TickOutcome, MetricsError> {
        self.update_at(Instant::now())
    }

    /// Samples the counters as of `now`. There is no minimum spacing; only a
    /// zero-length window is skipped.
    #[instrument(level = "debug", skip_all, fields(session = "disk"))]
    pub fn update_at(&mut self, now: Instant) -> Result<TickOutcome, MetricsError> {
        let elapsed_secs = now.saturating_duration_since(self.previous_at).as_secs_f64();
        if elapsed_secs <= 0.0 {
            return Ok(TickOutcome::Skipped);
        }

        let current = self.source.read_snapshot()?;
        let result = disk_rates(
            &self.previous,
            &current,
            elapsed_secs,
            self.options.missing_device,
        );
        self.previous = current;
        self.previous_at = now;
        let rates = result?;

        self.read_mb.update(rates.read_mb_per_sec);
        self.writ_mb.update(rates.writ_mb_per_sec);
        self.read_ops.update(rates.read_ops_per_sec);
        self.writ_ops.update(rates.writ_ops_per_sec);
        self.util.update(rates.util_percent);
        tracing::debug!(
            elapsed_secs,
            util_percent = rates.util_percent,
            read_mb_per_sec = rates.read_mb_per_sec,
            writ_mb_per_sec = rates.writ_mb_per_sec,
            devices = rates.devices.len(),
            "disk tick"
        );
        self.rates = rates;
        Ok(TickOutcome::Updated)
    }

    pub fn reset(&mut self) {
        self.read_mb.reset();
        self.writ_mb.reset();
        self.read_ops.reset();
        self.writ_ops.reset();
        self.util.reset();
    }

    pub fn read_mb(&self) -> &RunningStat {
        &self.read_mb
    }

    pub fn writ_mb(&self) -> &RunningStat {
        &self.writ_mb
    }

    pub fn read_ops(&self) -> &RunningStat {
        &self.read_ops
    }

    pub fn writ_ops(&self) -> &RunningStat {
        &self.writ_ops
    }

    pub fn util(&self) -> &RunningStat {
        &self.util
    }

    pub fn rates(&self) -> &DiskRates {
        &self.rates
    }

    pub fn reading(&self) -> DiskReading {
        DiskReading {
            util_percent: (&self.util).into(),
            read_mb_per_sec: (&self.read_mb).into(),
            writ_mb_per_sec: (&self.writ_mb).into(),
            read_ops_per_sec: (&self.read_ops).into(),
            writ_ops_per_sec: (&self.writ_ops).into(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

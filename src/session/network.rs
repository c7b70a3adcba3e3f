// Network session: aggregate received/sent MB/s over all tracked interfaces

use std::path::PathBuf;
use std::time::Instant;

use tracing::instrument;

use super::{SessionOptions, TickOutcome};
use crate::error::MetricsError;
use crate::models::{InterfaceCounters, NetworkRates, NetworkReading, Snapshot};
use crate::procfs::{ProcNetDev, SnapshotSource};
use crate::rates::{MIN_NETWORK_INTERVAL_SECS, network_rates};
use crate::stats::RunningStat;

#[derive(Debug)]
pub struct NetworkSession<S = ProcNetDev> {
    source: S,
    options: SessionOptions,
    previous: Snapshot<InterfaceCounters>,
    previous_at: Instant,
    recv: RunningStat,
    sent: RunningStat,
    rates: NetworkRates,
}

impl NetworkSession<ProcNetDev> {
    /// Session over a `/proc/net/dev`-formatted file.
    pub fn from_path(path: impl Into<PathBuf>, options: SessionOptions) -> Result<Self, MetricsError> {
        Self::new(ProcNetDev::new(path), options)
    }
}

impl<S> NetworkSession<S>
where
    S: SnapshotSource<Counters = InterfaceCounters>,
{
    /// Takes the baseline snapshot now.
    pub fn new(source: S, options: SessionOptions) -> Result<Self, MetricsError> {
        Self::starting_at(source, options, Instant::now())
    }

    /// Takes the baseline snapshot and stamps it with `now`.
    pub fn starting_at(
        mut source: S,
        options: SessionOptions,
        now: Instant,
    ) -> Result<Self, MetricsError> {
        let previous = source.read_snapshot()?;
        Ok(Self {
            source,
            options,
            previous,
            previous_at: now,
            recv: RunningStat::new(options.smoothing_factor),
            sent: RunningStat::new(options.smoothing_factor),
            rates: NetworkRates::default(),
        })
    }

    pub fn update(&mut self) -> Result<TickOutcome, MetricsError> {
        self.update_at(Instant::now())
    }

    /// Samples the counters as of `now` and folds the rates into the running stats.
    ///
    /// Returns `Skipped` without touching anything when less than
    /// [`MIN_NETWORK_INTERVAL_SECS`] has passed since the last sample.
    #[instrument(level = "debug", skip_all, fields(session = "network"))]
    pub fn update_at(&mut self, now: Instant) -> Result<TickOutcome, MetricsError> {
        let elapsed_secs = now.saturating_duration_since(self.previous_at).as_secs_f64();
        if elapsed_secs < MIN_NETWORK_INTERVAL_SECS {
            tracing::trace!(elapsed_secs, "network sample too soon; skipped");
            return Ok(TickOutcome::Skipped);
        }

        let current = self.source.read_snapshot()?;
        let result = network_rates(
            &self.previous,
            &current,
            elapsed_secs,
            self.options.missing_device,
        );
        // The new snapshot is valid even when the rates are not, so the next
        // tick measures from here.
        self.previous = current;
        self.previous_at = now;
        let rates = result?;

        self.recv.update(rates.recv_mb_per_sec);
        self.sent.update(rates.sent_mb_per_sec);
        tracing::debug!(
            elapsed_secs,
            recv_mb_per_sec = rates.recv_mb_per_sec,
            sent_mb_per_sec = rates.sent_mb_per_sec,
            interfaces = rates.interfaces.len(),
            "network tick"
        );
        self.rates = rates;
        Ok(TickOutcome::Updated)
    }

    /// Zeroes the running stats; the baseline snapshot is kept.
    pub fn reset(&mut self) {
        self.recv.reset();
        self.sent.reset();
    }

    pub fn recv(&self) -> &RunningStat {
        &self.recv
    }

    pub fn sent(&self) -> &RunningStat {
        &self.sent
    }

    /// Rates of the last successful tick, with the per-interface breakdown.
    pub fn rates(&self) -> &NetworkRates {
        &self.rates
    }

    pub fn reading(&self) -> NetworkReading {
        NetworkReading {
            recv_mb_per_sec: (&self.recv).into(),
            sent_mb_per_sec: (&self.sent).into(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

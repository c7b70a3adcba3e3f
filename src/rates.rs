// Delta-rate computers: two counter snapshots plus elapsed time in, per-second rates out.
// Counter decreases (driver artifacts, resets) clamp to a zero delta, never a negative rate.

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;
use crate::models::{
    DeviceRate, DiskCounters, DiskRates, InterfaceCounters, InterfaceRate, NetworkRates, Snapshot,
};

/// `/proc/net/dev` refreshes at roughly one-second granularity; shorter windows
/// read the same counters twice. Callers must not compute network rates below this.
pub const MIN_NETWORK_INTERVAL_SECS: f64 = 0.99;

const BYTES_PER_MB: f64 = 1e6;
/// diskstats sector fields are always in 512-byte units.
const SECTOR_BYTES: f64 = 512.0;

/// What to do when a device from the previous snapshot is absent from the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDevicePolicy {
    /// Abort the whole tick with [`MetricsError::MissingDevice`].
    #[default]
    Fail,
    /// Leave the device out of this tick's aggregates.
    Skip,
}

fn lookup<'a, C>(
    current: &'a Snapshot<C>,
    name: &str,
    policy: MissingDevicePolicy,
) -> Result<Option<&'a C>, MetricsError> {
    match (current.get(name), policy) {
        (Some(counters), _) => Ok(Some(counters)),
        (None, MissingDevicePolicy::Fail) => Err(MetricsError::MissingDevice(name.to_string())),
        (None, MissingDevicePolicy::Skip) => {
            tracing::debug!(device = name, "device disappeared; left out of this tick");
            Ok(None)
        }
    }
}

fn delta(current: u64, previous: u64) -> f64 {
    current.saturating_sub(previous) as f64
}

/// Received and sent MB/s summed over every interface of `previous`.
///
/// Interfaces that only appear in `current` are not counted until the next tick.
pub fn network_rates(
    previous: &Snapshot<InterfaceCounters>,
    current: &Snapshot<InterfaceCounters>,
    elapsed_secs: f64,
    policy: MissingDevicePolicy,
) -> Result<NetworkRates, MetricsError> {
    let mut rates = NetworkRates::default();

    for (name, prev) in previous {
        let Some(curr) = lookup(current, name, policy)? else {
            continue;
        };
        let rate = InterfaceRate {
            recv_mb_per_sec: delta(curr.bytes_recv, prev.bytes_recv) / BYTES_PER_MB / elapsed_secs,
            sent_mb_per_sec: delta(curr.bytes_sent, prev.bytes_sent) / BYTES_PER_MB / elapsed_secs,
        };
        rates.recv_mb_per_sec += rate.recv_mb_per_sec;
        rates.sent_mb_per_sec += rate.sent_mb_per_sec;
        rates.interfaces.insert(name.clone(), rate);
    }

    Ok(rates)
}

fn device_rate(prev: &DiskCounters, curr: &DiskCounters, elapsed_secs: f64) -> DeviceRate {
    let busy_percent = 100.0 * delta(curr.busy_ms, prev.busy_ms) / (elapsed_secs * 1000.0);
    DeviceRate {
        read_mb_per_sec: delta(curr.sectors_read, prev.sectors_read) * SECTOR_BYTES
            / BYTES_PER_MB
            / elapsed_secs,
        writ_mb_per_sec: delta(curr.sectors_written, prev.sectors_written) * SECTOR_BYTES
            / BYTES_PER_MB
            / elapsed_secs,
        read_ops_per_sec: delta(curr.reads, prev.reads) / elapsed_secs,
        writ_ops_per_sec: delta(curr.writes, prev.writes) / elapsed_secs,
        util_percent: busy_percent.min(100.0),
    }
}

/// Disk throughput and op rates summed over devices, utilization averaged over them.
///
/// Fails with [`MetricsError::EmptyDeviceSet`] when no device contributes, rather
/// than dividing by zero.
pub fn disk_rates(
    previous: &Snapshot<DiskCounters>,
    current: &Snapshot<DiskCounters>,
    elapsed_secs: f64,
    policy: MissingDevicePolicy,
) -> Result<DiskRates, MetricsError> {
    let mut rates = DiskRates::default();
    let mut util_sum = 0.0;

    for (name, prev) in previous {
        let Some(curr) = lookup(current, name, policy)? else {
            continue;
        };
        let rate = device_rate(prev, curr, elapsed_secs);
        rates.read_mb_per_sec += rate.read_mb_per_sec;
        rates.writ_mb_per_sec += rate.writ_mb_per_sec;
        rates.read_ops_per_sec += rate.read_ops_per_sec;
        rates.writ_ops_per_sec += rate.writ_ops_per_sec;
        util_sum += rate.util_percent;
        rates.devices.insert(name.clone(), rate);
    }

    if rates.devices.is_empty() {
        return Err(MetricsError::EmptyDeviceSet);
    }
    rates.util_percent = util_sum / rates.devices.len() as f64;

    Ok(rates)
}

// Block device counters and rates

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cumulative counters of one block device since kernel boot.
///
/// Sector counts are in 512-byte units regardless of the device's real sector size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskCounters {
    pub sectors_read: u64,
    pub sectors_written: u64,
    pub reads: u64,
    pub writes: u64,
    pub busy_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRate {
    pub read_mb_per_sec: f64,
    pub writ_mb_per_sec: f64,
    pub read_ops_per_sec: f64,
    pub writ_ops_per_sec: f64,
    pub util_percent: f64,
}

/// One tick of disk rates. Throughput and op rates are sums over devices;
/// `util_percent` is the average busy percentage across devices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskRates {
    pub read_mb_per_sec: f64,
    pub writ_mb_per_sec: f64,
    pub read_ops_per_sec: f64,
    pub writ_ops_per_sec: f64,
    pub util_percent: f64,
    pub devices: BTreeMap<String, DeviceRate>,
}

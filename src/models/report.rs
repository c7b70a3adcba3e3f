// Reported readings (wire format for the HTTP export and the live table)

use serde::{Deserialize, Serialize};

use crate::stats::RunningStat;

/// Latest value, running mean and smoothed value of one quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub val: f64,
    pub avg: f64,
    pub smoothed: f64,
}

impl From<&RunningStat> for Reading {
    fn from(stat: &RunningStat) -> Self {
        Self {
            val: stat.last(),
            avg: stat.mean(),
            smoothed: stat.smoothed(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkReading {
    pub recv_mb_per_sec: Reading,
    pub sent_mb_per_sec: Reading,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskReading {
    pub util_percent: Reading,
    pub read_mb_per_sec: Reading,
    pub writ_mb_per_sec: Reading,
    pub read_ops_per_sec: Reading,
    pub writ_ops_per_sec: Reading,
}

/// Everything one sampling tick publishes. A section is `None` when its tracking is off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    /// Milliseconds since the Unix epoch; 0 before the first tick.
    pub timestamp: u64,
    pub network: Option<NetworkReading>,
    pub disk: Option<DiskReading>,
}

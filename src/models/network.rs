// Network interface counters and rates

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cumulative byte counters of one interface since kernel boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceCounters {
    pub bytes_recv: u64,
    pub bytes_sent: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRate {
    pub recv_mb_per_sec: f64,
    pub sent_mb_per_sec: f64,
}

/// One tick of network rates: the sum over all tracked interfaces plus the breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRates {
    pub recv_mb_per_sec: f64,
    pub sent_mb_per_sec: f64,
    pub interfaces: BTreeMap<String, InterfaceRate>,
}

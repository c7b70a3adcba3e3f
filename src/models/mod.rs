// Domain models: raw counter snapshots, derived rates and reported readings

mod disk;
mod network;
mod report;

use std::collections::HashMap;

pub use disk::{DeviceRate, DiskCounters, DiskRates};
pub use network::{InterfaceCounters, InterfaceRate, NetworkRates};
pub use report::{DiskReading, MetricsReport, NetworkReading, Reading};

/// Device or interface name mapped to its cumulative counters, read at one instant.
pub type Snapshot<C> = HashMap<String, C>;

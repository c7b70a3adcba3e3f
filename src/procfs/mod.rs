// Kernel counter sources: /proc/net/dev, /proc/diskstats and /sys/block

mod block;
mod diskstats;
mod net_dev;

use std::path::Path;

use crate::error::MetricsError;
use crate::models::Snapshot;

pub use block::{DEFAULT_BLOCK_DIR, non_virtual_devices};
pub use diskstats::{DEFAULT_DISKSTATS_PATH, ProcDiskStats, parse_diskstats};
pub use net_dev::{DEFAULT_NET_DEV_PATH, ProcNetDev, is_ignored_interface, parse_net_dev};

/// Produces a fresh snapshot of cumulative counters on each call.
pub trait SnapshotSource {
    type Counters;

    fn read_snapshot(&mut self) -> Result<Snapshot<Self::Counters>, MetricsError>;
}

/// Parses one counter field. Negative values (seen from some drivers) read as zero.
fn parse_counter(field: &str) -> Option<u64> {
    match field.parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => field.parse::<i64>().ok().map(|v| v.max(0) as u64),
    }
}

fn counter_at(fields: &[&str], idx: usize, path: &Path, line: usize) -> Result<u64, MetricsError> {
    let raw = fields.get(idx).ok_or_else(|| malformed(path, line, format!("missing field {idx}")))?;
    parse_counter(raw)
        .ok_or_else(|| malformed(path, line, format!("field {idx} is not a counter: {raw:?}")))
}

fn malformed(path: &Path, line: usize, reason: impl Into<String>) -> MetricsError {
    MetricsError::Malformed {
        path: path.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

// /proc/diskstats: per-device sector, operation and busy-time counters

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::{SnapshotSource, counter_at, malformed};
use crate::error::MetricsError;
use crate::models::{DiskCounters, Snapshot};

pub const DEFAULT_DISKSTATS_PATH: &str = "/proc/diskstats";

const NAME_FIELD: usize = 2;
const READS_FIELD: usize = 3;
const SECTORS_READ_FIELD: usize = 5;
const WRITES_FIELD: usize = 7;
const SECTORS_WRITTEN_FIELD: usize = 9;
const BUSY_MS_FIELD: usize = 12;

/// Parses `/proc/diskstats` content, keeping only the listed devices.
///
/// Format: major minor name reads r_merged r_sectors r_time writes w_merged w_sectors w_time io_pending io_time w_io_time [discards ...]
pub fn parse_diskstats(
    content: &str,
    path: &Path,
    devices: &BTreeSet<String>,
) -> Result<Snapshot<DiskCounters>, MetricsError> {
    let mut snapshot = Snapshot::new();

    for (idx, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let name = fields
            .get(NAME_FIELD)
            .ok_or_else(|| malformed(path, line_no, "missing device name"))?;
        if !devices.contains(*name) {
            continue;
        }
        snapshot.insert(
            name.to_string(),
            DiskCounters {
                sectors_read: counter_at(&fields, SECTORS_READ_FIELD, path, line_no)?,
                sectors_written: counter_at(&fields, SECTORS_WRITTEN_FIELD, path, line_no)?,
                reads: counter_at(&fields, READS_FIELD, path, line_no)?,
                writes: counter_at(&fields, WRITES_FIELD, path, line_no)?,
                busy_ms: counter_at(&fields, BUSY_MS_FIELD, path, line_no)?,
            },
        );
    }

    Ok(snapshot)
}

/// Reads counters for a fixed set of block devices from a `/proc/diskstats`-formatted file.
///
/// The device set is decided once (see [`super::non_virtual_devices`]); devices
/// attached later are not picked up.
#[derive(Debug, Clone)]
pub struct ProcDiskStats {
    path: PathBuf,
    devices: BTreeSet<String>,
}

impl ProcDiskStats {
    pub fn new(path: impl Into<PathBuf>, devices: BTreeSet<String>) -> Self {
        Self {
            path: path.into(),
            devices,
        }
    }

    pub fn devices(&self) -> &BTreeSet<String> {
        &self.devices
    }
}

impl SnapshotSource for ProcDiskStats {
    type Counters = DiskCounters;

    fn read_snapshot(&mut self) -> Result<Snapshot<DiskCounters>, MetricsError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| MetricsError::read(&self.path, e))?;
        parse_diskstats(&content, &self.path, &self.devices)
    }
}

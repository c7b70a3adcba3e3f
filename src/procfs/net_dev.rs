// /proc/net/dev: per-interface byte counters

use std::path::{Path, PathBuf};

use super::{SnapshotSource, counter_at, malformed};
use crate::error::MetricsError;
use crate::models::{InterfaceCounters, Snapshot};

pub const DEFAULT_NET_DEV_PATH: &str = "/proc/net/dev";

/// The table starts with two header lines ("Inter-|..." and " face |...").
const HEADER_LINES: usize = 2;

const RECV_BYTES_FIELD: usize = 0;
const SENT_BYTES_FIELD: usize = 8;

/// Interfaces whose traffic would be double counted or is host-internal:
/// loopback, tunnels, `face*`, bonds and VLAN sub-interfaces (`eth0.100`).
pub fn is_ignored_interface(name: &str) -> bool {
    if name == "lo" {
        return true;
    }
    let prefixed = ["tun", "face", "bond"]
        .iter()
        .any(|prefix| name.len() > prefix.len() && name.starts_with(prefix));
    prefixed || is_vlan_suffixed(name)
}

fn is_vlan_suffixed(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((base, id)) => {
            !base.is_empty() && !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Parses `/proc/net/dev` content, skipping the header and ignored interfaces.
///
/// Format:
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
///   eth0: 9876543     5678    1    2    0     0          0        10 87654321     4321    3    4    0     0       0          0
pub fn parse_net_dev(
    content: &str,
    path: &Path,
) -> Result<Snapshot<InterfaceCounters>, MetricsError> {
    let mut snapshot = Snapshot::new();

    for (idx, line) in content.lines().enumerate().skip(HEADER_LINES) {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        // Large counters are glued to the colon ("eth0:123456"), so split on it.
        let (name, values) = line
            .split_once(':')
            .ok_or_else(|| malformed(path, line_no, "missing ':' after interface name"))?;
        let name = name.trim();
        if is_ignored_interface(name) {
            continue;
        }
        let fields: Vec<&str> = values.split_whitespace().collect();
        snapshot.insert(
            name.to_string(),
            InterfaceCounters {
                bytes_recv: counter_at(&fields, RECV_BYTES_FIELD, path, line_no)?,
                bytes_sent: counter_at(&fields, SENT_BYTES_FIELD, path, line_no)?,
            },
        );
    }

    Ok(snapshot)
}

/// Reads interface counters from a `/proc/net/dev`-formatted file.
///
/// The path is configurable so a container can read a host copy of the file.
#[derive(Debug, Clone)]
pub struct ProcNetDev {
    path: PathBuf,
}

impl Default for ProcNetDev {
    fn default() -> Self {
        Self::new(DEFAULT_NET_DEV_PATH)
    }
}

impl ProcNetDev {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for ProcNetDev {
    type Counters = InterfaceCounters;

    fn read_snapshot(&mut self) -> Result<Snapshot<InterfaceCounters>, MetricsError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| MetricsError::read(&self.path, e))?;
        parse_net_dev(&content, &self.path)
    }
}

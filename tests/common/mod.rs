// Shared test helpers: counter-file fixtures and scripted snapshot sources

#![allow(dead_code)]

use iometrics::MetricsError;
use iometrics::models::{DiskCounters, InterfaceCounters, Snapshot};
use iometrics::procfs::SnapshotSource;
use std::collections::VecDeque;
use std::path::PathBuf;

const NET_DEV_HEADER: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
";

/// `/proc/net/dev` content with the given (name, bytes received, bytes sent) rows.
pub fn net_dev_content(rows: &[(&str, u64, u64)]) -> String {
    let mut out = NET_DEV_HEADER.to_string();
    for (name, recv, sent) in rows {
        out.push_str(&format!(
            "{name:>6}: {recv} 10 0 0 0 0 0 0 {sent} 20 0 0 0 0 0 0\n"
        ));
    }
    out
}

/// `/proc/diskstats` content with the given devices.
pub fn diskstats_content(rows: &[(&str, DiskCounters)]) -> String {
    let mut out = String::new();
    for (minor, (name, c)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "   8 {minor} {name} {} 0 {} 0 {} 0 {} 0 0 {} 0 0 0 0 0\n",
            c.reads, c.sectors_read, c.writes, c.sectors_written, c.busy_ms
        ));
    }
    out
}

pub fn disk(busy_ms: u64) -> DiskCounters {
    DiskCounters {
        busy_ms,
        ..Default::default()
    }
}

pub fn net_snapshot(rows: &[(&str, u64, u64)]) -> Snapshot<InterfaceCounters> {
    rows.iter()
        .map(|(name, recv, sent)| {
            (
                name.to_string(),
                InterfaceCounters {
                    bytes_recv: *recv,
                    bytes_sent: *sent,
                },
            )
        })
        .collect()
}

pub fn disk_snapshot(rows: &[(&str, DiskCounters)]) -> Snapshot<DiskCounters> {
    rows.iter().map(|(name, c)| (name.to_string(), *c)).collect()
}

/// Temp directory holding a fake `/proc/net/dev`, `/proc/diskstats` and `/sys/block`.
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub net_dev: PathBuf,
    pub diskstats: PathBuf,
    pub block_devices: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        let net_dev = dir.path().join("net_dev");
        let diskstats = dir.path().join("diskstats");
        let block_devices = dir.path().join("block");
        std::fs::create_dir(&block_devices).unwrap();
        std::fs::write(&net_dev, net_dev_content(&[])).unwrap();
        std::fs::write(&diskstats, "").unwrap();
        Self {
            dir,
            net_dev,
            diskstats,
            block_devices,
        }
    }

    pub fn write_net(&self, rows: &[(&str, u64, u64)]) {
        std::fs::write(&self.net_dev, net_dev_content(rows)).unwrap();
    }

    pub fn write_disks(&self, rows: &[(&str, DiskCounters)]) {
        std::fs::write(&self.diskstats, diskstats_content(rows)).unwrap();
    }

    /// Adds a `/sys/block` entry; virtual devices link into `devices/virtual`.
    #[cfg(unix)]
    pub fn add_block_device(&self, name: &str, is_virtual: bool) {
        let target = if is_virtual {
            format!("../devices/virtual/block/{name}")
        } else {
            format!("../devices/pci0000:00/0000:00:1f.2/ata1/host0/block/{name}")
        };
        std::os::unix::fs::symlink(target, self.block_devices.join(name)).unwrap();
    }

    pub fn sources(&self) -> iometrics::config::SourcesConfig {
        iometrics::config::SourcesConfig {
            net_dev: self.net_dev.clone(),
            diskstats: self.diskstats.clone(),
            block_devices: self.block_devices.clone(),
        }
    }
}

/// Hands out pre-built snapshots (or errors) in order.
pub struct Scripted<C> {
    snapshots: VecDeque<Result<Snapshot<C>, MetricsError>>,
}

impl<C> Scripted<C> {
    pub fn new(snapshots: Vec<Result<Snapshot<C>, MetricsError>>) -> Self {
        Self {
            snapshots: snapshots.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.snapshots.len()
    }
}

impl<C> SnapshotSource for Scripted<C> {
    type Counters = C;

    fn read_snapshot(&mut self) -> Result<Snapshot<C>, MetricsError> {
        self.snapshots.pop_front().unwrap_or_else(|| {
            Err(MetricsError::SnapshotRead {
                path: PathBuf::from("scripted"),
                source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "script exhausted"),
            })
        })
    }
}

pub fn read_error() -> MetricsError {
    MetricsError::SnapshotRead {
        path: PathBuf::from("counters"),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
    }
}

// /sys/block: which block devices are worth measuring

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::MetricsError;

pub const DEFAULT_BLOCK_DIR: &str = "/sys/block";

/// Lists block devices whose entry is a symlink not pointing into a `virtual`
/// subtree, which leaves out loop, ram and device-mapper devices.
pub fn non_virtual_devices(dir: impl AsRef<Path>) -> Result<BTreeSet<String>, MetricsError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| MetricsError::read(dir, e))?;

    let mut devices = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| MetricsError::read(dir, e))?;
        let is_link = entry.file_type().map(|t| t.is_symlink()).unwrap_or(false);
        if !is_link {
            continue;
        }
        let path = entry.path();
        let target = std::fs::read_link(&path).map_err(|e| MetricsError::read(&path, e))?;
        if target.to_string_lossy().contains("virtual") {
            continue;
        }
        devices.insert(entry.file_name().to_string_lossy().into_owned());
    }

    tracing::debug!(dir = %dir.display(), devices = ?devices, "non-virtual block devices");
    Ok(devices)
}

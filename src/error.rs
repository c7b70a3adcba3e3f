// Error taxonomy for counter reading and rate computation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("failed to read {}: {source}", path.display())]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed line {line} in {}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A device tracked in the previous snapshot is gone from the current one.
    #[error("device '{0}' disappeared between samples")]
    MissingDevice(String),

    #[error("no eligible disk devices to average utilization over")]
    EmptyDeviceSet,

    #[error("misconfigured: {0}")]
    Misconfigured(String),
}

impl MetricsError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SnapshotRead {
            path: path.into(),
            source,
        }
    }
}

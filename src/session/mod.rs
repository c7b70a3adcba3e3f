// Sampling sessions: each owns its baseline snapshot, its timestamp and the running stats
// fed from every successful tick. Sessions are single-owner; drive one per process.

mod disk;
mod network;

pub use disk::DiskSession;
pub use network::NetworkSession;

use crate::rates::MissingDevicePolicy;
use crate::stats::DEFAULT_SMOOTHING_FACTOR;

/// Result of one `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Rates were computed and every running stat received one sample.
    Updated,
    /// Too little time since the last sample; nothing changed.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub smoothing_factor: f64,
    pub missing_device: MissingDevicePolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            missing_device: MissingDevicePolicy::default(),
        }
    }
}

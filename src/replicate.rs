// Copies the host's network counter file to a path a container can mount and read.

use std::path::{Path, PathBuf};
use tokio::sync::oneshot;
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::config::ReplicateConfig;

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Copies `source` to `target` through a sibling temp file and a rename, so
/// readers never observe a half-written file. Returns the bytes copied.
pub async fn replicate_once(source: &Path, target: &Path) -> anyhow::Result<usize> {
    let content = tokio::fs::read(source)
        .await
        .map_err(|e| anyhow::anyhow!("read {}: {}", source.display(), e))?;
    let tmp = temp_path(target);
    tokio::fs::write(&tmp, &content)
        .await
        .map_err(|e| anyhow::anyhow!("write {}: {}", tmp.display(), e))?;
    if let Err(e) = tokio::fs::rename(&tmp, target).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        anyhow::bail!("rename {} to {}: {}", tmp.display(), target.display(), e);
    }
    Ok(content.len())
}

/// Spawns the copy loop; failures are logged and retried on the next tick.
pub fn spawn(
    config: ReplicateConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_millis(config.interval_ms));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(
            source = %config.source.display(),
            target = %config.target.display(),
            interval_ms = config.interval_ms,
            "replicating counter file"
        );

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match replicate_once(&config.source, &config.target).await {
                        Ok(bytes) => tracing::trace!(bytes, "counter file replicated"),
                        Err(e) => tracing::warn!(
                            error = %e,
                            operation = "replicate_once",
                            "counter file copy failed"
                        ),
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Replicator shutting down");
                    break;
                }
            }
        }
    })
}

// Worker and replication loop tests: spawn, tick, shutdown, assert what was published

mod common;

use common::{Fixture, disk};
use iometrics::config::ReplicateConfig;
use iometrics::models::MetricsReport;
use iometrics::procfs::ProcNetDev;
use iometrics::replicate::{self, replicate_once};
use iometrics::session::{DiskSession, NetworkSession, SessionOptions};
use iometrics::worker::{WorkerConfig, WorkerDeps, sample, sample_blocking, spawn};
use tokio::sync::{oneshot, watch};
use tokio::time::{Duration, timeout};

#[cfg(unix)]
#[tokio::test]
async fn worker_spawn_publishes_reports_and_shuts_down() {
    let fixture = Fixture::new();
    fixture.write_net(&[("eth0", 0, 0)]);
    fixture.add_block_device("sda", false);
    fixture.write_disks(&[("sda", disk(0))]);

    let network = NetworkSession::new(ProcNetDev::new(&fixture.net_dev), SessionOptions::default())
        .unwrap();
    let disk_session =
        DiskSession::from_paths(&fixture.diskstats, &fixture.block_devices, SessionOptions::default())
            .unwrap();
    // Busy the whole time, whatever the window length.
    fixture.write_disks(&[("sda", disk(1_000_000))]);

    let (tx, mut rx) = watch::channel(MetricsReport::default());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = spawn(
        WorkerDeps {
            network: Some(network),
            disk: Some(disk_session),
            tx,
            shutdown_rx,
        },
        WorkerConfig {
            sample_interval_ms: 25,
        },
    );

    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("worker should publish within the timeout")
        .unwrap();
    let report = rx.borrow_and_update().clone();
    let _ = shutdown_tx.send(());
    handle.await.unwrap();

    assert!(report.timestamp > 0);
    // Network windows under a second are skipped, so only the baseline shows.
    assert_eq!(report.network.unwrap().recv_mb_per_sec.val, 0.0);
    assert_eq!(report.disk.unwrap().util_percent.val, 100.0);
}

#[tokio::test]
async fn worker_without_sessions_publishes_empty_sections() {
    let (tx, mut rx) = watch::channel(MetricsReport::default());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = spawn(
        WorkerDeps {
            network: None,
            disk: None,
            tx,
            shutdown_rx,
        },
        WorkerConfig {
            sample_interval_ms: 10,
        },
    );

    timeout(Duration::from_secs(5), rx.changed())
        .await
        .unwrap()
        .unwrap();
    let report = rx.borrow().clone();
    let _ = shutdown_tx.send(());
    handle.await.unwrap();

    assert!(report.timestamp > 0);
    assert!(report.network.is_none());
    assert!(report.disk.is_none());
}

#[cfg(unix)]
#[test]
fn sample_keeps_last_values_when_a_tick_fails() {
    let fixture = Fixture::new();
    fixture.add_block_device("sda", false);
    fixture.write_disks(&[("sda", disk(0))]);
    let mut disk_session =
        DiskSession::from_paths(&fixture.diskstats, &fixture.block_devices, SessionOptions::default())
            .unwrap();
    std::fs::remove_file(&fixture.diskstats).unwrap();

    let report = sample(None, Some(&mut disk_session));
    assert!(report.network.is_none());
    assert_eq!(report.disk.unwrap().util_percent.val, 0.0);
    assert_eq!(disk_session.util().count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn sample_blocking_hands_sessions_back_with_their_stats() {
    let fixture = Fixture::new();
    fixture.add_block_device("sda", false);
    fixture.write_disks(&[("sda", disk(0))]);
    let disk_session =
        DiskSession::from_paths(&fixture.diskstats, &fixture.block_devices, SessionOptions::default())
            .unwrap();
    fixture.write_disks(&[("sda", disk(1_000_000))]);

    let sampled = sample_blocking(None, Some(disk_session)).await.unwrap();
    assert!(sampled.network.is_none());
    let disk_session = sampled.disk.expect("disk session returned");
    assert_eq!(disk_session.util().count(), 1);
    assert_eq!(sampled.report.disk.unwrap().util_percent.val, 100.0);
    assert!(sampled.report.timestamp > 0);
}

#[tokio::test]
async fn replicate_once_copies_counter_file() {
    let fixture = Fixture::new();
    fixture.write_net(&[("eth0", 123, 456)]);
    let target = fixture.dir.path().join("shared_net_dev");

    let bytes = replicate_once(&fixture.net_dev, &target).await.unwrap();
    let copied = std::fs::read_to_string(&target).unwrap();
    assert_eq!(copied, std::fs::read_to_string(&fixture.net_dev).unwrap());
    assert_eq!(bytes, copied.len());
    assert!(!fixture.dir.path().join("shared_net_dev.tmp").exists());

    // The copy parses like the original.
    let network = NetworkSession::from_path(&target, SessionOptions::default());
    assert!(network.is_ok());
}

#[tokio::test]
async fn replicate_once_missing_source_fails() {
    let fixture = Fixture::new();
    let source = fixture.dir.path().join("absent");
    let target = fixture.dir.path().join("copy");
    let err = replicate_once(&source, &target).await.unwrap_err();
    assert!(err.to_string().contains("absent"));
    assert!(!target.exists());
}

#[tokio::test]
async fn replicate_once_failed_rename_names_target_and_cleans_up() {
    let fixture = Fixture::new();
    fixture.write_net(&[("eth0", 1, 1)]);
    // A file cannot be renamed over a directory.
    let target = fixture.dir.path().join("occupied");
    std::fs::create_dir(&target).unwrap();

    let err = replicate_once(&fixture.net_dev, &target).await.unwrap_err();
    assert!(err.to_string().contains("occupied"));
    assert!(!fixture.dir.path().join("occupied.tmp").exists());
    assert!(target.is_dir());
}

#[tokio::test]
async fn replicate_spawn_refreshes_target_until_shutdown() {
    let fixture = Fixture::new();
    fixture.write_net(&[("eth0", 1, 1)]);
    let target = fixture.dir.path().join("shared_net_dev");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = replicate::spawn(
        ReplicateConfig {
            source: fixture.net_dev.clone(),
            target: target.clone(),
            interval_ms: 10,
        },
        shutdown_rx,
    );

    fixture.write_net(&[("eth0", 999, 999)]);
    let expected = std::fs::read_to_string(&fixture.net_dev).unwrap();
    let refreshed = timeout(Duration::from_secs(5), async {
        loop {
            if std::fs::read_to_string(&target).ok().as_deref() == Some(expected.as_str()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    let _ = shutdown_tx.send(());
    handle.await.unwrap();
    assert!(refreshed.is_ok(), "target should track the source file");
}

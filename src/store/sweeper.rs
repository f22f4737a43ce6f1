use std::time::{Duration, SystemTime};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::FileStore;

/// Spawns the periodic purge of expired artifacts. The task exits once
/// `cancel` fires. Returns `None` when `interval` is zero.
pub fn spawn(
    store: FileStore,
    interval: Duration,
    max_age: Duration,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        info!("background cleanup disabled");
        return None;
    }

    info!(
        interval_secs = interval.as_secs(),
        max_age_secs = max_age.as_secs(),
        "background cleanup enabled"
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("background cleanup stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match store.purge_older_than(max_age, SystemTime::now()).await {
                        Ok(0) => {}
                        Ok(n) => info!(deleted_files = n, "background cleanup finished"),
                        Err(e) => warn!(error = %e, "background cleanup failed"),
                    }
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use bytes::Bytes;

    use super::*;

    #[tokio::test]
    async fn zero_interval_disables_sweeper() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let handle = spawn(
            store,
            Duration::ZERO,
            Duration::from_secs(3600),
            CancellationToken::new(),
        );
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn sweeps_then_stops_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let path = store.put("stale.bin", Bytes::from_static(b"x")).await.unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(7200))
            .unwrap();

        let cancel = CancellationToken::new();
        let handle = spawn(
            store,
            Duration::from_millis(10),
            Duration::from_secs(3600),
            cancel.clone(),
        )
        .unwrap();

        // the first tick fires immediately
        for _ in 0..100 {
            if !path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!path.exists());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}

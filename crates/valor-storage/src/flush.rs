use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::snapshot::SnapshotStore;
use crate::store::SessionStore;

/// Save the current contents of `store` once. Returns the session count.
pub async fn flush_now(
    store: &dyn SessionStore,
    snapshots: &dyn SnapshotStore,
) -> Result<usize, StorageError> {
    let snapshot = store.snapshot();
    let count = snapshot.sessions.len();
    snapshots.save(&snapshot).await?;
    debug!(sessions = count, "session snapshot flushed");
    Ok(count)
}

/// Load the last snapshot into `store`, if one exists. Returns the number
/// of sessions restored.
///
/// A snapshot that cannot be parsed is moved aside with
/// [`SnapshotStore::set_aside`] and the store starts empty. Any other
/// failure is returned, and the caller should not save over the snapshot.
pub async fn restore_from(
    store: &dyn SessionStore,
    snapshots: &dyn SnapshotStore,
) -> Result<usize, StorageError> {
    match snapshots.load().await {
        Ok(Some(snapshot)) => {
            store.restore(snapshot);
            let count = store.len();
            info!(sessions = count, "sessions restored from snapshot");
            Ok(count)
        }
        Ok(None) => Ok(0),
        Err(StorageError::Serialization(e)) => {
            let moved_to = snapshots.set_aside().await?;
            warn!(
                error = %e,
                moved_to = ?moved_to,
                "session snapshot is unreadable; starting empty"
            );
            Ok(0)
        }
        Err(e) => Err(e),
    }
}

/// Handle to the background flush loop started by [`spawn_flush_task`].
/// Dropping it also stops the loop.
pub struct FlushTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl FlushTask {
    /// Stop the loop and wait for it to exit. A flush already in progress
    /// finishes first, so no write is left running afterwards.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.handle.await {
            warn!(error = %e, "session flush task ended abnormally");
        }
    }
}

/// Periodically flush `store` to `snapshots` until [`FlushTask::shutdown`].
///
/// Failures are logged and the next tick tries again.
pub fn spawn_flush_task(
    store: Arc<dyn SessionStore>,
    snapshots: Arc<dyn SnapshotStore>,
    every: Duration,
) -> FlushTask {
    let every = every.max(Duration::from_millis(10));
    let (stop, mut stopped) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = &mut stopped => break,
                _ = ticker.tick() => {
                    if let Err(e) = flush_now(store.as_ref(), snapshots.as_ref()).await {
                        warn!(error = %e, "session snapshot flush failed");
                    }
                }
            }
        }
        debug!("session flush task stopped");
    });

    FlushTask { stop, handle }
}

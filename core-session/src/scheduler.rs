//! Single-slot scheduling for the token refresh.
//!
//! At most one refresh is ever pending. Scheduling a new one cancels the
//! previous one first, so a re-established session can never be refreshed
//! on the old token's timetable.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Seconds before expiry at which the refresh fires.
pub const REFRESH_LEAD: i64 = 300;

/// Delay until the refresh for a grant with the given lifetime.
///
/// Fires [`REFRESH_LEAD`] seconds before expiry, clamped to zero for
/// short-lived grants.
pub fn refresh_delay(expires_in: i64) -> Duration {
    Duration::from_secs((expires_in - REFRESH_LEAD).max(0) as u64)
}

struct Pending {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Holds the single pending refresh task, if any.
pub struct RefreshScheduler {
    pending: Mutex<Option<Pending>>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }

    /// Schedules `task` to run after `delay`, cancelling any previously
    /// scheduled task.
    pub async fn schedule<F, Fut>(&self, delay: Duration, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let cancel = CancellationToken::new();
        let child = cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {
                    debug!("Scheduled refresh cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    task().await;
                }
            }
        });

        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.replace(Pending { cancel, handle }) {
            previous.cancel.cancel();
        }
    }

    /// Cancels the pending refresh, if any.
    pub async fn cancel(&self) {
        if let Some(previous) = self.pending.lock().await.take() {
            previous.cancel.cancel();
        }
    }

    /// Whether a refresh is currently scheduled and not yet run.
    pub async fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .await
            .as_ref()
            .map(|p| !p.handle.is_finished())
            .unwrap_or(false)
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

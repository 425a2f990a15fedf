//! Proactive refresh timer.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use quizgate_core::AccessToken;

/// Default margin subtracted from the token expiry.
pub const DEFAULT_SKEW_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

/// Arms at most one deferred refresh ahead of access-token expiry.
///
/// Every [`arm`](Self::arm) cancels the previous timer. A timer that fires
/// detaches itself from the slot before running its callback, so the
/// callback may re-arm without cancelling itself.
#[derive(Debug)]
pub struct RefreshScheduler {
    skew_margin: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl RefreshScheduler {
    pub fn new(skew_margin: Duration) -> Self {
        Self {
            skew_margin,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn skew_margin(&self) -> Duration {
        self.skew_margin
    }

    /// Schedule `on_due` to run `skew_margin` before `token` expires.
    ///
    /// Any previous timer is cancelled first. Nothing is scheduled when the
    /// token has no readable expiry, when it expires within the margin, or
    /// when called outside a tokio runtime. Returns the delay that was
    /// scheduled.
    pub fn arm<F, Fut>(&self, token: &AccessToken, on_due: F) -> Option<Duration>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        Self::cancel(&mut slot);

        let Some(expires_at) = token.expires_at() else {
            debug!("Access token has no readable expiry, not scheduling refresh");
            return None;
        };

        let delay = (expires_at - Utc::now())
            .to_std()
            .ok()
            .and_then(|remaining| remaining.checked_sub(self.skew_margin))
            .filter(|delay| !delay.is_zero());
        let Some(delay) = delay else {
            debug!(%expires_at, "Access token expires within the skew margin, not scheduling refresh");
            return None;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available, not scheduling refresh");
            return None;
        };

        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        slot.task = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                slot.task = None;
            }
            on_due().await;
        }));

        info!(refresh_in_secs = delay.as_secs(), "Refresh scheduled");
        Some(delay)
    }

    /// Cancel the pending timer, if any.
    pub fn disarm(&self) {
        let mut slot = lock(&self.slot);
        if slot.task.is_some() {
            debug!("Refresh timer cancelled");
        }
        Self::cancel(&mut slot);
    }

    /// Returns true while a timer is pending.
    pub fn is_armed(&self) -> bool {
        lock(&self.slot)
            .task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn cancel(slot: &mut Slot) {
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(task) = slot.task.take() {
            task.abort();
        }
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SKEW_MARGIN)
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        Self::cancel(&mut lock(&self.slot));
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

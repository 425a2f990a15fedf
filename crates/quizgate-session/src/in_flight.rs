//! Single-flight slot for token refreshes.

use std::sync::{Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

use crate::gateway::RefreshOutcome;

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
struct Slot {
    next_id: u64,
    current: Option<(u64, SharedRefresh)>,
}

/// At most one refresh exchange at a time.
///
/// Callers that arrive while a refresh is pending join it and observe the
/// same outcome. The slot is released by [`finish`](Self::finish) once the
/// refreshed credential has been stored, so a caller arriving afterwards
/// starts a fresh exchange.
#[derive(Default)]
pub struct InFlightRefresh {
    slot: Mutex<Slot>,
}

impl InFlightRefresh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the pending refresh, or start one with `start`.
    ///
    /// `start` receives the id to pass to [`finish`](Self::finish). It runs
    /// under the slot lock and must not block.
    pub fn join_or_start<F>(&self, start: F) -> SharedRefresh
    where
        F: FnOnce(u64) -> BoxFuture<'static, RefreshOutcome>,
    {
        let mut slot = self.lock();
        if let Some((_, pending)) = &slot.current {
            return pending.clone();
        }
        let id = slot.next_id;
        slot.next_id = slot.next_id.wrapping_add(1);
        let shared = start(id).shared();
        slot.current = Some((id, shared.clone()));
        shared
    }

    /// Release the slot held by refresh `id`. A newer refresh is left alone.
    pub fn finish(&self, id: u64) {
        let mut slot = self.lock();
        if slot.current.as_ref().is_some_and(|(current, _)| *current == id) {
            slot.current = None;
        }
    }

    /// Forget the pending refresh. Callers already joined still get its outcome.
    pub fn clear(&self) {
        self.lock().current = None;
    }

    pub fn is_pending(&self) -> bool {
        self.lock().current.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InFlightRefresh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightRefresh")
            .field("pending", &self.is_pending())
            .finish()
    }
}

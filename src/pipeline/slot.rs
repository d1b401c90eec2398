//! Capacity-1 handoff slot.
//!
//! The slot is the only channel between the render loop and a worker. It
//! holds zero or one pending item; what happens to a submission against an
//! occupied slot depends on the overflow policy chosen at construction:
//!
//! - `RejectIfBusy`: the submission is refused. Used for worker input so a
//!   worker is never forced to discard work it has already started.
//! - `Overwrite`: the pending item is replaced. Used where only the newest
//!   value matters.
//!
//! Refused and replaced items vanish without queueing or retry; dropping
//! under load is expected behaviour, not an error.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Overflow policy for `try_submit` against an occupied slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Refuse the new item, keep the pending one.
    RejectIfBusy,
    /// Replace the pending item with the new one.
    Overwrite,
}

/// Capacity-1 handoff slot.
pub struct HandoffSlot<T> {
    pending: Mutex<Option<T>>,
    ready: Condvar,
    policy: OverflowPolicy,
}

impl<T> HandoffSlot<T> {
    pub fn new(policy: OverflowPolicy) -> Self {
        Self {
            pending: Mutex::new(None),
            ready: Condvar::new(),
            policy,
        }
    }

    pub fn reject_if_busy() -> Self {
        Self::new(OverflowPolicy::RejectIfBusy)
    }

    pub fn overwrite() -> Self {
        Self::new(OverflowPolicy::Overwrite)
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Attempt to place an item. Never blocks.
    ///
    /// Returns `false` only under `RejectIfBusy` when an item is already
    /// pending; the pending item is left untouched. Under `Overwrite` the
    /// call always succeeds.
    pub fn try_submit(&self, item: T) -> bool {
        let mut pending = lock_unpoisoned(&self.pending);
        if pending.is_some() && self.policy == OverflowPolicy::RejectIfBusy {
            return false;
        }
        *pending = Some(item);
        drop(pending);
        self.ready.notify_one();
        true
    }

    /// Take the pending item, waiting up to `timeout` for one to arrive.
    ///
    /// The bounded wait exists so callers can re-check their run flag; it is
    /// not a coordination mechanism. Returns `None` on timeout.
    pub fn try_take(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut pending = lock_unpoisoned(&self.pending);
        loop {
            if let Some(item) = pending.take() {
                return Some(item);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, wait) = self
                .ready
                .wait_timeout(pending, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            pending = guard;
            if wait.timed_out() && pending.is_none() {
                return None;
            }
        }
    }

    /// Discard any pending item.
    ///
    /// Called during shutdown so a still-occupied reject-policy slot cannot
    /// hold a frame hostage past the worker's lifetime.
    pub fn clear(&self) {
        lock_unpoisoned(&self.pending).take();
    }

    pub fn is_occupied(&self) -> bool {
        lock_unpoisoned(&self.pending).is_some()
    }
}

// A poisoned mutex here only means some thread panicked while holding the
// assignment-length critical section; the Option inside is still coherent.
fn lock_unpoisoned<T>(mutex: &Mutex<Option<T>>) -> MutexGuard<'_, Option<T>> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

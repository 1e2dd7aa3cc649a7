//! Completion coordinator: rendezvous a fixed set of stream branches
//! into one synchronous exit point.

use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

/// Counts down terminal events from a fixed number of independently
/// running branches and releases waiters only when all have reported.
///
/// Each branch must count down exactly once, on its first terminal
/// event — completion or error. [`wait`](Self::wait) re-enters the wait
/// until the count truly reaches zero, so a spurious wakeup never
/// releases early.
pub struct CompletionLatch {
    remaining: Mutex<usize>,
    notify: Notify,
}

impl CompletionLatch {
    /// A latch expecting `count` terminal events.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            notify: Notify::new(),
        }
    }

    /// Report one branch's terminal event. Saturates at zero.
    pub fn count_down(&self) {
        let mut remaining = self
            .remaining
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *remaining > 0 {
            *remaining -= 1;
        }
        let released = *remaining == 0;
        drop(remaining);
        if released {
            self.notify.notify_waiters();
        }
    }

    /// Branches still outstanding.
    #[must_use]
    pub fn remaining(&self) -> usize {
        *self
            .remaining
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Suspend until every branch has reported its terminal event.
    ///
    /// Returns immediately when the count is already zero. Waking
    /// without the count having reached zero re-enters the wait.
    pub async fn wait(&self) {
        loop {
            // Register interest before checking, so a count_down racing
            // with the check cannot be missed.
            let notified = self.notify.notified();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

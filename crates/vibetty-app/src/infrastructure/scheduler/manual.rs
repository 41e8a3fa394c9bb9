//! Virtual-time scheduler for tests.
//!
//! # Why a manual clock?
//!
//! Repeat timing is defined to the millisecond ("a 560 ms hold produces two
//! events").  Against a real clock such tests are either slow or flaky.  The
//! `ManualScheduler` keeps its own clock that starts at zero and only moves
//! when the test calls [`ManualScheduler::advance`] or
//! [`ManualScheduler::advance_to`].
//!
//! While advancing, due timers fire in deadline order (FIFO for equal
//! deadlines) with the clock set to each timer's deadline, so a callback that
//! schedules a follow-up sees the same `now()` it would see in real time.
//! Follow-ups that fall inside the advanced window fire in the same call.
//!
//! # Usage in tests
//!
//! ```ignore
//! let scheduler = Arc::new(ManualScheduler::new());
//! let engine = KeyRepeatEngine::new(scheduler.clone(), sink, RepeatTiming::default());
//!
//! engine.on_press(LogicalKey::ArrowUp);
//! scheduler.advance(Duration::from_millis(560));
//! engine.on_release(LogicalKey::ArrowUp);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::application::timer::{CancelToken, TimerCallback, TimerHandle, TimerScheduler};

struct Entry {
    token: CancelToken,
    callback: TimerCallback,
}

#[derive(Default)]
struct Queue {
    now: Duration,
    next_seq: u64,
    timers: BTreeMap<(Duration, u64), Entry>,
}

/// A [`TimerScheduler`] whose clock is moved explicitly.
///
/// Cancelling a handle removes its timer from the queue straight away.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<Queue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the clock forward by `by`, firing every timer that falls due.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        self.advance_to(target);
    }

    /// Moves the clock to `target`, firing every timer due at or before it.
    ///
    /// A target in the past leaves the clock where it is.
    pub fn advance_to(&self, target: Duration) {
        loop {
            // The lock is released before the callback runs so that it can
            // schedule follow-ups.
            let entry = {
                let mut queue = self.queue();
                let due = match queue.timers.keys().next() {
                    Some(&(deadline, seq)) if deadline <= target => (deadline, seq),
                    _ => break,
                };
                queue.now = queue.now.max(due.0);
                queue.timers.remove(&due)
            };
            if let Some(entry) = entry {
                if !entry.token.is_cancelled() {
                    (entry.callback)();
                }
            }
        }
        let mut queue = self.queue();
        queue.now = queue.now.max(target);
    }

    /// Number of timers scheduled and not yet cancelled or fired.
    pub fn pending(&self) -> usize {
        self.queue().timers.len()
    }
}

impl TimerScheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.queue().now
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut queue = self.queue();
        let key = (queue.now + delay, queue.next_seq);
        queue.next_seq += 1;
        queue.timers.insert(key, Entry { token: handle.token(), callback });
        drop(queue);

        let weak = Arc::downgrade(&self.queue);
        handle.with_on_cancel(move || {
            if let Some(queue) = weak.upgrade() {
                queue.lock().unwrap_or_else(PoisonError::into_inner).timers.remove(&key);
            }
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

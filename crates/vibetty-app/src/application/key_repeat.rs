//! KeyRepeatEngine: press/hold/release timing for auto-repeating keys.
//!
//! # Timing (for beginners)
//!
//! Holding an arrow key on the panel should behave like holding it on a
//! hardware keyboard:
//!
//! ```text
//! press                    500 ms         550    600    650  ...   release
//!   │◄──── initial delay ────►│◄─ 50 ─►│◄─ 50 ─►│◄─ 50 ─►│
//!   ●                                  ●        ●        ●   ...
//! fire                               tick     tick     tick
//! ```
//!
//! One event fires synchronously on press.  Repeat ticks are due at
//! `press + initial_delay + n * interval` for `n >= 1`.  The deadlines sit on
//! an absolute grid measured from the press, so a late callback does not push
//! later ticks back.  A tick due exactly at the release instant still fires:
//! releasing (or cancelling) first flushes a tick whose deadline has been
//! reached but whose timer has not run yet, so the count does not depend on
//! which of the two a scheduler happens to run first.
//!
//! A hold of `T` ms therefore produces `1 + (T - 500) / 50` events when
//! `T >= 500`, and a single event otherwise.
//!
//! # Sessions
//!
//! Each held key owns at most one [`RepeatSession`].  Pressing a key that is
//! already repeating cancels the old session first.  Every session carries a
//! generation number; a timer callback whose generation no longer matches the
//! live session does nothing, which covers the window between a timer
//! expiring and its cancellation being observed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tracing::{debug, trace};
use vibetty_core::LogicalKey;

use crate::application::timer::{TimerHandle, TimerScheduler};

/// Delay between the press and the start of the repeat phase.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Period of the repeat phase.
pub const DEFAULT_REPEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Receives every key event the engine produces.
///
/// Called with the engine's session lock held, so implementations must not
/// call back into the engine.
pub trait KeyEventSink: Send + Sync {
    fn fire(&self, key: LogicalKey);
}

impl<F> KeyEventSink for F
where
    F: Fn(LogicalKey) + Send + Sync,
{
    fn fire(&self, key: LogicalKey) {
        self(key)
    }
}

/// Initial delay and repeat interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTiming {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl RepeatTiming {
    /// Builds a timing, raising a zero interval to 1 ms.
    pub fn new(initial_delay: Duration, interval: Duration) -> Self {
        Self { initial_delay, interval: interval.max(Duration::from_millis(1)) }
    }

    pub fn from_millis(initial_delay_ms: u64, interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(initial_delay_ms), Duration::from_millis(interval_ms))
    }

    /// Number of events a hold of `held` produces.
    pub fn events_for_hold(&self, held: Duration) -> u64 {
        if held < self.initial_delay {
            return 1;
        }
        let repeat_phase = (held - self.initial_delay).as_nanos();
        1 + (repeat_phase / self.interval.as_nanos()) as u64
    }

    /// First grid point strictly after `now`, given the tick just due at `due`.
    fn next_due(&self, due: Duration, now: Duration) -> Duration {
        let next = due + self.interval;
        if next > now {
            return next;
        }
        // Running more than one interval behind: skip the missed ticks.
        let missed = ((now - due).as_nanos() / self.interval.as_nanos()) as u32;
        due + self.interval * (missed + 1)
    }
}

impl Default for RepeatTiming {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_DELAY, DEFAULT_REPEAT_INTERVAL)
    }
}

/// Book-keeping for one press-to-release gesture.
#[derive(Debug)]
struct RepeatSession {
    generation: u64,
    next_due: Duration,
    timer: Option<TimerHandle>,
}

impl RepeatSession {
    fn cancel(self) {
        if let Some(timer) = self.timer {
            timer.cancel();
        }
    }
}

struct Shared {
    scheduler: Arc<dyn TimerScheduler>,
    sink: Arc<dyn KeyEventSink>,
    timing: RepeatTiming,
    sessions: Mutex<HashMap<LogicalKey, RepeatSession>>,
    generations: AtomicU64,
}

impl Shared {
    fn sessions(&self) -> MutexGuard<'_, HashMap<LogicalKey, RepeatSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedules the tick due at `due`.  Caller holds the session lock.
    fn schedule_tick(self: &Arc<Self>, key: LogicalKey, generation: u64, due: Duration) -> TimerHandle {
        let delay = due.saturating_sub(self.scheduler.now());
        let weak = Arc::downgrade(self);
        self.scheduler.schedule(delay, Box::new(move || on_tick(weak, key, generation)))
    }

    /// Fires the pending tick of a session being ended if it is already due.
    /// Caller holds the session lock.
    fn flush_due(&self, key: LogicalKey, session: &RepeatSession) {
        if session.next_due <= self.scheduler.now() {
            trace!(%key, generation = session.generation, "firing tick due at release");
            self.sink.fire(key);
        }
    }
}

fn on_tick(shared: Weak<Shared>, key: LogicalKey, generation: u64) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let mut sessions = shared.sessions();
    let due = match sessions.get(&key) {
        Some(session) if session.generation == generation => session.next_due,
        _ => {
            trace!(%key, generation, "stale repeat tick ignored");
            return;
        }
    };

    shared.sink.fire(key);

    let next = shared.timing.next_due(due, shared.scheduler.now());
    let timer = shared.schedule_tick(key, generation, next);
    if let Some(session) = sessions.get_mut(&key) {
        session.next_due = next;
        session.timer = Some(timer);
    }
}

/// Turns press/hold/release gestures into a stream of key events.
///
/// Dropping the engine cancels every active session.
pub struct KeyRepeatEngine {
    shared: Arc<Shared>,
}

impl KeyRepeatEngine {
    pub fn new(
        scheduler: Arc<dyn TimerScheduler>,
        sink: Arc<dyn KeyEventSink>,
        timing: RepeatTiming,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                scheduler,
                sink,
                timing,
                sessions: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn timing(&self) -> RepeatTiming {
        self.shared.timing
    }

    /// Fires `key` once and starts repeating it.
    ///
    /// A session already running for `key` is cancelled and replaced.
    pub fn on_press(&self, key: LogicalKey) {
        let shared = &self.shared;
        let generation = shared.generations.fetch_add(1, Ordering::Relaxed) + 1;

        let mut sessions = shared.sessions();
        if let Some(previous) = sessions.remove(&key) {
            debug!(%key, "press while repeating, restarting session");
            previous.cancel();
        }

        shared.sink.fire(key);

        let first_due = shared.scheduler.now() + shared.timing.initial_delay + shared.timing.interval;
        let timer = shared.schedule_tick(key, generation, first_due);
        sessions.insert(key, RepeatSession { generation, next_due: first_due, timer: Some(timer) });
        trace!(%key, generation, "repeat session started");
    }

    /// Stops repeating `key`.  Returns `false` if it was not held.
    pub fn on_release(&self, key: LogicalKey) -> bool {
        let session = {
            let mut sessions = self.shared.sessions();
            let Some(session) = sessions.remove(&key) else {
                return false;
            };
            self.shared.flush_due(key, &session);
            session
        };
        trace!(%key, generation = session.generation, "repeat session ended");
        session.cancel();
        true
    }

    /// Cancels every active session.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = {
            let mut sessions = self.shared.sessions();
            let mut drained: Vec<_> = sessions.drain().collect();
            drained.sort_by_key(|(key, _)| *key);
            for (key, session) in &drained {
                self.shared.flush_due(*key, session);
            }
            drained
        };
        if !drained.is_empty() {
            debug!(count = drained.len(), "cancelling all repeat sessions");
        }
        for (_, session) in drained {
            session.cancel();
        }
    }

    pub fn is_repeating(&self, key: LogicalKey) -> bool {
        self.shared.sessions().contains_key(&key)
    }

    /// Keys currently held, in panel order.
    pub fn active_sessions(&self) -> Vec<LogicalKey> {
        let mut keys: Vec<_> = self.shared.sessions().keys().copied().collect();
        keys.sort();
        keys
    }
}

impl Drop for KeyRepeatEngine {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

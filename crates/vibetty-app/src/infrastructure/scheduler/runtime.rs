//! Real-time scheduler backed by a tokio runtime.
//!
//! Every timer is a spawned task that sleeps until its deadline, checks the
//! handle's cancel token and runs the callback.  Cancelling sets the token and
//! aborts the task, so a sleeping timer goes away immediately and one that has
//! already woken up sees the token before it runs anything.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::warn;

use crate::application::timer::{TimerCallback, TimerHandle, TimerScheduler};

/// A [`TimerScheduler`] that spawns one sleeping task per timer.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
    epoch: Instant,
}

impl TokioScheduler {
    /// A scheduler spawning onto `runtime`.
    ///
    /// Must be called from within a runtime context when the runtime's clock
    /// is paused (tests), because the epoch is read from tokio's clock.
    pub fn new(runtime: Handle) -> Self {
        let _guard = runtime.enter();
        Self { runtime, epoch: Instant::now() }
    }

    /// A scheduler on the runtime the caller is running in, if any.
    pub fn current() -> Option<Self> {
        match Handle::try_current() {
            Ok(runtime) => Some(Self::new(runtime)),
            Err(e) => {
                warn!("no tokio runtime available for timers: {e}");
                None
            }
        }
    }
}

impl TimerScheduler for TokioScheduler {
    fn now(&self) -> Duration {
        let _guard = self.runtime.enter();
        Instant::now().saturating_duration_since(self.epoch)
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle::new();
        let token = handle.token();
        let deadline = self.epoch + self.now() + delay;
        let task = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if !token.is_cancelled() {
                callback();
            }
        });
        handle.with_on_cancel(move || task.abort())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

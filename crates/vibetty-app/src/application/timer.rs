//! Cancellable one-shot timers.
//!
//! The repeat engine never sleeps.  Instead it asks a [`TimerScheduler`] to run
//! a callback later and keeps the returned [`TimerHandle`]; each callback
//! schedules the next one while the key is still held.  Releasing the key
//! cancels the handle, which guarantees the callback never runs.
//!
//! Implementations live in the infrastructure layer:
//! - `TokioScheduler` – real time on a tokio runtime.
//! - `ManualScheduler` – virtual time advanced explicitly by tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Work to run when a timer expires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// A source of one-shot timers and the clock they run on.
pub trait TimerScheduler: Send + Sync {
    /// Time elapsed on this scheduler's clock since it was created.
    ///
    /// Never decreases.
    fn now(&self) -> Duration;

    /// Runs `callback` once, `delay` from now, unless the returned handle is
    /// cancelled first.
    ///
    /// Implementations must never run `callback` before returning, and must
    /// check the handle's [`CancelToken`] immediately before running it.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

/// Shared flag checked by the scheduler right before a callback runs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Owner's side of a scheduled timer.
///
/// Dropping a handle does *not* cancel the timer; call [`TimerHandle::cancel`].
#[must_use = "a timer that is never cancelled will fire"]
pub struct TimerHandle {
    token: CancelToken,
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    /// A fresh, uncancelled handle.
    pub fn new() -> Self {
        Self { token: CancelToken::default(), on_cancel: None }
    }

    /// Extra cleanup to run on cancel, e.g. aborting the task that sleeps.
    pub fn with_on_cancel(mut self, on_cancel: impl FnOnce() + Send + 'static) -> Self {
        self.on_cancel = Some(Box::new(on_cancel));
        self
    }

    /// The token the scheduler checks before firing.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels the timer.  Infallible and idempotent.
    pub fn cancel(mut self) {
        self.token.cancel();
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel();
        }
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle").field("cancelled", &self.is_cancelled()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_new_handle_is_not_cancelled() {
        let handle = TimerHandle::new();
        assert!(!handle.token().is_cancelled());
        handle.cancel();
    }

    #[test]
    fn test_cancel_sets_shared_token_and_runs_hook_once() {
        // Arrange
        let hook_calls = Arc::new(AtomicUsize::new(0));
        let calls = Arc::clone(&hook_calls);
        let handle = TimerHandle::new().with_on_cancel(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        let token = handle.token();

        // Act
        handle.cancel();

        // Assert
        assert!(token.is_cancelled());
        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    }
}

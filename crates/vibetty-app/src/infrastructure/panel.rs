//! In-process implementations of the key panel's side channels.
//!
//! - [`IdleTimer`] answers "how long since the user last touched the panel?",
//!   which the panel uses to fade itself out.
//! - [`ImeState`] tracks soft keyboard visibility.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::trace;

use crate::application::dispatch_keys::{ImeController, InteractionSignal};
use crate::application::timer::TimerScheduler;

/// Records the time of the latest interaction on a scheduler's clock.
pub struct IdleTimer {
    clock: Arc<dyn TimerScheduler>,
    last: Mutex<Duration>,
    count: AtomicUsize,
}

impl IdleTimer {
    pub fn new(clock: Arc<dyn TimerScheduler>) -> Self {
        let now = clock.now();
        Self { clock, last: Mutex::new(now), count: AtomicUsize::new(0) }
    }

    /// Time since the last interaction (or since creation).
    pub fn idle_for(&self) -> Duration {
        let last = *self.last.lock().unwrap_or_else(PoisonError::into_inner);
        self.clock.now().saturating_sub(last)
    }

    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.idle_for() >= timeout
    }

    /// Total interactions seen.
    pub fn interactions(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl InteractionSignal for IdleTimer {
    fn interacted(&self) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = self.clock.now();
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Soft keyboard visibility flag.
#[derive(Debug, Default)]
pub struct ImeState {
    visible: AtomicBool,
}

impl ImeState {
    pub fn new(visible: bool) -> Self {
        Self { visible: AtomicBool::new(visible) }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl ImeController for ImeState {
    fn hide_ime(&self) {
        trace!("hiding soft keyboard");
        self.visible.store(false, Ordering::SeqCst);
    }

    fn show_ime(&self) {
        trace!("showing soft keyboard");
        self.visible.store(true, Ordering::SeqCst);
    }
}

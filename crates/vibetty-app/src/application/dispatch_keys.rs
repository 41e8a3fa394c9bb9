//! KeyDispatchTable: routes key panel gestures to the terminal session.
//!
//! ```text
//! tap / hold ─► KeyDispatchTable ─┬─ SingleShot ───────────────► send once
//!                                 └─ Repeatable ─► KeyRepeatEngine ─► send on
//!                                                                    press and
//!                                                                    every tick
//! ```
//!
//! Every key event that reaches the session (including each repeat tick)
//! signals user interaction exactly once, which keeps the panel from
//! auto-hiding while the user is typing.  Send failures are logged and
//! dropped: a key lost on a dying connection is not worth surfacing.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;
use vibetty_core::{KeyPressIntent, KeyRequest, LogicalKey};

use crate::application::key_repeat::{KeyEventSink, KeyRepeatEngine, RepeatTiming};
use crate::application::terminal_io::TerminalIoLogger;
use crate::application::timer::TimerScheduler;

/// Error returned by a [`TerminalSession`] send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("terminal session is closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}

/// The terminal session's input side.
pub trait TerminalSession: Send + Sync {
    /// Delivers a key event to the session's key handler.
    fn send_key(&self, request: KeyRequest) -> Result<(), SessionError>;

    /// Writes raw bytes to the remote host.
    fn send_bytes(&self, bytes: &[u8]) -> Result<(), SessionError>;
}

/// Notified on every user interaction with the key panel.
pub trait InteractionSignal: Send + Sync {
    fn interacted(&self);
}

/// Shows and hides the soft keyboard.
pub trait ImeController: Send + Sync {
    fn hide_ime(&self);
    fn show_ime(&self);
}

/// Sends one key event.  Also the sink the repeat engine fires into.
struct SessionKeySink {
    session: Arc<dyn TerminalSession>,
    interaction: Arc<dyn InteractionSignal>,
    io_logger: TerminalIoLogger,
}

impl KeyEventSink for SessionKeySink {
    fn fire(&self, key: LogicalKey) {
        let request = key.request();
        if self.io_logger.is_enabled() {
            self.io_logger.log_key_event(&request, &format!("panel {key}"));
        }
        if let Err(e) = self.session.send_key(request) {
            warn!(%key, "key panel send failed: {e}");
        }
        self.interaction.interacted();
    }
}

/// Maps key panel gestures to terminal key requests.
pub struct KeyDispatchTable {
    keys: Arc<SessionKeySink>,
    repeat: KeyRepeatEngine,
    repeatable: Vec<LogicalKey>,
    interaction: Arc<dyn InteractionSignal>,
    ime: Arc<dyn ImeController>,
}

impl KeyDispatchTable {
    /// `repeatable` lists the keys that auto-repeat when pressed through
    /// [`KeyDispatchTable::press`]; see [`LogicalKey::default_repeatable`].
    pub fn new(
        session: Arc<dyn TerminalSession>,
        interaction: Arc<dyn InteractionSignal>,
        ime: Arc<dyn ImeController>,
        scheduler: Arc<dyn TimerScheduler>,
        timing: RepeatTiming,
        repeatable: Vec<LogicalKey>,
        io_logger: TerminalIoLogger,
    ) -> Self {
        let keys = Arc::new(SessionKeySink { session, interaction: interaction.clone(), io_logger });
        let repeat = KeyRepeatEngine::new(scheduler, keys.clone(), timing);
        Self { keys, repeat, repeatable, interaction, ime }
    }

    /// How a press of `key` is delivered with this table's repeatable set.
    pub fn intent_for(&self, key: LogicalKey) -> KeyPressIntent {
        if self.repeatable.contains(&key) {
            KeyPressIntent::Repeatable(key)
        } else {
            KeyPressIntent::SingleShot(key)
        }
    }

    /// Delivers a gesture.  Repeatable intents keep firing until
    /// [`KeyDispatchTable::release`].
    pub fn dispatch(&self, intent: KeyPressIntent) {
        match intent {
            KeyPressIntent::SingleShot(key) => self.keys.fire(key),
            KeyPressIntent::Repeatable(key) => self.repeat.on_press(key),
        }
    }

    /// Presses `key` on the panel.
    pub fn press(&self, key: LogicalKey) {
        self.dispatch(self.intent_for(key));
    }

    /// Ends a repeatable gesture.  No-op for keys that are not held.
    pub fn release(&self, key: LogicalKey) {
        self.repeat.on_release(key);
    }

    /// The keyboard button: hides the soft keyboard if it is showing,
    /// otherwise shows it.
    pub fn toggle_ime(&self, ime_visible: bool) {
        if ime_visible {
            self.ime.hide_ime();
        } else {
            self.ime.show_ime();
        }
        self.interaction.interacted();
    }

    /// Signals interaction for a gesture that sends nothing (e.g. a scroll of
    /// the panel itself).
    pub fn touch(&self) {
        self.interaction.interacted();
    }

    pub fn is_repeating(&self, key: LogicalKey) -> bool {
        self.repeat.is_repeating(key)
    }

    /// Cancels every held key.  Call when the panel goes away.
    pub fn teardown(&self) {
        self.repeat.cancel_all();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

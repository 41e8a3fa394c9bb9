//! Key panel tables: logical panel keys and the terminal requests they produce.
//!
//! The compact key panel shown above the soft keyboard offers a handful of keys
//! that are awkward to type on a phone.  Each button is a [`LogicalKey`]; the
//! terminal session does not know about buttons, it only accepts a
//! [`KeyRequest`] (a terminal key plus a modifier set).
//!
//! The mapping from [`LogicalKey`] to [`KeyRequest`] is fixed and total: every
//! logical key maps to exactly one request, checked exhaustively by the
//! compiler in [`LogicalKey::request`].

pub mod xterm;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A key as presented on the key panel, independent of how it was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogicalKey {
    Escape,
    Tab,
    Enter,
    ArrowUp,
    ArrowDown,
    CtrlArrowUp,
    CtrlArrowDown,
}

impl LogicalKey {
    /// Every logical key, in panel order (left to right).
    pub const ALL: [LogicalKey; 7] = [
        LogicalKey::Escape,
        LogicalKey::Tab,
        LogicalKey::Enter,
        LogicalKey::ArrowUp,
        LogicalKey::ArrowDown,
        LogicalKey::CtrlArrowUp,
        LogicalKey::CtrlArrowDown,
    ];

    /// The terminal key request this panel key sends.
    pub fn request(self) -> KeyRequest {
        match self {
            LogicalKey::Escape => KeyRequest::plain(TerminalKey::Escape),
            LogicalKey::Tab => KeyRequest::plain(TerminalKey::Tab),
            LogicalKey::Enter => KeyRequest::plain(TerminalKey::Enter),
            LogicalKey::ArrowUp => KeyRequest::plain(TerminalKey::Up),
            LogicalKey::ArrowDown => KeyRequest::plain(TerminalKey::Down),
            LogicalKey::CtrlArrowUp => KeyRequest::new(TerminalKey::Up, Modifiers::CTRL),
            LogicalKey::CtrlArrowDown => KeyRequest::new(TerminalKey::Down, Modifiers::CTRL),
        }
    }

    /// Keys that auto-repeat while held on the default panel layout.
    ///
    /// Only the plain arrows repeat; Ctrl+arrows scroll whole pages in most
    /// TUIs and stay single-shot.
    pub fn default_repeatable() -> Vec<LogicalKey> {
        vec![LogicalKey::ArrowUp, LogicalKey::ArrowDown]
    }

    /// The intent produced by tapping this key on the default panel layout.
    pub fn panel_intent(self) -> KeyPressIntent {
        if Self::default_repeatable().contains(&self) {
            KeyPressIntent::Repeatable(self)
        } else {
            KeyPressIntent::SingleShot(self)
        }
    }

    /// Short label used in diagnostics (`"Ctrl+Up"`, `"Esc"`, ...).
    pub fn label(self) -> &'static str {
        match self {
            LogicalKey::Escape => "Esc",
            LogicalKey::Tab => "Tab",
            LogicalKey::Enter => "Enter",
            LogicalKey::ArrowUp => "Up",
            LogicalKey::ArrowDown => "Down",
            LogicalKey::CtrlArrowUp => "Ctrl+Up",
            LogicalKey::CtrlArrowDown => "Ctrl+Down",
        }
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a panel press should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPressIntent {
    /// Fire exactly once per discrete tap.
    SingleShot(LogicalKey),
    /// Fire once on press, then auto-repeat while held.
    Repeatable(LogicalKey),
}

impl KeyPressIntent {
    /// The logical key carried by this intent.
    pub fn key(self) -> LogicalKey {
        match self {
            KeyPressIntent::SingleShot(key) | KeyPressIntent::Repeatable(key) => key,
        }
    }
}

/// Keys understood by the terminal session's key handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalKey {
    Escape,
    Tab,
    Enter,
    Up,
    Down,
}

/// Modifier bit set asserted alongside a [`TerminalKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(1 << 0);
    pub const ALT: Modifiers = Modifiers(1 << 1);
    pub const CTRL: Modifiers = Modifiers(1 << 2);

    /// Returns `true` if Ctrl is asserted.
    pub fn ctrl(self) -> bool {
        self.0 & Self::CTRL.0 != 0
    }

    /// Returns `true` if Alt is asserted.
    pub fn alt(self) -> bool {
        self.0 & Self::ALT.0 != 0
    }

    /// Returns `true` if Shift is asserted.
    pub fn shift(self) -> bool {
        self.0 & Self::SHIFT.0 != 0
    }

    /// Returns `true` if no modifier is asserted.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

/// A key-event request for the terminal session: key identity plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRequest {
    pub key: TerminalKey,
    pub modifiers: Modifiers,
}

impl KeyRequest {
    /// A request with the given modifier set.
    pub const fn new(key: TerminalKey, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A request with no modifiers.
    pub const fn plain(key: TerminalKey) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// The xterm byte sequence a terminal would put on the wire for this key.
    pub fn xterm_bytes(&self) -> Vec<u8> {
        xterm::encode_key(self)
    }
}

impl fmt::Display for KeyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl() {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.alt() {
            f.write_str("Alt+")?;
        }
        if self.modifiers.shift() {
            f.write_str("Shift+")?;
        }
        write!(f, "{:?}", self.key)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

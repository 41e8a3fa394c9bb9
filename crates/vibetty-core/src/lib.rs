//! # vibetty-core
//!
//! Shared library for VibeTTY containing the key panel tables, the terminal
//! I/O diagnostic codec, and the bootstrap lifecycle types.
//!
//! This crate has zero dependencies on OS APIs, UI frameworks, async runtimes,
//! or the SSH engine.  Everything here is plain data plus pure functions.
//!
//! # Architecture overview (for beginners)
//!
//! VibeTTY is a mobile terminal/SSH client.  The screens are drawn by the
//! platform's UI toolkit, but the logic the screens depend on lives in Rust:
//!
//! - **`domain`** – The bootstrap lifecycle: is the app still loading, is a
//!   one-time data migration running or failed, or is it ready with a live
//!   terminal-session manager?
//!
//! - **`keys`** – The compact key panel (Esc, Tab, Enter, arrows, Ctrl+arrows)
//!   and the fixed table that turns each panel key into the request sent to the
//!   terminal session.
//!
//! - **`diagnostics`** – A debugging aid that renders raw terminal traffic as
//!   hex plus a control-escaped readable form, and the switch that decides
//!   whether anything is logged at all.

pub mod diagnostics;
pub mod domain;
pub mod keys;

pub use diagnostics::codec::{
    decode_hex, encode, encode_byte, DiagnosticRecord, Direction, HexDecodeError,
};
pub use diagnostics::gate::{DiagnosticGate, GateSource};
pub use domain::bootstrap::{
    AppScreen, BootstrapPhase, BootstrapState, ErrorInfo, InvalidStateTransition, MigrationError,
    MigrationEvent, MigrationProgress, MigrationScreen,
};
pub use keys::{KeyPressIntent, KeyRequest, LogicalKey, Modifiers, TerminalKey};

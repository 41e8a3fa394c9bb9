//! Application layer use cases.
//!
//! - **`bootstrap`** – The startup lifecycle state machine.  Driven by a
//!   `MigrationRunner`; publishes every state change to subscribers; creates
//!   the session manager once on the transition to `Ready`.
//!
//! - **`key_repeat`** – Press/hold/release timing for auto-repeating keys over
//!   a `TimerScheduler`.
//!
//! - **`dispatch_keys`** – Routes key panel gestures to the terminal session,
//!   through `key_repeat` for repeatable keys, and signals user interaction.
//!
//! - **`terminal_io`** – The gated call site for terminal I/O diagnostics.
//!
//! - **`timer`** – The cancellable one-shot timer port used by `key_repeat`.

pub mod bootstrap;
pub mod dispatch_keys;
pub mod key_repeat;
pub mod terminal_io;
pub mod timer;

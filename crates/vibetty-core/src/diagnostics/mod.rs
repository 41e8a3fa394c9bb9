//! Terminal I/O diagnostics: the text codec and the enabled switch.
//!
//! - **`codec`** – Renders a byte buffer as a [`codec::DiagnosticRecord`]: a
//!   lossless hex form plus a readable form with control characters escaped.
//!   Pure functions, no notion of "enabled".
//!
//! - **`gate`** – The [`gate::DiagnosticGate`] that call sites consult before
//!   encoding anything.  It is an explicit value handed to whoever logs, not
//!   ambient global state.

pub mod codec;
pub mod gate;

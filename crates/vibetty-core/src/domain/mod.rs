//! Domain entities for VibeTTY.
//!
//! Pure data and rules with no I/O, no clocks, no UI.  The application layer
//! in `vibetty-app` owns the mutable state machine; this module only says what
//! the states are and which moves between them are legal.

/// Bootstrap lifecycle states, events, and the legal-transition table.
pub mod bootstrap;

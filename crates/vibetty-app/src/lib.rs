//! vibetty-app library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/` and the
//! demo binary in `main.rs` share the same module tree.
//!
//! # What does vibetty-app do? (for beginners)
//!
//! The platform UI draws the screens; this crate owns the behaviour behind
//! them:
//!
//! 1. Decides what to show at startup (loading, migrating data, migration
//!    failed with a retry button, or the normal app) and creates the
//!    terminal-session manager exactly once when the app becomes ready.
//! 2. Turns taps and holds on the key panel into key requests for the terminal
//!    session, auto-repeating held arrow keys (500 ms delay, then every 50 ms).
//! 3. Optionally logs every byte sent to and received from the remote host in
//!    a hex + readable form for protocol debugging.
//!
//! Application code depends only on traits; the infrastructure layer provides
//! tokio-backed timers, `tracing` log sinks, TOML configuration, and the
//! loopback/simulated collaborators used by the demo binary.

/// Application layer: use cases and the traits they depend on.
pub mod application;

/// Infrastructure layer: timers, log sinks, configuration, demo collaborators.
pub mod infrastructure;

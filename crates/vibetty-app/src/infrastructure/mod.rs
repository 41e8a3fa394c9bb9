//! Infrastructure layer.
//!
//! Concrete adapters for the traits declared in `application`.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `vibetty_core`, but MUST NOT be imported by the `application` layer outside
//! of its tests.
//!
//! # Sub-modules
//!
//! - **`scheduler`** – `TokioScheduler` (real time) and `ManualScheduler`
//!   (virtual time for tests).
//!
//! - **`diagnostics`** – `TracingSink`, which writes terminal I/O records to
//!   the `terminal_io` tracing target, and the in-memory `MemorySink`.
//!
//! - **`storage`** – TOML configuration file loading and saving.
//!
//! - **`session`** – A loopback terminal session and its manager.
//!
//! - **`migration`** – A scripted migration runner.
//!
//! - **`panel`** – Idle tracking and soft keyboard state for the key panel.

pub mod diagnostics;
pub mod migration;
pub mod panel;
pub mod scheduler;
pub mod session;
pub mod storage;

//! Bootstrap lifecycle: what the app is doing between process start and having
//! a usable terminal-session manager.
//!
//! # The lifecycle (for beginners)
//!
//! On first launch after an upgrade the app may have to migrate its stored
//! data (hosts, keys, settings) to a new format.  Until that is done there is
//! nothing useful to show, so the UI displays one of four things:
//!
//! ```text
//!            ┌──────────┐  Completed (nothing to migrate)
//!            │ Loading  │────────────────────────────────┐
//!            └────┬─────┘                                │
//!        Progress │                                      ▼
//!            ┌────▼───────────────┐   Completed    ┌─────────┐
//!      ┌────►│ MigrationInProgress│───────────────►│  Ready  │ (absorbing)
//!      │     └────┬───────────────┘                └─────────┘
//! retry│   Failed │
//!      │     ┌────▼───────────┐
//!      └─────│ MigrationFailed│
//!            └────────────────┘
//! ```
//!
//! `Ready` is absorbing: once the session manager exists it lives until the
//! process exits.
//!
//! # One exhaustive match
//!
//! [`BootstrapState`] is a closed enum.  The UI boundary ([`AppScreen`]'s
//! `From` impl) matches it without a wildcard arm, so adding a state is a
//! compile error everywhere it is consumed.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Payloads ──────────────────────────────────────────────────────────────────

/// Progress reported by the migration runner.  Passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationProgress {
    /// Human-readable name of the current step (e.g. `"hosts"`).
    pub step: String,
    /// Units of work finished so far.
    pub completed: u64,
    /// Total units of work; 0 when unknown.
    pub total: u64,
}

impl MigrationProgress {
    pub fn new(step: impl Into<String>, completed: u64, total: u64) -> Self {
        Self { step: step.into(), completed, total }
    }

    /// Fraction in `0.0..=1.0`, or `None` when the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some((self.completed.min(self.total)) as f64 / self.total as f64)
        }
    }
}

/// User-facing description of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub cause: Option<String>,
}

/// A failed migration as reported by the runner.
///
/// Carries the user-facing error and an opaque debug log the user can copy
/// into a bug report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("migration failed: {message}")]
pub struct MigrationError {
    pub message: String,
    pub cause: Option<String>,
    pub debug_log: String,
}

impl MigrationError {
    pub fn new(message: impl Into<String>, debug_log: impl Into<String>) -> Self {
        Self { message: message.into(), cause: None, debug_log: debug_log.into() }
    }

    /// Attaches the underlying cause shown under the message.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Splits into the user-facing part and the debug log.
    pub fn into_parts(self) -> (ErrorInfo, String) {
        (ErrorInfo { message: self.message, cause: self.cause }, self.debug_log)
    }
}

/// Events reported by the migration runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvent {
    /// A migration is running (or has just started).
    Progress(MigrationProgress),
    /// The migration attempt failed.
    Failed(MigrationError),
    /// The migration finished, or there was nothing to migrate.
    Completed,
}

impl MigrationEvent {
    fn name(&self) -> &'static str {
        match self {
            MigrationEvent::Progress(_) => "Progress",
            MigrationEvent::Failed(_) => "Failed",
            MigrationEvent::Completed => "Completed",
        }
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Payload-free discriminant of [`BootstrapState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BootstrapPhase {
    Loading,
    MigrationInProgress,
    MigrationFailed,
    Ready,
}

impl BootstrapPhase {
    /// Whether `self → to` is a legal move.
    ///
    /// `MigrationInProgress → MigrationInProgress` is a progress update.
    pub fn can_transition_to(self, to: BootstrapPhase) -> bool {
        use BootstrapPhase::*;
        matches!(
            (self, to),
            (Loading, MigrationInProgress)
                | (Loading, Ready)
                | (MigrationInProgress, MigrationInProgress)
                | (MigrationInProgress, MigrationFailed)
                | (MigrationInProgress, Ready)
                | (MigrationFailed, MigrationInProgress)
        )
    }
}

/// The bootstrap state.  Exactly one variant is active at a time.
///
/// `M` is the terminal-session manager type; `Ready` holds a shared handle to
/// it but owns no data of its own.
pub enum BootstrapState<M: ?Sized> {
    Loading,
    MigrationInProgress { progress: MigrationProgress },
    MigrationFailed { error: ErrorInfo, debug_log: String },
    Ready { session_manager: Arc<M> },
}

impl<M: ?Sized> BootstrapState<M> {
    pub fn phase(&self) -> BootstrapPhase {
        match self {
            BootstrapState::Loading => BootstrapPhase::Loading,
            BootstrapState::MigrationInProgress { .. } => BootstrapPhase::MigrationInProgress,
            BootstrapState::MigrationFailed { .. } => BootstrapPhase::MigrationFailed,
            BootstrapState::Ready { .. } => BootstrapPhase::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BootstrapState::Ready { .. })
    }

    /// The session manager, once `Ready`.
    pub fn session_manager(&self) -> Option<&Arc<M>> {
        match self {
            BootstrapState::Ready { session_manager } => Some(session_manager),
            _ => None,
        }
    }
}

impl<M: ?Sized> Clone for BootstrapState<M> {
    fn clone(&self) -> Self {
        match self {
            BootstrapState::Loading => BootstrapState::Loading,
            BootstrapState::MigrationInProgress { progress } => {
                BootstrapState::MigrationInProgress { progress: progress.clone() }
            }
            BootstrapState::MigrationFailed { error, debug_log } => BootstrapState::MigrationFailed {
                error: error.clone(),
                debug_log: debug_log.clone(),
            },
            BootstrapState::Ready { session_manager } => {
                BootstrapState::Ready { session_manager: Arc::clone(session_manager) }
            }
        }
    }
}

impl<M: ?Sized> fmt::Debug for BootstrapState<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapState::Loading => f.write_str("Loading"),
            BootstrapState::MigrationInProgress { progress } => {
                f.debug_struct("MigrationInProgress").field("progress", progress).finish()
            }
            BootstrapState::MigrationFailed { error, debug_log } => f
                .debug_struct("MigrationFailed")
                .field("error", error)
                .field("debug_log", debug_log)
                .finish(),
            BootstrapState::Ready { .. } => f.debug_struct("Ready").finish_non_exhaustive(),
        }
    }
}

/// Two `Ready` states are equal only if they share the same manager instance.
impl<M: ?Sized> PartialEq for BootstrapState<M> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BootstrapState::Loading, BootstrapState::Loading) => true,
            (
                BootstrapState::MigrationInProgress { progress: a },
                BootstrapState::MigrationInProgress { progress: b },
            ) => a == b,
            (
                BootstrapState::MigrationFailed { error: e1, debug_log: d1 },
                BootstrapState::MigrationFailed { error: e2, debug_log: d2 },
            ) => e1 == e2 && d1 == d2,
            (
                BootstrapState::Ready { session_manager: a },
                BootstrapState::Ready { session_manager: b },
            ) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// An event or command that does not apply to the current state.
///
/// Internal only: these arise from benign races between the UI and the
/// runner and are logged and dropped, never surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{trigger} is not valid in state {from:?}")]
pub struct InvalidStateTransition {
    pub from: BootstrapPhase,
    pub trigger: &'static str,
}

impl InvalidStateTransition {
    pub fn for_event(from: BootstrapPhase, event: &MigrationEvent) -> Self {
        Self { from, trigger: event.name() }
    }

    pub fn for_command(from: BootstrapPhase, command: &'static str) -> Self {
        Self { from, trigger: command }
    }
}

// ── UI boundary ───────────────────────────────────────────────────────────────

/// What the migration screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationScreen {
    InProgress(MigrationProgress),
    Failed { error: ErrorInfo, debug_log: String },
}

/// The top-level screen the presentation layer should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppScreen {
    Loading,
    Migration(MigrationScreen),
    /// The normal app: host list, with the session manager available.
    HostList,
}

impl<M: ?Sized> From<&BootstrapState<M>> for AppScreen {
    fn from(state: &BootstrapState<M>) -> Self {
        match state {
            BootstrapState::Loading => AppScreen::Loading,
            BootstrapState::MigrationInProgress { progress } => {
                AppScreen::Migration(MigrationScreen::InProgress(progress.clone()))
            }
            BootstrapState::MigrationFailed { error, debug_log } => {
                AppScreen::Migration(MigrationScreen::Failed {
                    error: error.clone(),
                    debug_log: debug_log.clone(),
                })
            }
            BootstrapState::Ready { .. } => AppScreen::HostList,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

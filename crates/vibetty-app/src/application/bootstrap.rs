//! BootstrapStateMachine: owns the startup lifecycle state.
//!
//! The machine is driven from two sides:
//!
//! - the **migration runner** reports [`MigrationEvent`]s through
//!   [`BootstrapStateMachine::on_migration_event`];
//! - the **UI** calls [`BootstrapStateMachine::start`] once and
//!   [`BootstrapStateMachine::retry`] from the failure screen.
//!
//! Every state change is published, in order and without coalescing, to each
//! receiver obtained from [`BootstrapStateMachine::subscribe`].  A progress
//! state that is immediately followed by completion is still delivered.
//!
//! On the single transition to `Ready` the machine calls its
//! [`SessionManagerFactory`] and stores the manager in the `Ready` state.
//! The factory is consumed by that call, so at most one manager can ever
//! exist per machine.
//!
//! Events that do not apply to the current state (a late progress report
//! after `Ready`, say) are logged at debug level and ignored.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use vibetty_core::{
    AppScreen, BootstrapPhase, BootstrapState, InvalidStateTransition, MigrationEvent,
    MigrationProgress,
};

/// Runs the one-time data migration.
///
/// `start` kicks off an attempt and returns immediately; the outcome arrives
/// later as [`MigrationEvent`]s.  The machine never calls it while holding its
/// state lock.
#[cfg_attr(test, mockall::automock)]
pub trait MigrationRunner: Send + Sync {
    fn start(&self);
}

/// Creates the terminal-session manager.  Called at most once.
///
/// Runs with the state lock held, so it must not call back into the machine.
pub trait SessionManagerFactory<M: ?Sized>: Send {
    fn create(self: Box<Self>) -> Arc<M>;
}

impl<M, F> SessionManagerFactory<M> for F
where
    M: ?Sized,
    F: FnOnce() -> Arc<M> + Send,
{
    fn create(self: Box<Self>) -> Arc<M> {
        (*self)()
    }
}

struct Inner<M: ?Sized> {
    state: BootstrapState<M>,
    started: bool,
    factory: Option<Box<dyn SessionManagerFactory<M>>>,
    subscribers: Vec<UnboundedSender<BootstrapState<M>>>,
}

impl<M: ?Sized> Inner<M> {
    fn transition(&mut self, next: BootstrapState<M>) {
        let from = self.state.phase();
        let to = next.phase();
        debug_assert!(from.can_transition_to(to), "illegal transition {from:?} -> {to:?}");
        if from != to {
            info!(?from, ?to, "bootstrap state changed");
        }
        self.state = next;
        let state = &self.state;
        self.subscribers.retain(|tx| tx.send(state.clone()).is_ok());
    }
}

/// The startup lifecycle: `Loading`, migration in progress or failed, `Ready`.
pub struct BootstrapStateMachine<M: ?Sized> {
    runner: Arc<dyn MigrationRunner>,
    inner: Mutex<Inner<M>>,
}

impl<M> BootstrapStateMachine<M>
where
    M: ?Sized + Send + Sync + 'static,
{
    /// A machine in `Loading`.  Nothing happens until [`Self::start`].
    pub fn new(runner: Arc<dyn MigrationRunner>, factory: impl SessionManagerFactory<M> + 'static) -> Self {
        Self {
            runner,
            inner: Mutex::new(Inner {
                state: BootstrapState::Loading,
                started: false,
                factory: Some(Box::new(factory)),
                subscribers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<M>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_state(&self) -> BootstrapState<M> {
        self.lock().state.clone()
    }

    pub fn phase(&self) -> BootstrapPhase {
        self.lock().state.phase()
    }

    /// What the presentation layer should show right now.
    pub fn screen(&self) -> AppScreen {
        AppScreen::from(&self.lock().state)
    }

    /// The session manager, once `Ready`.
    pub fn session_manager(&self) -> Option<Arc<M>> {
        self.lock().state.session_manager().cloned()
    }

    /// Observes every state from now on.  The current state is delivered
    /// first.
    pub fn subscribe(&self) -> UnboundedReceiver<BootstrapState<M>> {
        let (tx, rx) = unbounded_channel();
        let mut inner = self.lock();
        if tx.send(inner.state.clone()).is_ok() {
            inner.subscribers.push(tx);
        }
        rx
    }

    /// Asks the runner to begin.  Only the first call in `Loading` does
    /// anything.
    pub fn start(&self) -> bool {
        {
            let mut inner = self.lock();
            let phase = inner.state.phase();
            if phase != BootstrapPhase::Loading || inner.started {
                debug!("{}", InvalidStateTransition::for_command(phase, "start"));
                return false;
            }
            inner.started = true;
        }
        self.runner.start();
        true
    }

    /// Applies a runner event.  Returns `false` if it was ignored.
    pub fn on_migration_event(&self, event: MigrationEvent) -> bool {
        use BootstrapPhase::{Loading, MigrationInProgress};

        let mut inner = self.lock();
        let from = inner.state.phase();
        match (from, event) {
            (Loading | MigrationInProgress, MigrationEvent::Progress(progress)) => {
                inner.transition(BootstrapState::MigrationInProgress { progress });
            }
            (Loading | MigrationInProgress, MigrationEvent::Failed(failure)) => {
                if from == Loading {
                    // A failure before any progress still passes through
                    // the in-progress screen.
                    inner.transition(BootstrapState::MigrationInProgress {
                        progress: MigrationProgress::default(),
                    });
                }
                warn!("data migration failed: {failure}");
                let (error, debug_log) = failure.into_parts();
                inner.transition(BootstrapState::MigrationFailed { error, debug_log });
            }
            (Loading | MigrationInProgress, MigrationEvent::Completed) => {
                let Some(factory) = inner.factory.take() else {
                    warn!("session manager factory already consumed");
                    return false;
                };
                let session_manager = factory.create();
                inner.transition(BootstrapState::Ready { session_manager });
            }
            (_, event) => {
                debug!("ignoring migration event: {}", InvalidStateTransition::for_event(from, &event));
                return false;
            }
        }
        true
    }

    /// Starts a new attempt from `MigrationFailed`.  No-op in any other state.
    pub fn retry(&self) -> bool {
        {
            let mut inner = self.lock();
            let phase = inner.state.phase();
            if phase != BootstrapPhase::MigrationFailed {
                debug!("{}", InvalidStateTransition::for_command(phase, "retry"));
                return false;
            }
            inner.transition(BootstrapState::MigrationInProgress {
                progress: MigrationProgress::default(),
            });
        }
        self.runner.start();
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vibetty_core::{ErrorInfo, MigrationError, MigrationScreen};

    #[derive(Debug)]
    struct SessionManager;

    type Machine = BootstrapStateMachine<SessionManager>;

    fn machine_with(runner: MockMigrationRunner) -> (Machine, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let machine = BootstrapStateMachine::new(Arc::new(runner), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(SessionManager)
        });
        (machine, created)
    }

    fn idle_runner() -> MockMigrationRunner {
        let mut runner = MockMigrationRunner::new();
        runner.expect_start().times(0);
        runner
    }

    fn failure() -> MigrationError {
        MigrationError::new("Could not upgrade host database", "step=hosts\nSQLITE_CORRUPT")
            .with_cause("database disk image is malformed")
    }

    fn drain(rx: &mut UnboundedReceiver<BootstrapState<SessionManager>>) -> Vec<BootstrapPhase> {
        let mut phases = Vec::new();
        while let Ok(state) = rx.try_recv() {
            phases.push(state.phase());
        }
        phases
    }

    // ── Forward path ──────────────────────────────────────────────────────────

    #[test]
    fn test_starts_in_loading() {
        let (machine, created) = machine_with(idle_runner());

        assert_eq!(machine.phase(), BootstrapPhase::Loading);
        assert_eq!(machine.screen(), AppScreen::Loading);
        assert!(machine.session_manager().is_none());
        assert_eq!(created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_start_invokes_runner_once() {
        // Arrange
        let mut runner = MockMigrationRunner::new();
        runner.expect_start().times(1).return_const(());
        let (machine, _) = machine_with(runner);

        // Act & Assert
        assert!(machine.start());
        assert!(!machine.start());
    }

    #[test]
    fn test_progress_then_completed_reaches_ready_with_one_manager() {
        // Arrange
        let (machine, created) = machine_with(idle_runner());

        // Act
        assert!(machine.on_migration_event(MigrationEvent::Progress(MigrationProgress::new("hosts", 1, 3))));
        assert!(machine.on_migration_event(MigrationEvent::Progress(MigrationProgress::new("hosts", 2, 3))));
        assert!(machine.on_migration_event(MigrationEvent::Completed));

        // Assert
        assert!(machine.current_state().is_ready());
        assert_eq!(machine.screen(), AppScreen::HostList);
        assert!(machine.session_manager().is_some());
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_completed_while_loading_skips_migration() {
        let (machine, created) = machine_with(idle_runner());
        let mut rx = machine.subscribe();

        assert!(machine.on_migration_event(MigrationEvent::Completed));

        assert_eq!(drain(&mut rx), vec![BootstrapPhase::Loading, BootstrapPhase::Ready]);
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ready_is_absorbing() {
        // Arrange
        let (machine, created) = machine_with(idle_runner());
        machine.on_migration_event(MigrationEvent::Completed);
        let manager = machine.session_manager();

        // Act
        assert!(!machine.on_migration_event(MigrationEvent::Progress(MigrationProgress::default())));
        assert!(!machine.on_migration_event(MigrationEvent::Failed(failure())));
        assert!(!machine.on_migration_event(MigrationEvent::Completed));

        // Assert
        assert!(machine.current_state().is_ready());
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&manager.unwrap(), &machine.session_manager().unwrap()));
    }

    // ── Failure and retry ─────────────────────────────────────────────────────

    #[test]
    fn test_failure_carries_error_and_debug_log_verbatim() {
        // Arrange
        let (machine, _) = machine_with(idle_runner());
        machine.on_migration_event(MigrationEvent::Progress(MigrationProgress::new("keys", 0, 1)));

        // Act
        machine.on_migration_event(MigrationEvent::Failed(failure()));

        // Assert
        assert_eq!(
            machine.screen(),
            AppScreen::Migration(MigrationScreen::Failed {
                error: ErrorInfo {
                    message: "Could not upgrade host database".into(),
                    cause: Some("database disk image is malformed".into()),
                },
                debug_log: "step=hosts\nSQLITE_CORRUPT".into(),
            })
        );
    }

    #[test]
    fn test_failure_while_loading_passes_through_in_progress() {
        let (machine, _) = machine_with(idle_runner());
        let mut rx = machine.subscribe();

        machine.on_migration_event(MigrationEvent::Failed(failure()));

        assert_eq!(
            drain(&mut rx),
            vec![
                BootstrapPhase::Loading,
                BootstrapPhase::MigrationInProgress,
                BootstrapPhase::MigrationFailed,
            ]
        );
    }

    #[test]
    fn test_retry_from_failed_restarts_runner() {
        // Arrange
        let mut runner = MockMigrationRunner::new();
        runner.expect_start().times(1).return_const(());
        let (machine, _) = machine_with(runner);
        machine.on_migration_event(MigrationEvent::Failed(failure()));

        // Act
        assert!(machine.retry());

        // Assert
        assert_eq!(
            machine.current_state(),
            BootstrapState::MigrationInProgress { progress: MigrationProgress::default() }
        );
    }

    #[test]
    fn test_retry_then_success() {
        let mut runner = MockMigrationRunner::new();
        runner.expect_start().times(1).return_const(());
        let (machine, created) = machine_with(runner);
        machine.on_migration_event(MigrationEvent::Failed(failure()));

        machine.retry();
        machine.on_migration_event(MigrationEvent::Completed);

        assert!(machine.current_state().is_ready());
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_outside_failed_is_noop() {
        // Arrange: the mock fails the test if start() is called.
        let (machine, _) = machine_with(idle_runner());

        // Act & Assert: Loading
        assert!(!machine.retry());
        assert_eq!(machine.phase(), BootstrapPhase::Loading);

        // In progress
        machine.on_migration_event(MigrationEvent::Progress(MigrationProgress::default()));
        assert!(!machine.retry());
        assert_eq!(machine.phase(), BootstrapPhase::MigrationInProgress);

        // Ready
        machine.on_migration_event(MigrationEvent::Completed);
        assert!(!machine.retry());
        assert!(machine.current_state().is_ready());
    }

    #[test]
    fn test_events_while_failed_are_ignored() {
        let (machine, _) = machine_with(idle_runner());
        machine.on_migration_event(MigrationEvent::Failed(failure()));

        assert!(!machine.on_migration_event(MigrationEvent::Completed));
        assert!(!machine.on_migration_event(MigrationEvent::Progress(MigrationProgress::default())));
        assert_eq!(machine.phase(), BootstrapPhase::MigrationFailed);
    }

    // ── Subscribers ───────────────────────────────────────────────────────────

    #[test]
    fn test_subscribers_see_every_transition_in_order() {
        // Arrange
        let (machine, _) = machine_with(idle_runner());
        let mut early = machine.subscribe();

        // Act
        machine.on_migration_event(MigrationEvent::Progress(MigrationProgress::new("hosts", 1, 2)));
        let mut late = machine.subscribe();
        machine.on_migration_event(MigrationEvent::Completed);

        // Assert
        assert_eq!(
            drain(&mut early),
            vec![BootstrapPhase::Loading, BootstrapPhase::MigrationInProgress, BootstrapPhase::Ready]
        );
        assert_eq!(drain(&mut late), vec![BootstrapPhase::MigrationInProgress, BootstrapPhase::Ready]);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let (machine, _) = machine_with(idle_runner());
        drop(machine.subscribe());

        machine.on_migration_event(MigrationEvent::Progress(MigrationProgress::default()));

        assert!(machine.lock().subscribers.is_empty());
    }
}

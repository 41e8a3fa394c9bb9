//! A scripted [`MigrationRunner`] for the demo binary and integration tests.
//!
//! Each `start()` spawns a task that walks through the configured steps,
//! reporting progress over a tokio channel, and then reports completion.  The
//! first `failing_attempts` attempts fail after their first step instead, so
//! the failure screen and retry path can be exercised.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use vibetty_core::{MigrationError, MigrationEvent, MigrationProgress};

use crate::application::bootstrap::MigrationRunner;

/// Runs a fake migration on a tokio runtime.
#[derive(Debug)]
pub struct SimulatedMigrationRunner {
    runtime: Handle,
    events: UnboundedSender<MigrationEvent>,
    steps: Vec<String>,
    step_delay: Duration,
    failing_attempts: usize,
    attempts: AtomicUsize,
}

impl SimulatedMigrationRunner {
    pub fn new(runtime: Handle, events: UnboundedSender<MigrationEvent>, steps: Vec<String>) -> Self {
        Self {
            runtime,
            events,
            steps,
            step_delay: Duration::from_millis(100),
            failing_attempts: 0,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    /// Makes the first `attempts` runs fail.
    pub fn failing_first(mut self, attempts: usize) -> Self {
        self.failing_attempts = attempts;
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl MigrationRunner for SimulatedMigrationRunner {
    fn start(&self) {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = attempt <= self.failing_attempts;
        let events = self.events.clone();
        let steps = self.steps.clone();
        let step_delay = self.step_delay;
        info!(attempt, "starting data migration");

        self.runtime.spawn(async move {
            let total = steps.len() as u64;
            for (done, step) in steps.iter().enumerate() {
                tokio::time::sleep(step_delay).await;
                let progress = MigrationProgress::new(step.as_str(), done as u64 + 1, total);
                if events.send(MigrationEvent::Progress(progress)).is_err() {
                    debug!("migration event receiver dropped");
                    return;
                }
                if fail {
                    let error = MigrationError::new(
                        format!("Could not migrate {step}"),
                        format!("attempt={attempt}\nstep={step}\nsimulated failure"),
                    )
                    .with_cause("simulated I/O error");
                    let _ = events.send(MigrationEvent::Failed(error));
                    return;
                }
            }
            let _ = events.send(MigrationEvent::Completed);
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    fn steps() -> Vec<String> {
        vec!["hosts".to_string(), "pubkeys".to_string()]
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_run_reports_progress_then_completed() {
        // Arrange
        let (tx, mut rx) = unbounded_channel();
        let runner = SimulatedMigrationRunner::new(Handle::current(), tx, steps());

        // Act
        runner.start();

        // Assert
        assert_eq!(
            rx.recv().await,
            Some(MigrationEvent::Progress(MigrationProgress::new("hosts", 1, 2)))
        );
        assert_eq!(
            rx.recv().await,
            Some(MigrationEvent::Progress(MigrationProgress::new("pubkeys", 2, 2)))
        );
        assert_eq!(rx.recv().await, Some(MigrationEvent::Completed));
        assert_eq!(runner.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_attempt_then_success() {
        // Arrange
        let (tx, mut rx) = unbounded_channel();
        let runner = SimulatedMigrationRunner::new(Handle::current(), tx, steps()).failing_first(1);

        // Act & Assert: first attempt fails after one step.
        runner.start();
        assert!(matches!(rx.recv().await, Some(MigrationEvent::Progress(_))));
        match rx.recv().await {
            Some(MigrationEvent::Failed(error)) => {
                assert_eq!(error.message, "Could not migrate hosts");
                assert!(error.debug_log.contains("attempt=1"));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        // Second attempt succeeds.
        runner.start();
        let mut last = None;
        while let Some(event) = rx.recv().await {
            let done = event == MigrationEvent::Completed;
            last = Some(event);
            if done {
                break;
            }
        }
        assert_eq!(last, Some(MigrationEvent::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_steps_completes_immediately() {
        let (tx, mut rx) = unbounded_channel();
        let runner = SimulatedMigrationRunner::new(Handle::current(), tx, Vec::new());

        runner.start();

        assert_eq!(rx.recv().await, Some(MigrationEvent::Completed));
    }
}

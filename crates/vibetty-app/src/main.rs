//! VibeTTY core demo entry point.
//!
//! Drives the application core end to end without a UI:
//!
//! ```text
//! main()
//!  └─ load config            -- keys timing, log level, diagnostics switch
//!  └─ BootstrapStateMachine  -- simulated migration (fails once, retried)
//!       └─ Ready             -- LoopbackSessionManager created exactly once
//!  └─ KeyDispatchTable       -- taps and a held arrow key on a loopback session
//! ```
//!
//! Run with terminal I/O diagnostics visible:
//!
//! ```bash
//! RUST_LOG=info,terminal_io=trace VIBETTY_TERMINAL_IO=true vibetty-demo
//! ```
//!
//! An optional first argument names the config file to use instead of the
//! platform default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::runtime::Handle;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vibetty_app::application::bootstrap::BootstrapStateMachine;
use vibetty_app::application::dispatch_keys::KeyDispatchTable;
use vibetty_app::application::terminal_io::TerminalIoLogger;
use vibetty_app::infrastructure::diagnostics::TracingSink;
use vibetty_app::infrastructure::migration::SimulatedMigrationRunner;
use vibetty_app::infrastructure::panel::{IdleTimer, ImeState};
use vibetty_app::infrastructure::scheduler::TokioScheduler;
use vibetty_app::infrastructure::session::LoopbackSessionManager;
use vibetty_app::infrastructure::storage::config::{self, AppConfig};
use vibetty_core::{AppScreen, LogicalKey, MigrationScreen};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from).or_else(|| config::config_file_path().ok());
    let (cfg, config_error) = match config_path.as_deref().map(config::load_config) {
        Some(Ok(cfg)) => (cfg, None),
        Some(Err(e)) => (AppConfig::default(), Some(e)),
        None => (AppConfig::default(), None),
    };

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.logging.log_level)),
        )
        .init();

    info!("VibeTTY demo starting");
    if let Some(e) = config_error {
        warn!("using default configuration: {e}");
    }

    let io_logger = TerminalIoLogger::new(Arc::new(cfg.diagnostics.gate()), Arc::new(TracingSink));

    // ── Bootstrap ─────────────────────────────────────────────────────────────
    let (events_tx, mut events_rx) = unbounded_channel();
    let runner = SimulatedMigrationRunner::new(
        Handle::current(),
        events_tx,
        vec!["hosts".into(), "pubkeys".into(), "port forwards".into()],
    )
    .with_step_delay(Duration::from_millis(150))
    .failing_first(1);

    let manager_logger = io_logger.clone();
    let machine = Arc::new(BootstrapStateMachine::<LoopbackSessionManager>::new(Arc::new(runner), move || {
        Arc::new(LoopbackSessionManager::new(manager_logger))
    }));

    let pump = {
        let machine = Arc::clone(&machine);
        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                machine.on_migration_event(event);
            }
        })
    };

    let mut states = machine.subscribe();
    machine.start();

    while let Some(state) = states.recv().await {
        match AppScreen::from(&state) {
            AppScreen::Loading => info!("screen: loading"),
            AppScreen::Migration(MigrationScreen::InProgress(progress)) => {
                info!(step = %progress.step, completed = progress.completed, total = progress.total, "screen: migrating");
            }
            AppScreen::Migration(MigrationScreen::Failed { error, debug_log }) => {
                warn!(cause = ?error.cause, "screen: migration failed: {}", error.message);
                info!("debug log:\n{debug_log}");
                info!("user pressed retry");
                machine.retry();
            }
            AppScreen::HostList => {
                info!("screen: host list");
                break;
            }
        }
    }
    pump.abort();

    let manager = machine.session_manager().context("bootstrap ended without a session manager")?;
    let session = manager.open("demo.example.org");

    // ── Key panel ─────────────────────────────────────────────────────────────
    let scheduler = Arc::new(TokioScheduler::new(Handle::current()));
    let idle = Arc::new(IdleTimer::new(scheduler.clone()));
    let ime = Arc::new(ImeState::new(true));
    let panel = KeyDispatchTable::new(
        session.clone(),
        idle.clone(),
        ime.clone(),
        scheduler,
        cfg.keys.timing(),
        cfg.keys.repeatable.clone(),
        io_logger.clone(),
    );

    for key in [LogicalKey::Escape, LogicalKey::Tab, LogicalKey::CtrlArrowUp] {
        panel.press(key);
        panel.release(key);
    }

    let hold = Duration::from_millis(1200);
    panel.press(LogicalKey::ArrowDown);
    tokio::time::sleep(hold).await;
    panel.release(LogicalKey::ArrowDown);

    panel.toggle_ime(ime.is_visible());
    let prompt = b"\x1b[2J\x1b[Hdemo$ ";
    session.receive(prompt, 0, prompt.len());
    panel.teardown();

    info!(
        bytes_sent = session.written().len(),
        interactions = idle.interactions(),
        ime_visible = ime.is_visible(),
        "VibeTTY demo finished"
    );
    Ok(())
}

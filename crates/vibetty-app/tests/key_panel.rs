//! Integration tests for the key panel.
//!
//! Drives `KeyDispatchTable` against a loopback terminal session and checks
//! the bytes on the wire, the diagnostics produced and the interaction count.
//! Repeat timing is checked twice: on the virtual `ManualScheduler` clock and
//! on a paused tokio runtime through the production `TokioScheduler`.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use vibetty_app::application::dispatch_keys::KeyDispatchTable;
use vibetty_app::application::key_repeat::RepeatTiming;
use vibetty_app::application::terminal_io::TerminalIoLogger;
use vibetty_app::application::timer::TimerScheduler;
use vibetty_app::infrastructure::diagnostics::mock::MemorySink;
use vibetty_app::infrastructure::panel::{IdleTimer, ImeState};
use vibetty_app::infrastructure::scheduler::{ManualScheduler, TokioScheduler};
use vibetty_app::infrastructure::session::LoopbackSession;
use vibetty_core::{DiagnosticGate, KeyPressIntent, LogicalKey};

struct Panel {
    table: KeyDispatchTable,
    session: Arc<LoopbackSession>,
    diagnostics: Arc<MemorySink>,
    idle: Arc<IdleTimer>,
    ime: Arc<ImeState>,
}

fn panel(scheduler: Arc<dyn TimerScheduler>, diagnostics_enabled: bool) -> Panel {
    let diagnostics = Arc::new(MemorySink::new());
    let logger = TerminalIoLogger::new(Arc::new(DiagnosticGate::fixed(diagnostics_enabled)), diagnostics.clone());
    let session = Arc::new(LoopbackSession::new("test.host", logger.clone()));
    let idle = Arc::new(IdleTimer::new(scheduler.clone()));
    let ime = Arc::new(ImeState::new(false));
    let table = KeyDispatchTable::new(
        session.clone(),
        idle.clone(),
        ime.clone(),
        scheduler,
        RepeatTiming::default(),
        LogicalKey::default_repeatable(),
        logger,
    );
    Panel { table, session, diagnostics, idle, ime }
}

fn repeated(bytes: &[u8], times: usize) -> Vec<u8> {
    bytes.iter().copied().cycle().take(bytes.len() * times).collect()
}

// ── Virtual clock ─────────────────────────────────────────────────────────────

#[test]
fn test_default_layout_taps_send_expected_sequences() {
    // Arrange
    let scheduler = Arc::new(ManualScheduler::new());
    let p = panel(scheduler.clone(), false);

    // Act
    for key in LogicalKey::ALL {
        p.table.dispatch(key.panel_intent());
        p.table.release(key);
    }
    scheduler.advance(Duration::from_secs(1));

    // Assert
    assert_eq!(p.session.written(), b"\x1b\t\r\x1b[A\x1b[B\x1b[1;5A\x1b[1;5B".to_vec());
    assert_eq!(p.idle.interactions(), LogicalKey::ALL.len());
}

#[test]
fn test_held_arrow_for_1200ms_sends_fifteen_ups() {
    // Arrange
    let scheduler = Arc::new(ManualScheduler::new());
    let p = panel(scheduler.clone(), false);

    // Act
    p.table.press(LogicalKey::ArrowUp);
    scheduler.advance(Duration::from_millis(1200));
    p.table.release(LogicalKey::ArrowUp);
    scheduler.advance(Duration::from_millis(300));

    // Assert
    assert_eq!(p.session.written(), repeated(b"\x1b[A", 15));
    assert_eq!(p.idle.interactions(), 15);
    assert_eq!(p.idle.idle_for(), Duration::from_millis(300));
}

#[test]
fn test_ctrl_arrows_do_not_repeat_on_default_layout() {
    let scheduler = Arc::new(ManualScheduler::new());
    let p = panel(scheduler.clone(), false);

    p.table.dispatch(KeyPressIntent::SingleShot(LogicalKey::CtrlArrowDown));
    scheduler.advance(Duration::from_secs(2));

    assert_eq!(p.session.written(), b"\x1b[1;5B".to_vec());
    assert!(!p.table.is_repeating(LogicalKey::CtrlArrowDown));
}

#[test]
fn test_diagnostics_show_each_key_in_hex_and_readable_form() {
    // Arrange
    let scheduler = Arc::new(ManualScheduler::new());
    let p = panel(scheduler, true);

    // Act
    p.table.press(LogicalKey::CtrlArrowUp);

    // Assert
    assert_eq!(p.diagnostics.lines(), vec!["SEND [6 bytes]: 1b 5b 31 3b 35 41", "SEND readable: ESC[1;5A"]);
    assert_eq!(p.diagnostics.key_events().len(), 1);
    assert_eq!(p.diagnostics.key_events()[0].1, "panel Ctrl+Up");
}

#[test]
fn test_closed_session_drops_keys_but_counts_interaction() {
    let scheduler = Arc::new(ManualScheduler::new());
    let p = panel(scheduler, false);
    p.session.close();

    p.table.press(LogicalKey::Enter);

    assert!(p.session.written().is_empty());
    assert_eq!(p.idle.interactions(), 1);
}

#[test]
fn test_keyboard_button_toggles_ime() {
    let scheduler = Arc::new(ManualScheduler::new());
    let p = panel(scheduler, false);

    p.table.toggle_ime(p.ime.is_visible());
    assert!(p.ime.is_visible());

    p.table.toggle_ime(p.ime.is_visible());
    assert!(!p.ime.is_visible());
    assert_eq!(p.idle.interactions(), 2);
}

// ── Tokio clock ───────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_tokio_hold_560ms_sends_two_events() {
    // Arrange
    let p = panel(Arc::new(TokioScheduler::new(Handle::current())), false);

    // Act
    p.table.press(LogicalKey::ArrowDown);
    tokio::time::sleep(Duration::from_millis(560)).await;
    p.table.release(LogicalKey::ArrowDown);
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Assert
    assert_eq!(p.session.written(), repeated(b"\x1b[B", 2));
}

#[tokio::test(start_paused = true)]
async fn test_tokio_quick_tap_sends_one_event() {
    let p = panel(Arc::new(TokioScheduler::new(Handle::current())), false);

    p.table.press(LogicalKey::ArrowUp);
    tokio::time::sleep(Duration::from_millis(120)).await;
    p.table.release(LogicalKey::ArrowUp);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(p.session.written(), b"\x1b[A".to_vec());
}

async fn tokio_hold_up(millis: u64) -> usize {
    let p = panel(Arc::new(TokioScheduler::new(Handle::current())), false);

    p.table.press(LogicalKey::ArrowUp);
    tokio::time::sleep(Duration::from_millis(millis)).await;
    p.table.release(LogicalKey::ArrowUp);
    tokio::time::sleep(Duration::from_secs(1)).await;

    let written = p.session.written();
    assert_eq!(written.len() % 3, 0, "{written:?}");
    assert_eq!(written, repeated(b"\x1b[A", written.len() / 3));
    written.len() / 3
}

#[tokio::test(start_paused = true)]
async fn test_tokio_release_at_first_tick_instant_counts_the_tick() {
    assert_eq!(tokio_hold_up(550).await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_tokio_release_at_second_tick_instant_counts_the_tick() {
    assert_eq!(tokio_hold_up(600).await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_tokio_hold_1200ms_sends_fifteen_events() {
    assert_eq!(tokio_hold_up(1200).await, 15);
}

#[tokio::test(start_paused = true)]
async fn test_tokio_hold_between_ticks_stays_on_grid() {
    assert_eq!(tokio_hold_up(1225).await, 15);
}

#[tokio::test(start_paused = true)]
async fn test_tokio_teardown_stops_repeat() {
    let p = panel(Arc::new(TokioScheduler::new(Handle::current())), false);

    p.table.press(LogicalKey::ArrowDown);
    tokio::time::sleep(Duration::from_millis(550)).await;
    p.table.teardown();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(p.session.written(), repeated(b"\x1b[B", 2));
}

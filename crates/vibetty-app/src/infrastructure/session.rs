//! Loopback terminal session used by the demo binary and integration tests.
//!
//! There is no remote host: key requests are rendered to their xterm byte
//! sequences and appended to an in-memory "wire", and [`LoopbackSession::receive`]
//! stands in for output arriving from the host.  Both directions go through
//! the [`TerminalIoLogger`], exactly where a real session would call it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use vibetty_core::KeyRequest;

use crate::application::dispatch_keys::{SessionError, TerminalSession};
use crate::application::terminal_io::TerminalIoLogger;

/// A [`TerminalSession`] that records what it would send.
#[derive(Debug)]
pub struct LoopbackSession {
    host: String,
    io_logger: TerminalIoLogger,
    wire: Mutex<Vec<u8>>,
    received: Mutex<Vec<u8>>,
    closed: AtomicBool,
}

impl LoopbackSession {
    pub fn new(host: impl Into<String>, io_logger: TerminalIoLogger) -> Self {
        Self {
            host: host.into(),
            io_logger,
            wire: Mutex::new(Vec::new()),
            received: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Everything sent so far.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.wire).clone()
    }

    /// Everything received so far.
    pub fn output(&self) -> Vec<u8> {
        lock(&self.received).clone()
    }

    /// Feeds `len` bytes of `buffer` from `offset` in as host output.
    pub fn receive(&self, buffer: &[u8], offset: usize, len: usize) {
        self.io_logger.log_received(buffer, offset, len);
        let start = offset.min(buffer.len());
        let end = start.saturating_add(len).min(buffer.len());
        lock(&self.received).extend_from_slice(&buffer[start..end]);
    }

    /// Further sends fail with [`SessionError::Closed`].
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(host = %self.host, "loopback session closed");
        }
    }
}

impl TerminalSession for LoopbackSession {
    fn send_key(&self, request: KeyRequest) -> Result<(), SessionError> {
        self.send_bytes(&request.xterm_bytes())
    }

    fn send_bytes(&self, bytes: &[u8]) -> Result<(), SessionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::Closed);
        }
        self.io_logger.log_sent(bytes);
        lock(&self.wire).extend_from_slice(bytes);
        Ok(())
    }
}

/// Opens loopback sessions.  Created once when bootstrap reaches `Ready`.
#[derive(Debug)]
pub struct LoopbackSessionManager {
    io_logger: TerminalIoLogger,
    sessions: Mutex<Vec<Arc<LoopbackSession>>>,
}

impl LoopbackSessionManager {
    pub fn new(io_logger: TerminalIoLogger) -> Self {
        Self { io_logger, sessions: Mutex::new(Vec::new()) }
    }

    pub fn open(&self, host: &str) -> Arc<LoopbackSession> {
        let session = Arc::new(LoopbackSession::new(host, self.io_logger.clone()));
        lock(&self.sessions).push(Arc::clone(&session));
        debug!(host, "loopback session opened");
        session
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

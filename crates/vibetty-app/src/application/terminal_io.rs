//! TerminalIoLogger: the gated call site for terminal I/O diagnostics.
//!
//! The terminal session calls this on every send and receive.  When the
//! [`DiagnosticGate`] is closed each call returns after a single atomic load;
//! when it is open the bytes are encoded with the diagnostic codec and the
//! resulting [`DiagnosticRecord`] is handed to a [`DiagnosticSink`].
//!
//! The default sink (`TracingSink` in the infrastructure layer) writes the
//! records as `trace!` lines under the `terminal_io` target.

use std::sync::Arc;

use vibetty_core::{encode, encode_byte, DiagnosticGate, DiagnosticRecord, Direction, KeyRequest};

/// Destination for encoded diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// A block of bytes sent or received.
    fn record(&self, record: &DiagnosticRecord);

    /// A key request about to be sent, with a short description of where it
    /// came from (e.g. `"panel Up"`).
    fn key_event(&self, request: &KeyRequest, description: &str);
}

/// Encodes terminal traffic for the [`DiagnosticSink`] while the gate is open.
#[derive(Clone)]
pub struct TerminalIoLogger {
    gate: Arc<DiagnosticGate>,
    sink: Arc<dyn DiagnosticSink>,
}

impl TerminalIoLogger {
    pub fn new(gate: Arc<DiagnosticGate>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { gate, sink }
    }

    /// A logger whose gate is permanently closed.
    pub fn disabled() -> Self {
        Self::new(Arc::new(DiagnosticGate::fixed(false)), Arc::new(NullSink))
    }

    pub fn gate(&self) -> &DiagnosticGate {
        &self.gate
    }

    pub fn is_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    pub fn log_sent(&self, bytes: &[u8]) {
        if self.gate.is_enabled() {
            self.sink.record(&encode(bytes, Direction::Sent));
        }
    }

    pub fn log_sent_byte(&self, byte: u8) {
        if self.gate.is_enabled() {
            self.sink.record(&encode_byte(byte, Direction::Sent));
        }
    }

    /// Logs `len` bytes of `data` starting at `offset`.
    ///
    /// The range is clamped to `data`, so a short read reported with a stale
    /// length logs what is there instead of panicking.
    pub fn log_received(&self, data: &[u8], offset: usize, len: usize) {
        if !self.gate.is_enabled() {
            return;
        }
        let start = offset.min(data.len());
        let end = start.saturating_add(len).min(data.len());
        self.sink.record(&encode(&data[start..end], Direction::Received));
    }

    pub fn log_key_event(&self, request: &KeyRequest, description: &str) {
        if self.gate.is_enabled() {
            self.sink.key_event(request, description);
        }
    }
}

impl std::fmt::Debug for TerminalIoLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalIoLogger").field("gate", &self.gate).finish_non_exhaustive()
    }
}

struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _: &DiagnosticRecord) {}
    fn key_event(&self, _: &KeyRequest, _: &str) {}
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! In-memory diagnostic sink for tests.
//!
//! Records are pushed into `Mutex<Vec<...>>` fields in call order, so a test
//! can assert exactly what the logger produced.

use std::sync::{Mutex, PoisonError};

use vibetty_core::{DiagnosticRecord, KeyRequest};

use crate::application::terminal_io::DiagnosticSink;

/// A [`DiagnosticSink`] that keeps everything it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<DiagnosticRecord>>,
    key_events: Mutex<Vec<(KeyRequest, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the byte records received so far.
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Snapshot of the key events received so far.
    pub fn key_events(&self) -> Vec<(KeyRequest, String)> {
        self.key_events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Every record rendered as log lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.records()
            .iter()
            .flat_map(|record| [record.hex_line(), record.readable_line()])
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, record: &DiagnosticRecord) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(record.clone());
    }

    fn key_event(&self, request: &KeyRequest, description: &str) {
        self.key_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((*request, description.to_string()));
    }
}

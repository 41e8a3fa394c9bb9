//! [`DiagnosticSink`] implementations.
//!
//! - `TracingSink` (here) writes records through `tracing` under the
//!   `terminal_io` target, so they can be filtered independently:
//!
//!   ```bash
//!   RUST_LOG=info,terminal_io=trace VIBETTY_TERMINAL_IO=true vibetty-demo
//!   ```
//!
//! - **`mock`** – `MemorySink`, which keeps records in memory for tests.

pub mod mock;

use tracing::{debug, trace};
use vibetty_core::{DiagnosticRecord, KeyRequest};

use crate::application::terminal_io::DiagnosticSink;

/// Log target for terminal I/O lines.
pub const TERMINAL_IO_TARGET: &str = "terminal_io";

/// Emits each record as two `trace!` lines (hex, then readable).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, record: &DiagnosticRecord) {
        trace!(target: TERMINAL_IO_TARGET, "{}", record.hex_line());
        trace!(target: TERMINAL_IO_TARGET, "{}", record.readable_line());
    }

    fn key_event(&self, request: &KeyRequest, description: &str) {
        debug!(target: TERMINAL_IO_TARGET, "KEY {request}: {description}");
    }
}

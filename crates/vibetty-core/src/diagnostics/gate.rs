//! The switch that decides whether terminal I/O is logged at all.
//!
//! Terminal I/O logging is off by default.  It is turned on out-of-band, e.g.
//!
//! ```bash
//! VIBETTY_TERMINAL_IO=true vibetty-demo
//! ```
//!
//! or with `[diagnostics] terminal_io = true` in the config file.
//!
//! # Lazy, cached, resettable
//!
//! The source is consulted on the first [`DiagnosticGate::is_enabled`] call and
//! the answer is cached.  [`DiagnosticGate::reset`] forgets the cached answer so
//! the next query looks again (useful if the environment changed at runtime);
//! [`DiagnosticGate::set_enabled`] overrides the answer outright (useful in
//! tests).
//!
//! The cache is a single atomic.  Two threads racing on the first query may
//! both evaluate the source; both compute the same answer, so the duplicate
//! work is harmless and no lock is needed.  A reader may briefly see a stale
//! value after `set_enabled` on another thread, which is acceptable for a
//! debugging switch.
//!
//! # Failures
//!
//! A source that cannot be read (variable missing, not valid UTF-8, custom
//! lookup error) means "disabled".  The gate never returns an error.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

/// Environment variable consulted by [`DiagnosticGate::from_env`].
pub const TERMINAL_IO_ENV: &str = "VIBETTY_TERMINAL_IO";

const UNKNOWN: u8 = 0;
const DISABLED: u8 = 1;
const ENABLED: u8 = 2;

type LookupFn = dyn Fn() -> Result<Option<String>, String> + Send + Sync;

/// Where the gate reads its value from.
#[derive(Clone)]
pub enum GateSource {
    /// An environment variable; `"true"` (any case) enables.
    Env(String),
    /// A value fixed at construction, e.g. from the config file.
    Fixed(bool),
    /// A caller-supplied property lookup.
    Custom(Arc<LookupFn>),
}

impl fmt::Debug for GateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateSource::Env(name) => f.debug_tuple("Env").field(name).finish(),
            GateSource::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            GateSource::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Enabled switch for terminal I/O diagnostics.
///
/// Handed explicitly to the logging call site; share it with `Arc` when more
/// than one component needs it.
#[derive(Debug)]
pub struct DiagnosticGate {
    source: GateSource,
    state: AtomicU8,
}

impl DiagnosticGate {
    /// A gate backed by `source`, evaluated lazily.
    pub fn new(source: GateSource) -> Self {
        Self { source, state: AtomicU8::new(UNKNOWN) }
    }

    /// A gate backed by the [`TERMINAL_IO_ENV`] environment variable.
    pub fn from_env() -> Self {
        Self::new(GateSource::Env(TERMINAL_IO_ENV.to_string()))
    }

    /// A gate with a fixed answer.
    pub fn fixed(enabled: bool) -> Self {
        Self::new(GateSource::Fixed(enabled))
    }

    /// A gate backed by a custom property lookup.
    ///
    /// The closure returns `Ok(None)` when the property is unset and `Err` when
    /// the lookup mechanism itself is unavailable; both mean "disabled".
    pub fn custom<F>(lookup: F) -> Self
    where
        F: Fn() -> Result<Option<String>, String> + Send + Sync + 'static,
    {
        Self::new(GateSource::Custom(Arc::new(lookup)))
    }

    /// Whether logging is enabled.  Evaluates the source on first use.
    pub fn is_enabled(&self) -> bool {
        match self.state.load(Ordering::Relaxed) {
            ENABLED => true,
            DISABLED => false,
            _ => {
                let enabled = self.evaluate();
                let value = if enabled { ENABLED } else { DISABLED };
                // An override that landed while we were evaluating wins.
                match self.state.compare_exchange(UNKNOWN, value, Ordering::Relaxed, Ordering::Relaxed) {
                    Ok(_) => {
                        if enabled {
                            info!("Terminal I/O logging ENABLED");
                        }
                        enabled
                    }
                    Err(current) => current == ENABLED,
                }
            }
        }
    }

    /// Forces the gate on or off, bypassing the source.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.store(if enabled { ENABLED } else { DISABLED }, Ordering::Relaxed);
        info!("Terminal I/O logging {}", if enabled { "ENABLED" } else { "DISABLED" });
    }

    /// Forgets the cached answer; the next query re-reads the source.
    pub fn reset(&self) {
        self.state.store(UNKNOWN, Ordering::Relaxed);
    }

    fn evaluate(&self) -> bool {
        let value = match &self.source {
            GateSource::Fixed(enabled) => return *enabled,
            GateSource::Env(name) => std::env::var(name).ok(),
            GateSource::Custom(lookup) => match lookup() {
                Ok(value) => value,
                Err(e) => {
                    debug!("diagnostic gate lookup failed, treating as disabled: {e}");
                    None
                }
            },
        };
        value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

impl Default for DiagnosticGate {
    fn default() -> Self {
        Self::from_env()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! TOML configuration for the VibeTTY core.
//!
//! The default location is:
//! - Linux:    `$XDG_CONFIG_HOME/vibetty/config.toml` (or `~/.config/vibetty/`)
//! - macOS:    `~/Library/Application Support/VibeTTY/config.toml`
//! - Windows:  `%APPDATA%\VibeTTY\config.toml`
//!
//! Example:
//!
//! ```toml
//! [logging]
//! log_level = "debug"
//!
//! [keys]
//! initial_delay_ms = 400
//! repeat_interval_ms = 33
//! repeatable = ["ArrowUp", "ArrowDown"]
//!
//! [diagnostics]
//! terminal_io = true
//! ```
//!
//! Every field has a `#[serde(default = "...")]`, so an empty file, a missing
//! section or a file from an older version all load cleanly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vibetty_core::{DiagnosticGate, LogicalKey};

use crate::application::key_repeat::{RepeatTiming, DEFAULT_INITIAL_DELAY, DEFAULT_REPEAT_INTERVAL};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Key panel behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeysConfig {
    /// Hold time before auto-repeat starts.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Time between repeats once repeating.
    #[serde(default = "default_repeat_interval_ms")]
    pub repeat_interval_ms: u64,
    /// Keys that auto-repeat while held.
    #[serde(default = "LogicalKey::default_repeatable")]
    pub repeatable: Vec<LogicalKey>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticsConfig {
    /// Forces terminal I/O logging on or off.  When absent the
    /// `VIBETTY_TERMINAL_IO` environment variable decides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_io: Option<bool>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_DELAY.as_millis() as u64
}
fn default_repeat_interval_ms() -> u64 {
    DEFAULT_REPEAT_INTERVAL.as_millis() as u64
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            repeat_interval_ms: default_repeat_interval_ms(),
            repeatable: LogicalKey::default_repeatable(),
        }
    }
}

impl KeysConfig {
    pub fn timing(&self) -> RepeatTiming {
        RepeatTiming::from_millis(self.initial_delay_ms, self.repeat_interval_ms)
    }
}

impl DiagnosticsConfig {
    /// The gate for terminal I/O logging described by this section.
    pub fn gate(&self) -> DiagnosticGate {
        match self.terminal_io {
            Some(enabled) => DiagnosticGate::fixed(enabled),
            None => DiagnosticGate::from_env(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io { path: path.to_path_buf(), source }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|source| ConfigError::Io { path: dir.to_path_buf(), source })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("VibeTTY"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("VibeTTY"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("vibetty"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

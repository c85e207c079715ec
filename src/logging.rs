// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Logging setup and structured lifecycle helpers.
//!
//! ## Why This Module Exists
//!
//! An accelerator session fails in places the host cannot see: a driver that
//! refuses a context, a transfer that never completes, a build log nobody
//! printed. Tracing every lifecycle step (discovery, allocation, staging,
//! dispatch, release) is how a failure on someone else's machine gets
//! diagnosed without a debugger attached.
//!
//! The computed grid is the only thing written to stdout, so every log line
//! goes to stderr. Levels follow `RUST_LOG` when it is set and fall back to
//! the configured default otherwise.
//!
//! Field names used by the helpers below are stable:
//!
//! - `direction` / `slot` / `element` / `bytes` for host ↔ device transfers
//! - `allocated_bytes` / `peak_bytes` / `context` for memory accounting

use std::fmt;
use std::sync::Once;

/// Configuration for logging initialization.
///
/// ## Why This Struct
///
/// The binary wants timestamps and colors on a terminal; test runs want
/// quiet, undecorated lines the harness can capture. Both go through the
/// same [`init_logging`] call with a different config.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level when `RUST_LOG` is not set.
    pub default_level: LogLevel,
    /// Include timestamps in log output.
    pub with_timestamps: bool,
    /// Include target (module path) in log output.
    pub with_target: bool,
    /// Include source file and line numbers.
    pub with_file_line: bool,
    /// Use ANSI colors (disable for file output).
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Warn,
            with_timestamps: true,
            with_target: true,
            with_file_line: false,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// Minimal preset for test runs.
    #[must_use]
    pub fn testing() -> Self {
        Self {
            default_level: LogLevel::Warn,
            with_timestamps: false,
            with_target: false,
            with_file_line: false,
            with_ansi: false,
        }
    }
}

/// Log level enumeration.
///
/// Maps to tracing levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and above.
    #[default]
    Warn,
    /// Informational messages and above.
    Info,
    /// Debug messages and above.
    Debug,
    /// All messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert to a tracing filter string.
    fn as_filter_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Guard ensuring logging is only initialized once.
static INIT_LOGGING: Once = Once::new();

/// Install the global tracing subscriber.
///
/// Safe to call more than once; only the first call has an effect. The
/// subscriber writes to stderr.
///
/// ```rust
/// use vector_combine::{init_logging, LogConfig};
///
/// init_logging(&LogConfig::testing());
/// ```
pub fn init_logging(config: &LogConfig) {
    INIT_LOGGING.call_once(|| {
        let filter = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| config.default_level.as_filter_str().to_string());

        let builder = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .with_file(config.with_file_line)
            .with_line_number(config.with_file_line);

        // A subscriber may already be installed by an embedding application.
        let installed = if config.with_timestamps {
            builder.try_init()
        } else {
            builder.without_time().try_init()
        };
        if installed.is_err() {
            tracing::debug!("global tracing subscriber already set; keeping it");
        }
    });
}

/// Direction of a host ↔ device copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Host memory into a device region.
    HostToDevice,
    /// Device region back into host memory.
    DeviceToHost,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostToDevice => f.write_str("host->device"),
            Self::DeviceToHost => f.write_str("device->host"),
        }
    }
}

/// Log a completed blocking transfer of `bytes` bytes of `element` values.
pub fn log_transfer(
    direction: TransferDirection,
    slot: &str,
    element: &'static str,
    bytes: usize,
) {
    tracing::debug!(
        target: "vector_combine::transfer",
        direction = %direction,
        slot,
        element,
        bytes,
        "Transfer complete"
    );
}

/// Log device memory accounting.
pub fn log_memory_usage(allocated_bytes: usize, peak_bytes: usize, context: &str) {
    tracing::debug!(
        target: "vector_combine::memory",
        allocated_bytes,
        peak_bytes,
        context,
        "Device memory usage"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.default_level, LogLevel::Warn);
        assert!(config.with_timestamps);
        assert!(config.with_ansi);
    }

    #[test]
    fn test_testing_preset_is_undecorated() {
        let test = LogConfig::testing();
        assert_eq!(test.default_level, LogLevel::Warn);
        assert!(!test.with_timestamps);
        assert!(!test.with_ansi);
        assert!(!test.with_target);
    }

    #[test]
    fn test_log_level_filter_str() {
        assert_eq!(LogLevel::Error.as_filter_str(), "error");
        assert_eq!(LogLevel::Warn.as_filter_str(), "warn");
        assert_eq!(LogLevel::Info.as_filter_str(), "info");
        assert_eq!(LogLevel::Debug.as_filter_str(), "debug");
        assert_eq!(LogLevel::Trace.as_filter_str(), "trace");
    }

    #[test]
    fn test_transfer_direction_display() {
        assert_eq!(TransferDirection::HostToDevice.to_string(), "host->device");
        assert_eq!(TransferDirection::DeviceToHost.to_string(), "device->host");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(&LogConfig::testing());
        init_logging(&LogConfig::default());
        log_transfer(TransferDirection::HostToDevice, "A", "f32", 64);
        log_memory_usage(192, 192, "test");
    }
}

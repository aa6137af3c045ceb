#![deny(missing_docs)]
//! Shared logging utilities for the tidewatch workspace.
//!
//! This crate provides the `watch_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. The macros prefix
//! every record with the reaction it belongs to when one is given, so that
//! interleaved cycles of concurrently running reactions stay readable.

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! watch_trace {
    (reaction: $name:expr, $($arg:tt)*) => {{
        log::trace!("[{}] {}", $name, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! watch_info {
    (reaction: $name:expr, $($arg:tt)*) => {{
        log::info!("[{}] {}", $name, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! watch_debug {
    (reaction: $name:expr, $($arg:tt)*) => {{
        log::debug!("[{}] {}", $name, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! watch_warn {
    (reaction: $name:expr, $($arg:tt)*) => {{
        log::warn!("[{}] {}", $name, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! watch_error {
    (reaction: $name:expr, $($arg:tt)*) => {{
        log::error!("[{}] {}", $name, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

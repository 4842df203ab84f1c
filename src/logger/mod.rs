//! Structured logging for Mist
//!
//! This module provides a small tag-based logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<tag> flags
//! - Dual output: colored console + optional file persistence
//!
//! ## Usage
//!
//! ```rust
//! use mist::logger::{self, LogTag};
//!
//! logger::error(LogTag::Pipeline, "Render failed");
//! logger::warning(LogTag::Config, "Config file missing, using defaults");
//! logger::info(LogTag::Webserver, "Listening on 127.0.0.1:8080");
//! logger::debug(LogTag::Clients, "Subscription added"); // Only if --debug-clients
//! logger::verbose(LogTag::Store, "Row payload: ..."); // Only if --verbose
//! ```
//!
//! ## Initialization
//!
//! Call once at startup:
//! ```rust
//! mist::logger::init();
//! ```

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{
    get_logger_config, init_from_args, set_logger_config, LoggerConfig,
};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Parses command-line arguments for debug flags and opens the log file
/// when file logging is enabled. Logging before `init` still works with the
/// default configuration (console only, info level).
pub fn init() {
    config::init_from_args();
    file::init_file_logging();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless --quiet raises nothing above errors)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when the matching --debug-<tag> flag is present, e.g.
/// `--debug-pipeline` for `LogTag::Pipeline`.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (--verbose or --verbose-<tag>)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush all pending log writes
pub fn flush() {
    file::flush_file_logging();
}

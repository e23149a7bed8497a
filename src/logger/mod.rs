//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging with a level filter
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

/// Severity threshold, most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup. An unknown level falls
/// back to `info` with a warning.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level: LogLevel = config.logging.level.parse().unwrap_or_else(|e: String| {
        eprintln!("[WARN] {e}, using 'info'");
        LogLevel::Info
    });

    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: LogLevel) -> bool {
    let threshold = if writer::is_initialized() {
        writer::get().level()
    } else {
        LogLevel::Info
    };
    level <= threshold
}

/// Write to info log
fn write_info(message: &str) {
    if writer::is_initialized() {
        writer::get().write_info(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    if writer::is_initialized() {
        writer::get().write_error(message);
    } else {
        eprintln!("{message}");
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    if writer::is_initialized() {
        writer::get().write_access(message);
    } else {
        println!("{message}");
    }
}

pub fn log_server_start(addr: &SocketAddr, root: &Path, config: &Config) {
    if !enabled(LogLevel::Info) {
        return;
    }
    write_info(&format!("serving at port {}", addr.port()));
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Serving directory: {}", root.display()));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
}

pub fn log_shutdown() {
    if enabled(LogLevel::Info) {
        write_info("[Shutdown] Listener closed, exiting");
    }
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    log_error(&format!("Failed to serve connection: {err}"));
}

pub fn log_error(message: &str) {
    if enabled(LogLevel::Error) {
        write_error(&format!("[ERROR] {message}"));
    }
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

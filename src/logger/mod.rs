//! Logger module
//!
//! Provides logging utilities for the converter server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Leveled error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::Level;

use std::net::SocketAddr;

use crate::config::Config;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse::<Level>().unwrap_or_else(|e| {
        eprintln!("[WARN] {e}, falling back to info");
        Level::Info
    });
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write(level, message),
        None if level >= Level::Warn => eprintln!("{message}"),
        None => println!("{message}"),
    }
}

fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, hostname: &str, conversions: usize) {
    write(Level::Info, "======================================");
    write(Level::Info, "Distance converter started successfully");
    write(Level::Info, &format!("Listening on: http://{addr}"));
    write(Level::Info, &format!("Serving host: {hostname}"));
    write(Level::Info, &format!("Registered conversions: {conversions}"));
    write(Level::Info, &format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write(Level::Info, &format!("Worker threads: {workers}"));
    }
    if let Some(max) = config.performance.max_connections {
        write(Level::Info, &format!("Max connections: {max}"));
    }
    write(Level::Info, &format!("Max body size: {} bytes", config.http.max_body_size));
    if let Some(ref path) = config.logging.access_log_file {
        write(Level::Info, &format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write(Level::Info, &format!("Error log: {path}"));
    }
    write(Level::Info, "======================================\n");
}

pub fn log_shutdown(reason: &str, active_connections: usize) {
    write(
        Level::Info,
        &format!("[Shutdown] {reason}; {active_connections} connection(s) still active"),
    );
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write(Level::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write(Level::Error, &format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_conversion(type_id: &str, value: f64, result: f64, unit: &str) {
    write(Level::Debug, &conversion_message(type_id, value, result, unit));
}

/// Floats use the shortest round-trip form so huge inputs stay one short line
fn conversion_message(type_id: &str, value: f64, result: f64, unit: &str) -> String {
    format!("[Convert] type={type_id} value={value:?} -> {result:?} {unit}")
}

pub fn log_info(message: &str) {
    write(Level::Info, message);
}

pub fn log_error(message: &str) {
    write(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write(Level::Warn, &format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

//! Logging system for the Prism HAL
//!
//! This module provides a flexible logging system with:
//! - Customizable logger via Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - File and line information for detailed ERROR logs
//!
//! Backends log through the `hal_*!` macros; the sink itself lives in
//! [`crate::prism::Hal`].

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to route HAL messages elsewhere (file, network, a test buffer).
///
/// # Example
///
/// ```no_run
/// use prism_hal::prism::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The log entry to process
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "prism::vulkan::RenderPassCache", "prism::opengl::Device")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose debug information (typically disabled in release)
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Error messages (critical issues with file:line details)
    Error,
}

/// Default logger implementation using colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl DefaultLogger {
    /// Render an entry without colors (used by tests and by file sinks)
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");
        let severity = severity_label(entry.severity);
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity, entry.source, entry.message, file, line
            ),
            _ => format!("[{}] [{}] [{}] {}", timestamp, severity, entry.source, entry.message),
        }
    }
}

fn severity_label(severity: LogSeverity) -> &'static str {
    match severity {
        LogSeverity::Trace => "TRACE",
        LogSeverity::Debug => "DEBUG",
        LogSeverity::Info => "INFO ",
        LogSeverity::Warn => "WARN ",
        LogSeverity::Error => "ERROR",
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        // Format timestamp as YYYY-MM-DD HH:MM:SS.mmm
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let label = severity_label(entry.severity);
        let severity_str = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };

        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp,
                severity_str,
                source,
                entry.message,
                file,
                line
            );
        } else {
            println!(
                "[{}] [{}] [{}] {}",
                timestamp,
                severity_str,
                source,
                entry.message
            );
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (very verbose, typically disabled)
///
/// # Example
///
/// ```no_run
/// prism_hal::hal_trace!("prism::vulkan::Encoder", "Flushing {} dirty slots", 3);
/// ```
#[macro_export]
macro_rules! hal_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::prism::Hal::log(
            $crate::prism::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message (development information)
#[macro_export]
macro_rules! hal_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::prism::Hal::log(
            $crate::prism::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (important events)
///
/// # Example
///
/// ```no_run
/// prism_hal::hal_info!("prism::vulkan::Context", "Device created on {}", "GPU 0");
/// ```
#[macro_export]
macro_rules! hal_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::prism::Hal::log(
            $crate::prism::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (potential issues)
#[macro_export]
macro_rules! hal_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::prism::Hal::log(
            $crate::prism::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! hal_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::prism::Hal::log_detailed(
            $crate::prism::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR message and build the matching `Error::BackendError`
///
/// Meant for `map_err` closures:
///
/// ```no_run
/// # fn create() -> Result<(), i32> { Err(-1) }
/// # fn run() -> prism_hal::prism::Result<()> {
/// create().map_err(|e| prism_hal::hal_err!("prism::vulkan", "Failed to create fence: {:?}", e))?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! hal_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::prism::Hal::log_detailed(
            $crate::prism::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::prism::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return `Err(Error::BackendError)` from the current function
#[macro_export]
macro_rules! hal_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::hal_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;

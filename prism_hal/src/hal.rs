/// Prism HAL - process-wide logger sink
///
/// Every device, context and encoder is owned by the caller; the only global
/// is the logger used by the `hal_*!` macros. It starts as a `DefaultLogger`
/// and can be replaced at any time.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Entry point for the HAL-wide logging facility
///
/// # Example
///
/// ```no_run
/// use prism_hal::prism::Hal;
/// use prism_hal::prism::log::{Logger, LogEntry};
///
/// struct Quiet;
/// impl Logger for Quiet {
///     fn log(&self, _entry: &LogEntry) {}
/// }
///
/// Hal::set_logger(Quiet);
/// Hal::reset_logger();
/// ```
pub struct Hal;

impl Hal {
    /// Replace the logger
    ///
    /// # Arguments
    ///
    /// * `new_logger` - The new sink for every HAL log entry
    pub fn set_logger<L: Logger + 'static>(new_logger: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(new_logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Logging method for simple logs without file:line
    ///
    /// Used by macros like hal_info!, hal_warn!, etc.
    ///
    /// # Arguments
    ///
    /// * `severity` - Log severity level
    /// * `source` - Source module (e.g., "prism::vulkan::Context")
    /// * `message` - Log message
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Logging method with file:line information (for ERROR logs)
    ///
    /// Used by hal_error!, hal_err! and hal_bail!.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "hal_tests.rs"]
mod tests;

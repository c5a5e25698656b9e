//! Unit tests for the global logger sink
//!
//! The logger is a process-wide OnceLock, so every test is #[serial].

use crate::prism::{Error, Hal};
use crate::prism::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let logger = TestLogger::new();
    let entries = logger.entries.clone();
    Hal::set_logger(logger);
    entries
}

// ============================================================================
// LOGGER SINK TESTS
// ============================================================================

#[test]
#[serial]
fn test_set_logger_receives_macros() {
    let entries = capture();

    crate::hal_trace!("prism::test", "trace {}", 1);
    crate::hal_debug!("prism::test", "debug {}", 2);
    crate::hal_info!("prism::test", "info {}", 3);
    crate::hal_warn!("prism::test", "warn {}", 4);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].severity, LogSeverity::Trace);
    assert_eq!(entries[3].severity, LogSeverity::Warn);
    assert_eq!(entries[2].message, "info 3");
    assert!(entries.iter().all(|e| e.file.is_none()));
    drop(entries);
    Hal::reset_logger();
}

#[test]
#[serial]
fn test_error_macro_carries_location() {
    let entries = capture();

    crate::hal_error!("prism::test", "boom");

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert!(entries[0].file.is_some());
    assert!(entries[0].line.is_some());
    drop(entries);
    Hal::reset_logger();
}

#[test]
#[serial]
fn test_hal_err_logs_and_builds_backend_error() {
    let entries = capture();

    let err = crate::hal_err!("prism::test", "Failed to create {}: {}", "fence", -3);
    assert_eq!(err, Error::BackendError("Failed to create fence: -3".to_string()));

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].source, "prism::test");
    drop(entries);
    Hal::reset_logger();
}

#[test]
#[serial]
fn test_hal_bail_returns_early() {
    let entries = capture();

    fn failing(flag: bool) -> crate::prism::Result<u32> {
        if flag {
            crate::hal_bail!("prism::test", "bailing out");
        }
        Ok(7)
    }

    assert_eq!(failing(false), Ok(7));
    assert!(matches!(failing(true), Err(Error::BackendError(msg)) if msg == "bailing out"));
    assert_eq!(entries.lock().unwrap().len(), 1);
    Hal::reset_logger();
}

#[test]
#[serial]
fn test_reset_logger_detaches_custom_sink() {
    let entries = capture();
    Hal::reset_logger();

    crate::hal_info!("prism::test", "goes to the default logger");

    assert!(entries.lock().unwrap().is_empty());
}

/// Vulkan Debug Messenger - validation layer messages with colored output
///
/// Only compiled with the `vulkan-validation` feature. The callback prints
/// every message that passes the configured filter, counts messages per
/// severity and groups repeats of the same message.

use ash::vk;
use colored::*;
use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Global validation configuration (read by the callback)
static VALIDATION_CONFIG: Mutex<Option<ValidationConfig>> = Mutex::new(None);

/// Global validation statistics
static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Occurrences of each message text since the last `init_validation`
static MESSAGE_TRACKER: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lowest severity that gets printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationSeverity {
    ErrorsOnly,
    #[default]
    ErrorsAndWarnings,
    All,
}

/// How validation messages are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationConfig {
    pub severity: ValidationSeverity,
    /// Show performance warnings
    pub show_performance: bool,
    /// Panic on the first validation error (strict mode for tests)
    pub panic_on_error: bool,
    pub enable_stats: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            severity: ValidationSeverity::ErrorsAndWarnings,
            show_performance: true,
            panic_on_error: false,
            enable_stats: true,
        }
    }
}

/// Validation message counts per severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn counter(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> &AtomicU32 {
        if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            &self.errors
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            &self.warnings
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            &self.info
        } else {
            &self.verbose
        }
    }

    fn get_stats(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

/// Install the configuration and reset statistics
pub fn init_validation(config: ValidationConfig) {
    VALIDATION_STATS.reset();
    *lock(&MESSAGE_TRACKER) = Some(FxHashMap::default());
    *lock(&VALIDATION_CONFIG) = Some(config);
}

/// Stop reporting (called when the context is destroyed)
pub(crate) fn shutdown_validation() {
    *lock(&VALIDATION_CONFIG) = None;
}

/// Current validation statistics
pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.get_stats()
}

/// Print validation statistics report
pub fn print_validation_stats_report() {
    let stats = get_validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());
    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }
    println!("  {} {}", "Total:".white().bold(), stats.total());

    if let Some(tracker) = lock(&MESSAGE_TRACKER).as_ref() {
        let repeated = tracker.values().filter(|&&count| count > 1).count();
        if repeated > 0 {
            println!("\n  {} message(s) appeared multiple times", repeated);
        }
    }
    println!("{}\n", "====================================".bright_blue().bold());
}

/// Whether a message passes the severity and category filter
pub(crate) fn should_report(
    config: &ValidationConfig,
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
) -> bool {
    let severity_ok = match config.severity {
        ValidationSeverity::ErrorsOnly => severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR),
        ValidationSeverity::ErrorsAndWarnings => severity.intersects(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
        ),
        ValidationSeverity::All => true,
    };
    let category_ok =
        config.show_performance || !message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE);
    severity_ok && category_ok
}

fn severity_label(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> ColoredString {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        "ERROR".red().bold()
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        "WARNING".yellow().bold()
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        "INFO".cyan()
    } else {
        "VERBOSE".bright_black()
    }
}

fn type_label(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

unsafe fn c_str_or<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> &'a str {
    if ptr.is_null() {
        fallback
    } else {
        CStr::from_ptr(ptr).to_str().unwrap_or("Invalid UTF-8")
    }
}

/// Vulkan debug messenger callback
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let Some(config) = *lock(&VALIDATION_CONFIG) else {
        return vk::FALSE;
    };
    if p_callback_data.is_null() || !should_report(&config, message_severity, message_type) {
        return vk::FALSE;
    }

    let callback_data = &*p_callback_data;
    let message_id_name = c_str_or(callback_data.p_message_id_name, "Unknown");
    let message = c_str_or(callback_data.p_message, "No message");

    let occurrences = if config.enable_stats {
        VALIDATION_STATS.counter(message_severity).fetch_add(1, Ordering::Relaxed);
        let mut tracker = lock(&MESSAGE_TRACKER);
        let count = tracker.get_or_insert_with(FxHashMap::default).entry(message.to_string()).or_insert(0);
        *count += 1;
        *count
    } else {
        1
    };
    let repeat = if occurrences > 1 { format!(" [x{}]", occurrences) } else { String::new() };

    eprint!(
        "{} {} [{}]{}\n  |- {}: {}\n  `- {}\n",
        "[VULKAN".bright_blue().bold(),
        format!("{}]", severity_label(message_severity)).bright_blue().bold(),
        type_label(message_type).bright_black(),
        repeat.yellow(),
        "Message ID".bright_black(),
        message_id_name.white(),
        message.white()
    );

    if config.panic_on_error && message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        panic!("Vulkan validation error (strict mode)\nMessage ID: {}\nMessage: {}", message_id_name, message);
    }

    vk::FALSE
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;

//! Allocation-free runtime logging.
//!
//! The runtime layer sits underneath the heap allocator, so the logger
//! cannot allocate. Output goes through a pair of global function pointers
//! installed at bring-up: a raw print function (for `rtprint!` /
//! `rtprintln!`) and a leveled log function (for `rtlog!` and friends).
//! Until something is installed, both are silent no-ops, which keeps early
//! code free of "is the console up yet" checks.

use core::fmt;
use core::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

/// Log severity. Lower is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Something failed; the runtime may or may not be able to continue.
    Error = 0,
    /// Unexpected condition that is not itself a failure.
    Warn = 1,
    /// High-level progress messages.
    Info = 2,
    /// Detailed diagnostics.
    Debug = 3,
    /// Very verbose byte-level tracing.
    Trace = 4,
}

impl LogLevel {
    /// Fixed-width name for aligned output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN ",
            Self::Info => "INFO ",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Error,
            1 => Self::Warn,
            2 => Self::Info,
            3 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime level filter
// ---------------------------------------------------------------------------

static MAX_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Sets the most verbose level that will be emitted.
pub fn set_max_level(level: LogLevel) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Returns the current verbosity ceiling.
pub fn max_level() -> LogLevel {
    LogLevel::from_u8(MAX_LEVEL.load(Ordering::Relaxed))
}

// ---------------------------------------------------------------------------
// Global output functions
// ---------------------------------------------------------------------------

/// Signature of the raw print function.
pub type PrintFn = fn(fmt::Arguments<'_>);

/// Signature of the leveled log function.
pub type LogFn = fn(LogLevel, fmt::Arguments<'_>);

fn silent_print(_args: fmt::Arguments<'_>) {}
fn silent_log(_level: LogLevel, _args: fmt::Arguments<'_>) {}

static PRINT_FN: AtomicPtr<()> = AtomicPtr::new(silent_print as *mut ());
static LOG_FN: AtomicPtr<()> = AtomicPtr::new(silent_log as *mut ());

/// Installs the raw print function.
///
/// # Safety
///
/// `f` must be callable from any context the runtime logs from, including
/// the panic path. May be called again to swap outputs.
pub unsafe fn set_print_fn(f: PrintFn) {
    PRINT_FN.store(f as *mut (), Ordering::Release);
}

/// Installs the leveled log function.
///
/// # Safety
///
/// Same contract as [`set_print_fn`].
pub unsafe fn set_log_fn(f: LogFn) {
    LOG_FN.store(f as *mut (), Ordering::Release);
}

/// Implementation detail of [`rtprint!`]. Not public API.
#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    let ptr = PRINT_FN.load(Ordering::Acquire);
    // SAFETY: Only valid `PrintFn` pointers are ever stored in PRINT_FN.
    let f: PrintFn = unsafe { core::mem::transmute(ptr) };
    f(args);
}

/// Implementation detail of [`rtlog!`]. Not public API.
#[doc(hidden)]
pub fn _log(level: LogLevel, args: fmt::Arguments<'_>) {
    if level > max_level() {
        return;
    }
    let ptr = LOG_FN.load(Ordering::Acquire);
    // SAFETY: Only valid `LogFn` pointers are ever stored in LOG_FN.
    let f: LogFn = unsafe { core::mem::transmute(ptr) };
    f(level, args);
}

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

/// Prints through the installed output function (raw, no level tag).
#[macro_export]
macro_rules! rtprint {
    ($($arg:tt)*) => { $crate::log::_print(format_args!($($arg)*)) };
}

/// Prints with a trailing newline (raw, no level tag).
#[macro_export]
macro_rules! rtprintln {
    () => { $crate::rtprint!("\n") };
    ($($arg:tt)*) => { $crate::rtprint!("{}\n", format_args!($($arg)*)) };
}

/// Logs a message at the given level.
#[macro_export]
macro_rules! rtlog {
    ($level:expr, $($arg:tt)*) => {
        $crate::log::_log($level, format_args!($($arg)*))
    };
}

/// Logs at error level.
#[macro_export]
macro_rules! rterror {
    ($($arg:tt)*) => { $crate::rtlog!($crate::log::LogLevel::Error, $($arg)*) };
}

/// Logs at warning level.
#[macro_export]
macro_rules! rtwarn {
    ($($arg:tt)*) => { $crate::rtlog!($crate::log::LogLevel::Warn, $($arg)*) };
}

/// Logs at info level.
#[macro_export]
macro_rules! rtinfo {
    ($($arg:tt)*) => { $crate::rtlog!($crate::log::LogLevel::Info, $($arg)*) };
}

/// Logs at debug level.
#[macro_export]
macro_rules! rtdebug {
    ($($arg:tt)*) => { $crate::rtlog!($crate::log::LogLevel::Debug, $($arg)*) };
}

/// Logs at trace level.
#[macro_export]
macro_rules! rttrace {
    ($($arg:tt)*) => { $crate::rtlog!($crate::log::LogLevel::Trace, $($arg)*) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Function pointers cannot capture, so test output lands in a static.
    static CAPTURED: Mutex<String> = Mutex::new(String::new());

    fn capture_print(args: fmt::Arguments<'_>) {
        CAPTURED.lock().unwrap().push_str(&args.to_string());
    }

    fn capture_log(level: LogLevel, args: fmt::Arguments<'_>) {
        let mut out = CAPTURED.lock().unwrap();
        out.push_str(level.name());
        out.push(' ');
        out.push_str(&args.to_string());
    }

    #[test]
    fn severity_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn names_are_fixed_width() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            assert_eq!(level.name().len(), 5);
        }
    }

    // Single test for everything touching the global level and function
    // pointers; separate tests would race through the shared statics.
    #[test]
    fn installed_functions_and_level_filter() {
        CAPTURED.lock().unwrap().clear();
        unsafe {
            set_print_fn(capture_print);
            set_log_fn(capture_log);
        }

        set_max_level(LogLevel::Trace);
        assert_eq!(max_level(), LogLevel::Trace);
        set_max_level(LogLevel::Info);
        assert_eq!(max_level(), LogLevel::Info);

        _print(format_args!("raw {}", 1));
        _log(LogLevel::Warn, format_args!("tagged"));
        // Filtered out: Debug > Info.
        _log(LogLevel::Debug, format_args!("dropped"));

        let out = CAPTURED.lock().unwrap().clone();
        assert!(out.contains("raw 1"));
        assert!(out.contains("WARN  tagged"));
        assert!(!out.contains("dropped"));
    }
}

//! Compile-time runtime configuration.
//!
//! Single source of truth for the constants the shim layer is built around.
//! Board ports change these; nothing else in the tree hard-codes them.

use muon_core::log::LogLevel;
use muon_hal::uart16550::BaudRate;

/// Capacity of the call-stack recorder, in frames.
pub const BACKTRACE_DEPTH: usize = 64;

/// Base address of the console UART register block.
pub const UART0_BASE: usize = 0x4000_C000;

/// Console line rate.
pub const CONSOLE_BAUD: BaudRate = BaudRate::Baud115200;

/// Verbosity ceiling installed at bring-up.
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

//! Bare-metal runtime support layer.
//!
//! Supplies the primitives a C-style runtime library assumes an operating
//! system provides, using only what the board actually has: a serial
//! peripheral and a linker-defined memory region. The pieces:
//!
//! - [`heap`] — monotonic arena behind the dynamic-memory allocator.
//! - [`channel`] / [`console`] — character I/O redirection with a
//!   compile-time choice between the serial peripheral and host loopback.
//! - [`trace`] — fixed-capacity call-stack recorder for fault reporting.
//! - [`syscall`] — fixed-answer shims where no kernel exists.
//! - [`fs`] — file-operation redirection onto a pluggable backend.
//!
//! Everything process-wide is initialized explicitly through [`init`];
//! there is no hidden construction order.

#![cfg_attr(not(test), no_std)]

// Off-target builds loop the console through the host's descriptors.
#[cfg(not(target_os = "none"))]
extern crate std;

pub mod channel;
pub mod config;
pub mod console;
pub mod fs;
pub mod heap;
pub mod syscall;
pub mod trace;

#[cfg(target_os = "none")]
mod panic;

pub use muon_core::log::LogLevel;
pub use muon_core::{rtdebug, rterror, rtinfo, rtlog, rtprint, rtprintln, rttrace, rtwarn};

/// Brings the runtime layer up, in order: heap arena from the linker
/// bounds, console channel (UART programming on target), then logging
/// through the console at [`config::DEFAULT_LOG_LEVEL`].
///
/// # Errors
///
/// Returns the UART's [`InitError`](muon_hal::uart16550::InitError) if the
/// console peripheral fails its self-test; the heap is already usable at
/// that point.
///
/// # Safety
///
/// Must be called exactly once, at process start, before anything
/// allocates or touches the console.
pub unsafe fn init() -> Result<(), muon_hal::uart16550::InitError> {
    #[cfg(target_os = "none")]
    // SAFETY: Single-call-at-start is this function's own contract.
    unsafe {
        heap::init();
    }

    console::init()?;
    muon_core::log::set_max_level(config::DEFAULT_LOG_LEVEL);
    rtinfo!("muon runtime up: {} byte heap", heap::remaining());
    Ok(())
}

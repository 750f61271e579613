//! Panic path for on-target builds.
//!
//! Writes the panic message straight through a stack-constructed console
//! writer (no locks to deadlock on), appends the recorder's best-effort
//! call stack, and parks the CPU. Off-target builds use the host's own
//! panic machinery.

use core::fmt::Write;
use core::panic::PanicInfo;

use crate::channel::default_channel;
use crate::console::Console;
use crate::{config, syscall, trace};

#[panic_handler]
fn panic(info: &PanicInfo<'_>) -> ! {
    let mut out = Console::new(default_channel());
    let _ = write!(out, "\n!!! RUNTIME PANIC !!!\n{info}\n");

    let mut frames = [0usize; config::BACKTRACE_DEPTH];
    match trace::try_snapshot(&mut frames) {
        Some(depth) if depth > 0 => {
            let _ = write!(out, "call stack ({depth} frames, innermost last):\n");
            for (i, site) in frames[..depth.min(frames.len())].iter().enumerate() {
                let _ = write!(out, "  #{i}: {site:#010x}\n");
            }
        }
        Some(_) => {
            let _ = write!(out, "call stack: empty\n");
        }
        None => {
            // Recorder lock was held when the panic fired.
            let _ = write!(out, "call stack: unavailable\n");
        }
    }

    syscall::exit(1)
}

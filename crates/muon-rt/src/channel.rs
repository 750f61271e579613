//! Console channel backends.
//!
//! A channel is a pair of blocking single-byte primitives. Exactly two
//! implementations exist and the choice between them is made at compile
//! time: on-target builds drive the serial peripheral, off-target builds
//! loop through the host's standard descriptors so the same console logic
//! can be exercised without hardware.

#[cfg(target_os = "none")]
use muon_hal::Uart16550;

#[cfg(target_os = "none")]
use crate::config;

/// Blocking single-byte transport for the console.
pub trait ChannelBackend {
    /// Sends one byte; returns the number of bytes written (1 on success).
    fn transmit(&self, byte: u8) -> usize;

    /// Receives one byte, blocking until one is available.
    fn receive(&self) -> u8;
}

// ---------------------------------------------------------------------------
// Hardware backend (on target)
// ---------------------------------------------------------------------------

/// Channel over the console UART.
#[cfg(target_os = "none")]
#[derive(Debug, Clone, Copy)]
pub struct SerialChannel {
    uart: Uart16550,
}

#[cfg(target_os = "none")]
impl SerialChannel {
    /// Creates a handle for the configured console UART.
    ///
    /// Does not program the hardware; that happens once in
    /// [`console::init`](crate::console::init).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            uart: Uart16550::new(config::UART0_BASE),
        }
    }
}

#[cfg(target_os = "none")]
impl Default for SerialChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "none")]
impl ChannelBackend for SerialChannel {
    fn transmit(&self, byte: u8) -> usize {
        self.uart.write_byte(byte);
        1
    }

    fn receive(&self) -> u8 {
        self.uart.read_byte()
    }
}

// ---------------------------------------------------------------------------
// Host backend (off target)
// ---------------------------------------------------------------------------

/// Channel over the host process's standard input/output.
#[cfg(not(target_os = "none"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct HostChannel;

#[cfg(not(target_os = "none"))]
impl HostChannel {
    /// Creates the host channel handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(not(target_os = "none"))]
impl ChannelBackend for HostChannel {
    fn transmit(&self, byte: u8) -> usize {
        use std::io::Write;
        std::io::stdout()
            .write(core::slice::from_ref(&byte))
            .unwrap_or(0)
    }

    fn receive(&self) -> u8 {
        use std::io::Read;
        let mut byte = [0u8; 1];
        // EOF on the host descriptor reads as NUL; there is no further
        // input coming.
        match std::io::stdin().read(&mut byte) {
            Ok(1) => byte[0],
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Build-time selection
// ---------------------------------------------------------------------------

/// The channel selected for this build.
#[cfg(target_os = "none")]
pub type DefaultChannel = SerialChannel;

/// The channel selected for this build.
#[cfg(not(target_os = "none"))]
pub type DefaultChannel = HostChannel;

/// Returns a handle for the build's selected channel.
///
/// Handles are stateless and free to construct; every console entry point
/// makes its own rather than sharing a locked global.
#[must_use]
pub const fn default_channel() -> DefaultChannel {
    DefaultChannel::new()
}

//! Hardware access for the muon runtime layer.
//!
//! Only what the runtime shim needs from the board: a typed volatile
//! register cell and a driver for the memory-mapped 16550 console UART.

#![cfg_attr(not(test), no_std)]

pub mod mmio;
pub mod uart16550;

pub use uart16550::Uart16550;

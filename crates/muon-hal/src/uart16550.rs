//! Memory-mapped 16550 UART driver.
//!
//! The console peripheral is a 16550-compatible UART exposed as a block of
//! byte-wide registers at a 32-bit stride. The driver provides blocking
//! single-byte send/receive (the primitives the console layer is built on),
//! non-blocking probes, and [`core::fmt::Write`] for formatted output.

use core::fmt;

use bitflags::bitflags;

use crate::mmio::Mmio;

/// Byte distance between adjacent registers in the memory map.
const REG_STRIDE: usize = 4;

/// Register indices within the block.
mod reg {
    /// Transmit Holding Register (write, DLAB=0).
    pub const THR: usize = 0;
    /// Receive Buffer Register (read, DLAB=0).
    pub const RBR: usize = 0;
    /// Divisor Latch low byte (DLAB=1).
    pub const DLL: usize = 0;
    /// Interrupt Enable Register (DLAB=0).
    pub const IER: usize = 1;
    /// Divisor Latch high byte (DLAB=1).
    pub const DLM: usize = 1;
    /// FIFO Control Register (write).
    pub const FCR: usize = 2;
    /// Line Control Register.
    pub const LCR: usize = 3;
    /// Modem Control Register.
    pub const MCR: usize = 4;
    /// Line Status Register.
    pub const LSR: usize = 5;
}

bitflags! {
    /// FIFO Control Register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fcr: u8 {
        /// Enable both FIFOs.
        const ENABLE    = 1 << 0;
        /// Flush the receive FIFO.
        const CLEAR_RX  = 1 << 1;
        /// Flush the transmit FIFO.
        const CLEAR_TX  = 1 << 2;
        /// Receive trigger at 14 bytes.
        const TRIGGER_14 = 0b11 << 6;
    }
}

bitflags! {
    /// Line Control Register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Lcr: u8 {
        /// Word length bit 0.
        const WORD_LEN_0    = 1 << 0;
        /// Word length bit 1.
        const WORD_LEN_1    = 1 << 1;
        /// Extra stop bit.
        const STOP_BIT      = 1 << 2;
        /// Parity enable.
        const PARITY_ENABLE = 1 << 3;
        /// Divisor Latch Access Bit.
        const DLAB          = 1 << 7;

        /// 8 data bits, no parity, 1 stop bit.
        const EIGHT_N_ONE = Self::WORD_LEN_0.bits() | Self::WORD_LEN_1.bits();
    }
}

bitflags! {
    /// Modem Control Register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Mcr: u8 {
        /// Data Terminal Ready.
        const DTR      = 1 << 0;
        /// Request To Send.
        const RTS      = 1 << 1;
        /// Auxiliary output 2.
        const OUT2     = 1 << 3;
        /// Internal loopback mode.
        const LOOPBACK = 1 << 4;
    }
}

bitflags! {
    /// Line Status Register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Lsr: u8 {
        /// Received data available.
        const DATA_READY      = 1 << 0;
        /// Overrun error.
        const OVERRUN_ERROR   = 1 << 1;
        /// Parity error.
        const PARITY_ERROR    = 1 << 2;
        /// Framing error.
        const FRAMING_ERROR   = 1 << 3;
        /// Transmit Holding Register empty.
        const THR_EMPTY       = 1 << 5;
        /// Transmitter and shift register both empty.
        const TRANSMITTER_EMPTY = 1 << 6;
    }
}

/// Baud rate selection.
///
/// The discriminant is the divisor for the UART input clock, so conversion
/// is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BaudRate {
    /// 115200 baud (divisor = 1).
    Baud115200 = 1,
    /// 57600 baud (divisor = 2).
    Baud57600 = 2,
    /// 38400 baud (divisor = 3).
    Baud38400 = 3,
    /// 19200 baud (divisor = 6).
    Baud19200 = 6,
    /// 9600 baud (divisor = 12).
    Baud9600 = 12,
}

impl BaudRate {
    /// Returns the divisor to program into DLL/DLM.
    #[inline]
    #[must_use]
    pub const fn divisor(self) -> u16 {
        self as u16
    }
}

/// Error returned when the loopback self-test fails during init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitError;

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UART 16550 loopback self-test failed")
    }
}

/// A memory-mapped 16550 UART identified by its base address.
///
/// `Copy` and stateless beyond the address: handles can be constructed on
/// the stack in any context (the panic path relies on this). The hardware
/// keeps whatever configuration the last [`init`](Self::init) programmed.
#[derive(Debug, Clone, Copy)]
pub struct Uart16550 {
    base: usize,
}

impl Uart16550 {
    /// Creates a handle. Does **not** touch hardware.
    #[must_use]
    pub const fn new(base: usize) -> Self {
        Self { base }
    }

    /// Returns the register cell at the given index.
    #[inline]
    const fn reg(&self, index: usize) -> Mmio<u8> {
        Mmio::new(self.base + index * REG_STRIDE)
    }

    /// Programs the UART: given baud rate, 8N1 framing, FIFOs on.
    ///
    /// Runs a loopback self-test to confirm a functioning 16550 is actually
    /// present at the base address.
    ///
    /// # Errors
    ///
    /// Returns [`InitError`] if the self-test byte does not come back.
    ///
    /// # Safety
    ///
    /// `self.base` must be the mapped register block of a 16550-compatible
    /// UART, and no other code may be accessing it concurrently.
    pub unsafe fn init(&self, baud: BaudRate) -> Result<(), InitError> {
        let divisor = baud.divisor();

        unsafe {
            // Interrupts off; this layer only polls.
            self.reg(reg::IER).write(0x00);

            // Program the divisor behind DLAB.
            self.reg(reg::LCR).write(Lcr::DLAB.bits());
            self.reg(reg::DLL).write(divisor as u8);
            self.reg(reg::DLM).write((divisor >> 8) as u8);

            // 8N1; clears DLAB.
            self.reg(reg::LCR).write(Lcr::EIGHT_N_ONE.bits());

            // FIFOs on and flushed.
            self.reg(reg::FCR)
                .write((Fcr::ENABLE | Fcr::CLEAR_RX | Fcr::CLEAR_TX | Fcr::TRIGGER_14).bits());

            // Loopback self-test.
            self.reg(reg::MCR)
                .write((Mcr::DTR | Mcr::RTS | Mcr::OUT2 | Mcr::LOOPBACK).bits());
            self.reg(reg::THR).write(0xAE);
            if self.reg(reg::RBR).read() != 0xAE {
                return Err(InitError);
            }

            // Normal operation.
            self.reg(reg::MCR).write((Mcr::DTR | Mcr::RTS | Mcr::OUT2).bits());
        }

        Ok(())
    }

    /// Sends one byte, spinning until the transmit holding register drains.
    pub fn write_byte(&self, byte: u8) {
        // SAFETY: The handle was created for a valid UART block (init
        // contract); LSR reads are side-effect free, THR writes transmit.
        unsafe {
            while !Lsr::from_bits_truncate(self.reg(reg::LSR).read()).contains(Lsr::THR_EMPTY) {
                core::hint::spin_loop();
            }
            self.reg(reg::THR).write(byte);
        }
    }

    /// Receives one byte, spinning until data arrives.
    #[must_use]
    pub fn read_byte(&self) -> u8 {
        while !self.data_available() {
            core::hint::spin_loop();
        }
        // SAFETY: DATA_READY is set, so RBR holds a received byte.
        unsafe { self.reg(reg::RBR).read() }
    }

    /// Receives one byte if one is waiting (non-blocking).
    #[must_use]
    pub fn try_read_byte(&self) -> Option<u8> {
        if self.data_available() {
            // SAFETY: DATA_READY is set, so RBR holds a received byte.
            Some(unsafe { self.reg(reg::RBR).read() })
        } else {
            None
        }
    }

    /// Returns `true` if the receive buffer has data (non-blocking).
    #[must_use]
    pub fn data_available(&self) -> bool {
        self.line_status().contains(Lsr::DATA_READY)
    }

    /// Returns the current Line Status Register contents.
    #[must_use]
    pub fn line_status(&self) -> Lsr {
        // SAFETY: LSR reads are side-effect-free status reads.
        unsafe { Lsr::from_bits_truncate(self.reg(reg::LSR).read()) }
    }

    /// Returns the base address.
    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl fmt::Write for Uart16550 {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_addresses_use_word_stride() {
        let uart = Uart16550::new(0x4000_C000);
        assert_eq!(uart.reg(reg::THR).addr(), 0x4000_C000);
        assert_eq!(uart.reg(reg::LCR).addr(), 0x4000_C00C);
        assert_eq!(uart.reg(reg::LSR).addr(), 0x4000_C014);
    }

    #[test]
    fn baud_divisors() {
        assert_eq!(BaudRate::Baud115200.divisor(), 1);
        assert_eq!(BaudRate::Baud38400.divisor(), 3);
        assert_eq!(BaudRate::Baud9600.divisor(), 12);
    }

    #[test]
    fn eight_n_one_sets_both_word_length_bits() {
        assert_eq!(Lcr::EIGHT_N_ONE.bits(), 0b0000_0011);
        assert!(!Lcr::EIGHT_N_ONE.contains(Lcr::DLAB));
    }

    #[test]
    fn lsr_truncates_unknown_bits() {
        let lsr = Lsr::from_bits_truncate(0xFF);
        assert!(lsr.contains(Lsr::DATA_READY));
        assert!(lsr.contains(Lsr::THR_EMPTY));
    }
}

//! Console I/O redirection.
//!
//! Reroutes the runtime library's character I/O onto a [`ChannelBackend`]:
//! bulk writes go out byte-at-a-time in order, and the interactive read path
//! applies carriage-return translation so line-based tools see terminal
//! behavior (`\r` in, `\r\n` echoed, `\n` delivered).

use core::fmt;

use muon_core::log::LogLevel;

use crate::channel::{ChannelBackend, default_channel};

/// Standard input descriptor number.
pub const STDIN_FILENO: i32 = 0;
/// Standard output descriptor number.
pub const STDOUT_FILENO: i32 = 1;
/// Standard error descriptor number.
pub const STDERR_FILENO: i32 = 2;

/// Console logic over an arbitrary channel.
///
/// Generic so the translation and echo rules can be exercised against a
/// scripted channel off-target; production paths use
/// [`default_channel`](crate::channel::default_channel).
pub struct Console<C: ChannelBackend> {
    channel: C,
}

impl<C: ChannelBackend> Console<C> {
    /// Wraps a channel.
    pub const fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Transmits `buf` in order. Transmit blocks until each byte is
    /// accepted, so the full length is always reported.
    pub fn write_bytes(&self, buf: &[u8]) -> usize {
        for &byte in buf {
            self.channel.transmit(byte);
        }
        buf.len()
    }

    /// Receives one byte with terminal line-ending behavior.
    ///
    /// A received `\r` is echoed, translated to `\n`, and the `\n` echoed
    /// too; every other byte is echoed once and returned unchanged.
    pub fn read_byte(&self) -> u8 {
        let mut byte = self.channel.receive();
        if byte == b'\r' {
            self.channel.transmit(b'\r');
            byte = b'\n';
        }
        self.channel.transmit(byte);
        byte
    }

    /// Transmits one byte; returns the count written.
    pub fn put_byte(&self, byte: u8) -> usize {
        self.channel.transmit(byte)
    }

    /// Writes `line` followed by a newline. The reported count covers only
    /// the characters of `line`, not the terminator.
    pub fn put_line(&self, line: &str) -> usize {
        let count = self.write_bytes(line.as_bytes());
        self.channel.transmit(b'\n');
        count
    }
}

impl<C: ChannelBackend> fmt::Write for Console<C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Serial terminals want a carriage return before each newline.
        for byte in s.bytes() {
            if byte == b'\n' {
                self.channel.transmit(b'\r');
            }
            self.channel.transmit(byte);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Redirection surface on the default channel
// ---------------------------------------------------------------------------

/// Bulk write entry point for the runtime library.
///
/// The descriptor is accepted for signature compatibility; all output lands
/// on the one console channel.
pub fn write(_fd: i32, buf: &[u8]) -> isize {
    Console::new(default_channel()).write_bytes(buf) as isize
}

/// Read entry point for the runtime library.
///
/// Only standard input is readable; one byte is delivered per call, with
/// carriage-return translation applied. Other descriptors read zero bytes.
pub fn read(fd: i32, buf: &mut [u8]) -> isize {
    if fd != STDIN_FILENO || buf.is_empty() {
        return 0;
    }
    buf[0] = Console::new(default_channel()).read_byte();
    1
}

/// Single-character output entry point.
pub fn put_byte(byte: u8) -> usize {
    Console::new(default_channel()).put_byte(byte)
}

/// Line output entry point; returns the character count excluding the
/// trailing newline.
pub fn put_line(line: &str) -> usize {
    Console::new(default_channel()).put_line(line)
}

// ---------------------------------------------------------------------------
// Bring-up
// ---------------------------------------------------------------------------

/// Print function installed into the logger: raw formatted output.
fn console_print(args: fmt::Arguments<'_>) {
    let mut out = Console::new(default_channel());
    let _ = fmt::Write::write_fmt(&mut out, args);
}

/// Log function installed into the logger: level-tagged line output.
fn console_log(level: LogLevel, args: fmt::Arguments<'_>) {
    let mut out = Console::new(default_channel());
    let _ = fmt::Write::write_fmt(&mut out, format_args!("{} {args}\n", level.name()));
}

/// Brings the console up: programs the UART (on target) and installs the
/// console as the logger's output.
///
/// # Errors
///
/// Returns the UART's [`InitError`](muon_hal::uart16550::InitError) if the
/// peripheral fails its self-test.
pub fn init() -> Result<(), muon_hal::uart16550::InitError> {
    #[cfg(target_os = "none")]
    {
        use muon_hal::Uart16550;

        use crate::config;

        // SAFETY: Bring-up runs once, before any concurrent UART access.
        unsafe { Uart16550::new(config::UART0_BASE).init(config::CONSOLE_BAUD)? };
    }

    // SAFETY: Both functions only construct stateless channel handles and
    // write bytes; callable from any context including panic.
    unsafe {
        muon_core::log::set_print_fn(console_print);
        muon_core::log::set_log_fn(console_log);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Channel with scripted input and recorded output.
    struct ScriptChannel {
        rx: RefCell<VecDeque<u8>>,
        tx: RefCell<Vec<u8>>,
    }

    impl ScriptChannel {
        fn with_input(input: &[u8]) -> Self {
            Self {
                rx: RefCell::new(input.iter().copied().collect()),
                tx: RefCell::new(Vec::new()),
            }
        }
    }

    impl ChannelBackend for ScriptChannel {
        fn transmit(&self, byte: u8) -> usize {
            self.tx.borrow_mut().push(byte);
            1
        }

        fn receive(&self) -> u8 {
            self.rx.borrow_mut().pop_front().expect("script exhausted")
        }
    }

    #[test]
    fn carriage_return_translates_and_echoes_crlf() {
        let console = Console::new(ScriptChannel::with_input(b"\r"));
        assert_eq!(console.read_byte(), b'\n');
        assert_eq!(console.channel.tx.borrow().as_slice(), b"\r\n");
    }

    #[test]
    fn ordinary_byte_echoes_once() {
        let console = Console::new(ScriptChannel::with_input(b"a"));
        assert_eq!(console.read_byte(), b'a');
        assert_eq!(console.channel.tx.borrow().as_slice(), b"a");
    }

    #[test]
    fn write_bytes_preserves_order_and_reports_full_length() {
        let console = Console::new(ScriptChannel::with_input(b""));
        assert_eq!(console.write_bytes(b"hello"), 5);
        assert_eq!(console.channel.tx.borrow().as_slice(), b"hello");
    }

    #[test]
    fn put_line_appends_newline_but_does_not_count_it() {
        let console = Console::new(ScriptChannel::with_input(b""));
        assert_eq!(console.put_line("hi"), 2);
        assert_eq!(console.channel.tx.borrow().as_slice(), b"hi\n");
    }

    #[test]
    fn put_line_empty_emits_bare_newline() {
        let console = Console::new(ScriptChannel::with_input(b""));
        assert_eq!(console.put_line(""), 0);
        assert_eq!(console.channel.tx.borrow().as_slice(), b"\n");
    }

    #[test]
    fn fmt_write_maps_newline_to_crlf() {
        use core::fmt::Write;

        let mut console = Console::new(ScriptChannel::with_input(b""));
        write!(console, "ab\ncd").unwrap();
        assert_eq!(console.channel.tx.borrow().as_slice(), b"ab\r\ncd");
    }
}

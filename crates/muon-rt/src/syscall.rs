//! Minimal syscall table.
//!
//! Fixed-answer shims satisfying the runtime library's linkage requirements
//! on hardware with no kernel behind it. Nothing here can fail dynamically:
//! the conditions a real kernel would check (descriptor tables, process
//! tables, signal routing) simply do not exist, so every answer is decided
//! at compile time.

use bitflags::bitflags;

// ── Error numbers ────────────────────────────────────────────────────

/// `EPERM` — operation not permitted.
pub const EPERM: i32 = 1;
/// `EBADF` — bad file descriptor.
pub const EBADF: i32 = 9;
/// `EINVAL` — invalid argument.
pub const EINVAL: i32 = 22;
/// `ESPIPE` — illegal seek.
pub const ESPIPE: i32 = 29;
/// `ENOSYS` — function not implemented.
pub const ENOSYS: i32 = 38;

// ── Process identity ─────────────────────────────────────────────────

/// The only process identifier that exists on bare metal.
pub const PID: i32 = 1;

// ── File metadata ────────────────────────────────────────────────────

bitflags! {
    /// File type bits reported by [`fstat`], POSIX `st_mode` encoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileMode: u32 {
        /// Character device.
        const CHAR_DEVICE = 0o020_000;
        /// Directory.
        const DIRECTORY   = 0o040_000;
        /// Regular file.
        const REGULAR     = 0o100_000;
    }
}

/// File status as reported to the runtime library.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    /// File type and mode bits.
    pub mode: FileMode,
}

impl FileStat {
    /// A zeroed status record for callers to pass into [`fstat`].
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            mode: FileMode::empty(),
        }
    }
}

impl Default for FileStat {
    fn default() -> Self {
        Self::empty()
    }
}

// ── The table ────────────────────────────────────────────────────────

/// Reports whether a descriptor refers to a terminal.
///
/// Every descriptor this layer serves is the console, so the answer is
/// always 1.
#[must_use]
pub fn isatty(_fd: i32) -> i32 {
    1
}

/// Halts execution permanently.
///
/// There is no process to tear down and nowhere to return the code to; the
/// CPU parks in an idle spin.
pub fn exit(_code: i32) -> ! {
    loop {
        core::hint::spin_loop();
    }
}

/// Returns the process identifier. Always [`PID`].
#[must_use]
pub fn getpid() -> i32 {
    PID
}

/// Delivers a signal. Always fails: there is no signal routing.
#[must_use]
pub fn kill(_pid: i32, _sig: i32) -> i32 {
    -1
}

/// Reports file status: every descriptor is a character device.
pub fn fstat(_fd: i32, status: &mut FileStat) -> i32 {
    status.mode = FileMode::CHAR_DEVICE;
    0
}

/// Closes a descriptor. Always fails: there is no descriptor table.
#[must_use]
pub fn close(_fd: i32) -> i32 {
    -1
}

/// Repositions a descriptor. Always reports offset 0: no backing store is
/// seekable. The whence argument is accepted and ignored.
#[must_use]
pub fn lseek(_fd: i32, _offset: i64, _whence: i32) -> i64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isatty_claims_terminal_for_any_descriptor() {
        for fd in [0, 1, 2, 17, -1] {
            assert_eq!(isatty(fd), 1);
        }
    }

    #[test]
    fn getpid_is_constant() {
        assert_eq!(getpid(), 1);
        assert_eq!(getpid(), PID);
    }

    #[test]
    fn kill_always_fails() {
        assert_eq!(kill(1, 9), -1);
        assert_eq!(kill(99, 0), -1);
    }

    #[test]
    fn fstat_reports_char_device_regardless_of_descriptor() {
        for fd in [0, 3, 999] {
            let mut status = FileStat::empty();
            assert_eq!(fstat(fd, &mut status), 0);
            assert!(status.mode.contains(FileMode::CHAR_DEVICE));
            assert!(!status.mode.contains(FileMode::REGULAR));
        }
    }

    #[test]
    fn close_always_fails() {
        assert_eq!(close(0), -1);
        assert_eq!(close(42), -1);
    }

    #[test]
    fn lseek_always_reports_start() {
        assert_eq!(lseek(1, 4096, 0), 0);
        assert_eq!(lseek(1, -20, 2), 0);
    }

    #[test]
    fn errno_values_are_positive_and_distinct() {
        let all = [EPERM, EBADF, EINVAL, ESPIPE, ENOSYS];
        for (i, a) in all.iter().enumerate() {
            assert!(*a > 0);
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}

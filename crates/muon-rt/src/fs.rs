//! Buffered file-operation redirection.
//!
//! The runtime library's file entry points are rerouted through a
//! [`FileBackend`] trait object. A real filesystem is an external
//! collaborator implementing that trait; until one is registered, the
//! inert [`NullBackend`] answers every call with degenerate success —
//! no handle from `open`, zero bytes transferred, metadata operations
//! silently accepted.

use core::fmt;

use bitflags::bitflags;

use muon_core::sync::SpinLock;

/// An opaque handle to an open backend file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle(u32);

impl FileHandle {
    /// Creates a handle from a backend-chosen identifier.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the backend identifier.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

bitflags! {
    /// How a file is opened.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenMode: u8 {
        /// Open for reading.
        const READ   = 0b001;
        /// Open for writing.
        const WRITE  = 0b010;
        /// Writes go to the end of the file.
        const APPEND = 0b100;
    }
}

/// Where a seek is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    /// Offset from the beginning of the file.
    Start(u64),
    /// Offset from the current position.
    Current(i64),
    /// Offset from the end of the file.
    End(i64),
}

/// Filesystem operation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// The path does not name an existing file.
    NotFound,
    /// The handle does not name an open file.
    BadHandle,
    /// The path names a file where a directory was needed.
    NotADirectory,
    /// The path names a directory where a file was needed.
    IsADirectory,
    /// The backend does not implement this operation.
    Unsupported,
    /// Malformed path or argument.
    InvalidArgument,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NotFound => "no such file",
            Self::BadHandle => "bad file handle",
            Self::NotADirectory => "not a directory",
            Self::IsADirectory => "is a directory",
            Self::Unsupported => "operation not supported",
            Self::InvalidArgument => "invalid argument",
        };
        f.write_str(msg)
    }
}

/// The filesystem backend interface.
///
/// Implemented by an external collaborator (e.g. a flash filesystem
/// driver); this layer only defines the call sites. `Sync` because the
/// registered backend is shared process-wide.
pub trait FileBackend: Sync {
    /// Opens `path`, returning a backend-chosen handle.
    fn open(&self, path: &str, mode: OpenMode) -> Result<FileHandle, FsError>;
    /// Closes an open handle.
    fn close(&self, handle: FileHandle) -> Result<(), FsError>;
    /// Reads into `buf`, returning the byte count.
    fn read(&self, handle: FileHandle, buf: &mut [u8]) -> Result<usize, FsError>;
    /// Writes from `buf`, returning the byte count.
    fn write(&self, handle: FileHandle, buf: &[u8]) -> Result<usize, FsError>;
    /// Repositions the handle, returning the new absolute offset.
    fn seek(&self, handle: FileHandle, pos: SeekFrom) -> Result<u64, FsError>;
    /// Returns the handle's current absolute offset.
    fn tell(&self, handle: FileHandle) -> Result<u64, FsError>;
    /// Returns whether the handle is positioned at end-of-file.
    fn is_eof(&self, handle: FileHandle) -> bool;
    /// Renames a file.
    fn rename(&self, from: &str, to: &str) -> Result<(), FsError>;
    /// Removes a file.
    fn remove(&self, path: &str) -> Result<(), FsError>;
    /// Creates a directory.
    fn mkdir(&self, path: &str) -> Result<(), FsError>;
    /// Removes a directory.
    fn rmdir(&self, path: &str) -> Result<(), FsError>;
    /// Changes the working directory.
    fn chdir(&self, path: &str) -> Result<(), FsError>;
    /// Writes the working directory into `buf`, returning its length.
    fn getcwd(&self, buf: &mut [u8]) -> Result<usize, FsError>;
}

// ---------------------------------------------------------------------------
// Inert stub backend
// ---------------------------------------------------------------------------

/// Placeholder backend used until a real filesystem is registered.
///
/// `open` reports that nothing exists; everything else succeeds with
/// zero-length results so redirected callers proceed without error paths
/// firing.
pub struct NullBackend;

impl FileBackend for NullBackend {
    fn open(&self, _path: &str, _mode: OpenMode) -> Result<FileHandle, FsError> {
        Err(FsError::NotFound)
    }

    fn close(&self, _handle: FileHandle) -> Result<(), FsError> {
        Ok(())
    }

    fn read(&self, _handle: FileHandle, _buf: &mut [u8]) -> Result<usize, FsError> {
        Ok(0)
    }

    fn write(&self, _handle: FileHandle, _buf: &[u8]) -> Result<usize, FsError> {
        Ok(0)
    }

    fn seek(&self, _handle: FileHandle, _pos: SeekFrom) -> Result<u64, FsError> {
        Ok(0)
    }

    fn tell(&self, _handle: FileHandle) -> Result<u64, FsError> {
        Ok(0)
    }

    fn is_eof(&self, _handle: FileHandle) -> bool {
        false
    }

    fn rename(&self, _from: &str, _to: &str) -> Result<(), FsError> {
        Ok(())
    }

    fn remove(&self, _path: &str) -> Result<(), FsError> {
        Ok(())
    }

    fn mkdir(&self, _path: &str) -> Result<(), FsError> {
        Ok(())
    }

    fn rmdir(&self, _path: &str) -> Result<(), FsError> {
        Ok(())
    }

    fn chdir(&self, _path: &str) -> Result<(), FsError> {
        Ok(())
    }

    fn getcwd(&self, _buf: &mut [u8]) -> Result<usize, FsError> {
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// Registered backend and redirection surface
// ---------------------------------------------------------------------------

static NULL_BACKEND: NullBackend = NullBackend;

/// The process-wide backend all redirected calls land on.
static BACKEND: SpinLock<&'static dyn FileBackend> = SpinLock::new(&NULL_BACKEND);

/// Installs a filesystem backend, replacing the inert stub.
pub fn register_backend(backend: &'static dyn FileBackend) {
    *BACKEND.lock() = backend;
}

fn with_backend<R>(f: impl FnOnce(&dyn FileBackend) -> R) -> R {
    let backend = BACKEND.lock();
    f(*backend)
}

/// Opens a file through the registered backend. `None` corresponds to the
/// C entry point's null stream.
pub fn fopen(path: &str, mode: OpenMode) -> Option<FileHandle> {
    with_backend(|b| b.open(path, mode).ok())
}

/// Closes a handle through the registered backend.
///
/// # Errors
///
/// Whatever the backend reports; the stub never fails.
pub fn fclose(handle: FileHandle) -> Result<(), FsError> {
    with_backend(|b| b.close(handle))
}

/// Reads through the registered backend; 0 on any failure.
pub fn fread(handle: FileHandle, buf: &mut [u8]) -> usize {
    with_backend(|b| b.read(handle, buf).unwrap_or(0))
}

/// Writes through the registered backend; 0 on any failure.
pub fn fwrite(handle: FileHandle, buf: &[u8]) -> usize {
    with_backend(|b| b.write(handle, buf).unwrap_or(0))
}

/// Repositions a handle through the registered backend.
///
/// # Errors
///
/// Whatever the backend reports; the stub reports offset 0.
pub fn fseek(handle: FileHandle, pos: SeekFrom) -> Result<u64, FsError> {
    with_backend(|b| b.seek(handle, pos))
}

/// Reports a handle's offset through the registered backend; 0 on failure.
pub fn ftell(handle: FileHandle) -> u64 {
    with_backend(|b| b.tell(handle).unwrap_or(0))
}

/// Rewinds a handle to the start of its file. Failures are swallowed, as
/// in the C entry point this mirrors.
pub fn rewind(handle: FileHandle) {
    let _ = fseek(handle, SeekFrom::Start(0));
}

/// Reports end-of-file through the registered backend.
pub fn feof(handle: FileHandle) -> bool {
    with_backend(|b| b.is_eof(handle))
}

/// Renames a file through the registered backend.
///
/// # Errors
///
/// Whatever the backend reports; the stub never fails.
pub fn rename(from: &str, to: &str) -> Result<(), FsError> {
    with_backend(|b| b.rename(from, to))
}

/// Removes a file through the registered backend.
///
/// # Errors
///
/// Whatever the backend reports; the stub never fails.
pub fn remove(path: &str) -> Result<(), FsError> {
    with_backend(|b| b.remove(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn null_backend_has_no_files() {
        assert_eq!(
            NullBackend.open("/boot/config", OpenMode::READ),
            Err(FsError::NotFound)
        );
    }

    #[test]
    fn null_backend_transfers_nothing() {
        let handle = FileHandle::new(0);
        let mut buf = [0u8; 16];
        assert_eq!(NullBackend.read(handle, &mut buf), Ok(0));
        assert_eq!(NullBackend.write(handle, b"data"), Ok(0));
        assert_eq!(NullBackend.seek(handle, SeekFrom::End(-4)), Ok(0));
        assert_eq!(NullBackend.tell(handle), Ok(0));
        assert!(!NullBackend.is_eof(handle));
    }

    #[test]
    fn null_backend_accepts_metadata_operations() {
        assert_eq!(NullBackend.rename("/a", "/b"), Ok(()));
        assert_eq!(NullBackend.remove("/a"), Ok(()));
        assert_eq!(NullBackend.mkdir("/d"), Ok(()));
        assert_eq!(NullBackend.rmdir("/d"), Ok(()));
        assert_eq!(NullBackend.chdir("/d"), Ok(()));
        let mut buf = [0u8; 8];
        assert_eq!(NullBackend.getcwd(&mut buf), Ok(0));
    }

    /// Backend that hands out real handles and counts traffic, to show
    /// redirection reaches whatever is registered.
    struct CountingBackend {
        opens: AtomicU32,
    }

    impl FileBackend for CountingBackend {
        fn open(&self, _path: &str, _mode: OpenMode) -> Result<FileHandle, FsError> {
            let id = self.opens.fetch_add(1, Ordering::Relaxed);
            Ok(FileHandle::new(id + 100))
        }

        fn close(&self, _handle: FileHandle) -> Result<(), FsError> {
            Ok(())
        }

        fn read(&self, _handle: FileHandle, buf: &mut [u8]) -> Result<usize, FsError> {
            let n = buf.len().min(3);
            buf[..n].fill(b'x');
            Ok(n)
        }

        fn write(&self, _handle: FileHandle, buf: &[u8]) -> Result<usize, FsError> {
            Ok(buf.len())
        }

        fn seek(&self, _handle: FileHandle, _pos: SeekFrom) -> Result<u64, FsError> {
            Err(FsError::Unsupported)
        }

        fn tell(&self, _handle: FileHandle) -> Result<u64, FsError> {
            Ok(7)
        }

        fn is_eof(&self, _handle: FileHandle) -> bool {
            true
        }

        fn rename(&self, _from: &str, _to: &str) -> Result<(), FsError> {
            Err(FsError::Unsupported)
        }

        fn remove(&self, _path: &str) -> Result<(), FsError> {
            Err(FsError::Unsupported)
        }

        fn mkdir(&self, _path: &str) -> Result<(), FsError> {
            Ok(())
        }

        fn rmdir(&self, _path: &str) -> Result<(), FsError> {
            Ok(())
        }

        fn chdir(&self, _path: &str) -> Result<(), FsError> {
            Ok(())
        }

        fn getcwd(&self, _buf: &mut [u8]) -> Result<usize, FsError> {
            Ok(0)
        }
    }

    // Registration swaps the process-wide backend, so everything touching
    // the module-level functions lives in this one test.
    #[test]
    fn redirection_reaches_the_registered_backend() {
        // Default stub: no files, zero-length transfers.
        assert!(fopen("/data/log.txt", OpenMode::READ).is_none());
        let mut buf = [0u8; 8];
        assert_eq!(fread(FileHandle::new(0), &mut buf), 0);
        assert_eq!(fwrite(FileHandle::new(0), b"abc"), 0);
        assert!(!feof(FileHandle::new(0)));

        static COUNTING: CountingBackend = CountingBackend {
            opens: AtomicU32::new(0),
        };
        register_backend(&COUNTING);

        let handle = fopen("/data/log.txt", OpenMode::READ | OpenMode::WRITE).unwrap();
        assert_eq!(handle.raw(), 100);
        assert_eq!(fread(handle, &mut buf), 3);
        assert_eq!(&buf[..3], b"xxx");
        assert_eq!(fwrite(handle, b"abc"), 3);
        assert_eq!(fseek(handle, SeekFrom::Current(1)), Err(FsError::Unsupported));
        rewind(handle); // seek failure is swallowed
        assert_eq!(ftell(handle), 7);
        assert!(feof(handle));
        assert_eq!(rename("/data/log.txt", "/data/old.txt"), Err(FsError::Unsupported));
        assert_eq!(remove("/data/log.txt"), Err(FsError::Unsupported));
        assert_eq!(fclose(handle), Ok(()));

        // Back to the stub so later test runs start from known state.
        register_backend(&NULL_BACKEND);
    }
}

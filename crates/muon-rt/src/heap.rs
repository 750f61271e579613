//! Monotonic heap arena.
//!
//! The runtime's dynamic memory comes from a single region bounded by
//! linker-placed symbols. The arena only ever grows: an sbrk-style
//! [`extend`](HeapArena::extend) moves the cursor and hands back the previous
//! position, and nothing is ever reclaimed, so fragmentation cannot occur.
//! A [`GlobalAlloc`] facade on top lets `alloc` collections draw from the
//! same cursor on target builds.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};

use muon_core::sync::SpinLock;

/// Cursor state for the arena.
struct ArenaInner {
    /// First byte of the region.
    start: usize,
    /// One past the last usable byte.
    end: usize,
    /// Next byte to hand out. Always within `start..=end`.
    current: usize,
}

/// A monotonically growing memory arena.
///
/// Const-constructable so the process-wide instance can live in a `static`;
/// unusable until [`init`](Self::init) supplies the region bounds. All
/// cursor movement happens under one spin lock, so foreground and interrupt
/// contexts that share the arena must not nest inside a held lock.
pub struct HeapArena {
    inner: SpinLock<ArenaInner>,
}

impl HeapArena {
    /// Creates an arena with no region. Every request fails until `init`.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            inner: SpinLock::new(ArenaInner {
                start: 0,
                end: 0,
                current: 0,
            }),
        }
    }

    /// Supplies the region bounds and places the cursor at `start`.
    ///
    /// # Safety
    ///
    /// `start..end` must be ordinary readable/writable memory owned
    /// exclusively by this arena for the rest of the program. Must be called
    /// exactly once, before the first allocation.
    pub unsafe fn init(&self, start: usize, end: usize) {
        let mut inner = self.inner.lock();
        debug_assert!(inner.start == 0 && inner.end == 0, "arena already initialized");
        debug_assert!(start <= end, "inverted arena bounds");
        inner.start = start;
        inner.end = end;
        inner.current = start;
    }

    /// Moves the cursor by `delta` bytes and returns its previous position,
    /// i.e. the base of the newly granted region.
    ///
    /// A request that would push the cursor outside `start..=end` returns
    /// `None` and leaves the cursor exactly where it was. Negative deltas
    /// are accepted (the runtime allocator may hand space back wholesale)
    /// under the same bound check against `start`.
    pub fn extend(&self, delta: isize) -> Option<NonNull<u8>> {
        let mut inner = self.inner.lock();
        let candidate = inner.current.checked_add_signed(delta)?;
        if candidate < inner.start || candidate > inner.end {
            return None;
        }
        let previous = inner.current;
        inner.current = candidate;
        NonNull::new(previous as *mut u8)
    }

    /// Bytes handed out so far.
    #[must_use]
    pub fn used(&self) -> usize {
        let inner = self.inner.lock();
        inner.current - inner.start
    }

    /// Bytes still available.
    #[must_use]
    pub fn remaining(&self) -> usize {
        let inner = self.inner.lock();
        inner.end - inner.current
    }
}

// SAFETY: Allocations are carved from a region the arena owns exclusively;
// the cursor only moves under the lock, so two calls can never hand out
// overlapping ranges. `dealloc` is a deliberate no-op (monotonic arena).
unsafe impl GlobalAlloc for HeapArena {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let mut inner = self.inner.lock();
        let Some(aligned) = align_up(inner.current, layout.align()) else {
            return ptr::null_mut();
        };
        let Some(candidate) = aligned.checked_add(layout.size()) else {
            return ptr::null_mut();
        };
        if candidate > inner.end {
            return ptr::null_mut();
        }
        inner.current = candidate;
        aligned as *mut u8
    }

    unsafe fn dealloc(&self, _ptr: *mut u8, _layout: Layout) {
        // Never reclaimed; the arena only grows.
    }
}

/// Rounds `addr` up to `align` (a power of two). `None` on wrap.
#[inline]
fn align_up(addr: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    Some(addr.checked_add(align - 1)? & !(align - 1))
}

// ---------------------------------------------------------------------------
// Process-wide arena
// ---------------------------------------------------------------------------

/// The process-wide heap arena.
#[cfg_attr(target_os = "none", global_allocator)]
static HEAP: HeapArena = HeapArena::empty();

#[cfg(target_os = "none")]
unsafe extern "C" {
    /// First byte of the heap region, placed by the linker script.
    static mut __heap_start: u8;
    /// First byte past the heap region, placed by the linker script.
    static mut __heap_end: u8;
}

/// Initializes the process-wide arena from the linker-placed heap bounds.
///
/// # Safety
///
/// Must be called exactly once, before the first allocation, and the linker
/// script must actually define `__heap_start`/`__heap_end` around a region
/// nothing else uses.
#[cfg(target_os = "none")]
pub unsafe fn init() {
    // SAFETY: Addresses of the linker symbols delimit the heap region; the
    // exclusive-ownership requirement is this function's own contract.
    unsafe {
        let start = &raw mut __heap_start as usize;
        let end = &raw mut __heap_end as usize;
        HEAP.init(start, end);
    }
}

/// Initializes the process-wide arena from an explicit region.
///
/// Off-target builds have no linker-placed heap; verification code supplies
/// a buffer instead.
///
/// # Safety
///
/// Same contract as [`HeapArena::init`].
#[cfg(not(target_os = "none"))]
pub unsafe fn init_with_region(start: usize, len: usize) {
    // SAFETY: Forwarded contract.
    unsafe { HEAP.init(start, start + len) };
}

/// Extends the process-wide arena (the sbrk entry point).
pub fn extend(delta: isize) -> Option<NonNull<u8>> {
    HEAP.extend(delta)
}

/// Bytes handed out from the process-wide arena so far.
#[must_use]
pub fn used() -> usize {
    HEAP.used()
}

/// Bytes still available in the process-wide arena.
#[must_use]
pub fn remaining() -> usize {
    HEAP.remaining()
}

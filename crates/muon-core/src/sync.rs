//! Spin-based mutual exclusion.
//!
//! The runtime layer has no scheduler to yield to, so the only blocking
//! primitive available is a busy-wait lock. Uses test-and-test-and-set so
//! waiters spin on a cached read instead of hammering the lock word.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// A busy-wait mutual exclusion lock.
///
/// Const-constructable so it can protect `static` runtime state. Waiters
/// spin; there is nothing else for them to do on a single bare-metal core.
pub struct SpinLock<T> {
    held: AtomicBool,
    value: UnsafeCell<T>,
}

// SAFETY: Exclusive access to `value` is enforced by the `held` flag, so the
// lock may be shared between the foreground flow and interrupt handlers as
// long as `T` itself can move between them.
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates an unlocked lock around `value`.
    pub const fn new(value: T) -> Self {
        Self {
            held: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, spinning until it is free.
    ///
    /// The returned [`SpinGuard`] releases the lock on drop. Must not be
    /// called from an interrupt handler that may have preempted a holder of
    /// the same lock; that deadlocks.
    pub fn lock(&self) -> SpinGuard<'_, T> {
        loop {
            if self
                .held
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return SpinGuard { lock: self };
            }
            while self.held.load(Ordering::Relaxed) {
                core::hint::spin_loop();
            }
        }
    }

    /// Acquires the lock only if it is currently free.
    ///
    /// The non-blocking variant for fault paths: a panic handler that finds
    /// the lock held must degrade rather than spin forever.
    pub fn try_lock(&self) -> Option<SpinGuard<'_, T>> {
        if self
            .held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinGuard { lock: self })
        } else {
            None
        }
    }

    /// Returns the protected value directly.
    ///
    /// Safe because `&mut self` proves no guard is outstanding.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }
}

/// RAII guard for [`SpinLock`]; releases the lock when dropped.
pub struct SpinGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> Deref for SpinGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Holding the guard means holding the lock.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for SpinGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Holding the guard means holding the lock.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for SpinGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
    }
}

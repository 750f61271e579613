//! Call-stack recorder.
//!
//! A fixed-capacity, depth-indexed record of the currently active call
//! sites, fed by instrumentation hooks at function boundaries and read back
//! by fault-reporting code to produce a best-effort backtrace. Entries past
//! capacity are counted but not stored, so deep recursion can never write
//! outside the buffer and the entry/exit pairing stays balanced.

use muon_core::sync::SpinLock;

use crate::config::BACKTRACE_DEPTH;

/// Recorded call sites plus bookkeeping.
struct TraceBuffer<const N: usize> {
    /// Call-site addresses, innermost last. Only `depth` entries are live.
    frames: [usize; N],
    /// Number of live entries. Never exceeds `N`.
    depth: usize,
    /// Entries that arrived while the buffer was full. Their exits must be
    /// swallowed before `depth` moves again.
    skipped: usize,
}

/// A fixed-capacity call-stack recorder.
///
/// Const-constructable for the process-wide instance. Hooks fire on every
/// instrumented call and return, including inside interrupt handlers, so
/// the state sits behind a spin lock and fault-path readers use
/// [`try_snapshot`](Self::try_snapshot) rather than risking a deadlock.
pub struct TraceRecorder<const N: usize = BACKTRACE_DEPTH> {
    inner: SpinLock<TraceBuffer<N>>,
}

impl<const N: usize> TraceRecorder<N> {
    /// Creates an empty recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: SpinLock::new(TraceBuffer {
                frames: [0; N],
                depth: 0,
                skipped: 0,
            }),
        }
    }

    /// Records entry into a function at `call_site`.
    ///
    /// With the buffer full the entry is dropped and only counted; the
    /// matching [`exit`](Self::exit) will be swallowed to keep the pairing
    /// balanced.
    pub fn enter(&self, call_site: usize) {
        let mut buf = self.inner.lock();
        if buf.depth < N {
            let depth = buf.depth;
            buf.frames[depth] = call_site;
            buf.depth = depth + 1;
        } else {
            buf.skipped += 1;
        }
    }

    /// Records return from the innermost function.
    ///
    /// Tolerates unbalanced calls: with nothing recorded this is a no-op
    /// rather than an underflow.
    pub fn exit(&self) {
        let mut buf = self.inner.lock();
        if buf.skipped > 0 {
            buf.skipped -= 1;
        } else {
            buf.depth = buf.depth.saturating_sub(1);
        }
    }

    /// Current recorded depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.lock().depth
    }

    /// Copies the recorded call sites (outermost first) into `out` and
    /// returns the recorded depth.
    ///
    /// If `out` is shorter than the recorded depth only the outermost
    /// entries are copied; the return value still reports the full depth.
    pub fn snapshot(&self, out: &mut [usize]) -> usize {
        let buf = self.inner.lock();
        let copied = buf.depth.min(out.len());
        out[..copied].copy_from_slice(&buf.frames[..copied]);
        buf.depth
    }

    /// Non-blocking [`snapshot`](Self::snapshot) for fault context.
    ///
    /// Returns `None` if the recorder lock is held, e.g. when a fault fires
    /// mid-update.
    pub fn try_snapshot(&self, out: &mut [usize]) -> Option<usize> {
        let buf = self.inner.try_lock()?;
        let copied = buf.depth.min(out.len());
        out[..copied].copy_from_slice(&buf.frames[..copied]);
        Some(buf.depth)
    }
}

impl<const N: usize> Default for TraceRecorder<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Process-wide recorder and instrumentation hooks
// ---------------------------------------------------------------------------

/// The process-wide recorder fed by the instrumentation hooks.
static RECORDER: TraceRecorder = TraceRecorder::new();

/// Function-entry instrumentation hook.
pub fn enter(call_site: usize) {
    RECORDER.enter(call_site);
}

/// Function-exit instrumentation hook.
pub fn exit() {
    RECORDER.exit();
}

/// Current depth of the process-wide recorder.
#[must_use]
pub fn depth() -> usize {
    RECORDER.depth()
}

/// Snapshot of the process-wide recorder; see [`TraceRecorder::snapshot`].
pub fn snapshot(out: &mut [usize]) -> usize {
    RECORDER.snapshot(out)
}

/// Non-blocking snapshot of the process-wide recorder for fault context.
pub fn try_snapshot(out: &mut [usize]) -> Option<usize> {
    RECORDER.try_snapshot(out)
}

/// Scope-bound instrumentation: records entry on construction and the
/// matching exit when dropped, so early returns and panics unwind the
/// record correctly.
#[must_use = "dropping the frame immediately records an empty scope"]
pub struct ScopedFrame {
    _not_send: core::marker::PhantomData<*const ()>,
}

impl ScopedFrame {
    /// Records entry into the scope at `call_site`.
    pub fn record(call_site: usize) -> Self {
        enter(call_site);
        Self {
            _not_send: core::marker::PhantomData,
        }
    }
}

impl Drop for ScopedFrame {
    fn drop(&mut self) {
        exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_tracks_depth_and_order() {
        let rec = TraceRecorder::<8>::new();
        rec.enter(0x100);
        rec.enter(0x200);
        rec.enter(0x300);
        assert_eq!(rec.depth(), 3);

        let mut out = [0usize; 8];
        assert_eq!(rec.snapshot(&mut out), 3);
        assert_eq!(&out[..3], &[0x100, 0x200, 0x300]);

        rec.exit();
        rec.exit();
        rec.exit();
        assert_eq!(rec.depth(), 0);
    }

    #[test]
    fn overflow_drops_entries_but_stays_balanced() {
        let rec = TraceRecorder::<2>::new();
        rec.enter(0xA);
        rec.enter(0xB);
        rec.enter(0xC);
        rec.enter(0xD);
        assert_eq!(rec.depth(), 2);

        let mut out = [0usize; 2];
        rec.snapshot(&mut out);
        assert_eq!(out, [0xA, 0xB]);

        // The two dropped entries' exits are swallowed first.
        rec.exit();
        rec.exit();
        assert_eq!(rec.depth(), 2);
        rec.exit();
        assert_eq!(rec.depth(), 1);
        rec.exit();
        assert_eq!(rec.depth(), 0);
    }

    #[test]
    fn exit_without_entry_is_a_no_op() {
        let rec = TraceRecorder::<4>::new();
        rec.exit();
        rec.exit();
        assert_eq!(rec.depth(), 0);
        rec.enter(0x1);
        assert_eq!(rec.depth(), 1);
    }

    #[test]
    fn snapshot_truncates_to_output_but_reports_full_depth() {
        let rec = TraceRecorder::<8>::new();
        for site in 1..=5usize {
            rec.enter(site);
        }
        let mut out = [0usize; 3];
        assert_eq!(rec.snapshot(&mut out), 5);
        assert_eq!(out, [1, 2, 3]);
    }

    #[test]
    fn try_snapshot_reads_through_a_free_lock() {
        let rec = TraceRecorder::<4>::new();
        rec.enter(0x42);
        let mut out = [0usize; 4];
        assert_eq!(rec.try_snapshot(&mut out), Some(1));
        assert_eq!(out[0], 0x42);
    }

    // The global hooks and the guard share one static recorder, so all of
    // their coverage lives in a single test.
    #[test]
    fn global_hooks_and_scoped_frames() {
        fn innermost() {
            let _frame = ScopedFrame::record(innermost as usize);
            assert_eq!(depth(), 2);
        }

        fn outer() {
            let _frame = ScopedFrame::record(outer as usize);
            assert_eq!(depth(), 1);
            innermost();
            assert_eq!(depth(), 1);
        }

        assert_eq!(depth(), 0);
        outer();
        assert_eq!(depth(), 0);

        enter(0x10);
        let mut out = [0usize; 4];
        assert_eq!(snapshot(&mut out), 1);
        assert_eq!(out[0], 0x10);
        exit();
        assert_eq!(depth(), 0);
    }
}

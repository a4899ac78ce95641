//! The allocation-tracking shim itself.

use std::mem;

use foldhash::HashMap;

use crate::{AllocHandle, ArenaAlloc, HeapStats, LedgerAnomaly, TrackingMode};

/// Interposes on an arena allocator to maintain a queryable view of heap usage.
///
/// The tracker owns the arena and a ledger mapping every tracked live handle to the
/// size that was requested for it. Each allocate/deallocate call is forwarded to the
/// arena with its result returned verbatim; the bookkeeping rides along without
/// changing the contract the caller sees.
///
/// A ledger entry exists for a handle exactly when that handle came from a successful
/// [`allocate`][Self::allocate] call and has not yet been passed to
/// [`deallocate`][Self::deallocate]. The aggregate counter
/// [`used_bytes`][HeapStats::used_bytes] is always the sum of the ledger's sizes.
///
/// # Examples
///
/// ```
/// use heap_ledger::{FixedArena, HeapTracker};
///
/// let mut tracker = HeapTracker::new(FixedArena::with_capacity(1024));
///
/// let first = tracker.allocate(10).expect("arena has plenty of room");
/// let second = tracker.allocate(20).expect("arena has plenty of room");
/// assert_eq!(tracker.stats().used_bytes(), 30);
///
/// tracker.deallocate(Some(first));
/// assert_eq!(tracker.stats().used_bytes(), 20);
///
/// tracker.deallocate(Some(second));
/// assert_eq!(tracker.stats().used_bytes(), 0);
/// ```
#[derive(Debug)]
pub struct HeapTracker<A: ArenaAlloc> {
    arena: A,

    /// Requested size of every tracked live allocation, keyed by handle.
    ledger: HashMap<AllocHandle, usize>,

    /// Sum of the sizes in the ledger. Maintained incrementally so that a stats
    /// query never walks the ledger.
    used_bytes: usize,

    /// Captured from the arena at construction; fixed for the tracker's lifetime.
    total_capacity: usize,

    mode: TrackingMode,
    anomalies: Vec<LedgerAnomaly>,
}

impl<A: ArenaAlloc> HeapTracker<A> {
    /// Creates a tracker that interposes on `arena` in the default
    /// [`TrackingMode::Permissive`].
    #[must_use]
    pub fn new(arena: A) -> Self {
        Self::with_mode(arena, TrackingMode::Permissive)
    }

    /// Creates a tracker that interposes on `arena` with an explicit mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use heap_ledger::{FixedArena, HeapTracker, TrackingMode};
    ///
    /// let mut tracker =
    ///     HeapTracker::with_mode(FixedArena::with_capacity(256), TrackingMode::Strict);
    ///
    /// let block = tracker.allocate(8).expect("arena has plenty of room");
    /// tracker.deallocate(Some(block));
    /// tracker.deallocate(Some(block)); // Double free; recorded in strict mode.
    ///
    /// assert_eq!(tracker.anomalies().len(), 1);
    /// ```
    #[must_use]
    pub fn with_mode(arena: A, mode: TrackingMode) -> Self {
        let total_capacity = arena.capacity();

        Self {
            arena,
            ledger: HashMap::default(),
            used_bytes: 0,
            total_capacity,
            mode,
            anomalies: Vec::new(),
        }
    }

    /// Allocates `size` bytes through the arena, tracking the allocation on success.
    ///
    /// On exhaustion the arena's `None` is returned unchanged and no bookkeeping is
    /// performed; a failed allocation never appears in the ledger. On success the
    /// handle is returned verbatim after recording `(handle, size)` and adding `size`
    /// to the usage counter. Zero-size requests are tracked like any other size.
    ///
    /// The tracker never fails on its own account.
    pub fn allocate(&mut self, size: usize) -> Option<AllocHandle> {
        let handle = self.arena.allocate(size)?;

        self.used_bytes = self
            .used_bytes
            .checked_add(size)
            .expect("tracked bytes overflow usize - a fixed-capacity arena cannot hand out this much");

        let previous = self.ledger.insert(handle, size);
        debug_assert!(
            previous.is_none(),
            "arena issued a handle that is already live in the ledger"
        );

        Some(handle)
    }

    /// Releases `handle` through the arena, settling the bookkeeping first.
    ///
    /// * `None` (the null handle): no bookkeeping change; still forwarded, since the
    ///   underlying primitive treats null deallocation as a no-op.
    /// * A handle in the ledger: its entry is removed and the recorded size is
    ///   subtracted from the usage counter before forwarding.
    /// * A handle absent from the ledger (double free, or an allocation that bypassed
    ///   the tracker): the recorded size is taken as zero, the counters are left
    ///   untouched, and the handle is still forwarded. The arena remains the
    ///   authority on whether the deallocation itself is valid. In
    ///   [`TrackingMode::Strict`] the event is recorded as a [`LedgerAnomaly`].
    ///
    /// Bookkeeping is settled before the forward call so that it can never be
    /// skipped once the arena has been involved.
    pub fn deallocate(&mut self, handle: Option<AllocHandle>) {
        let Some(handle) = handle else {
            self.arena.deallocate(None);
            return;
        };

        if let Some(size) = self.ledger.remove(&handle) {
            self.used_bytes = self
                .used_bytes
                .checked_sub(size)
                .expect("ledger entry recorded more bytes than the usage counter holds");
        } else if self.mode == TrackingMode::Strict {
            self.anomalies
                .push(LedgerAnomaly::UntrackedDeallocation { handle });
        }

        self.arena.deallocate(Some(handle));
    }

    /// A read-only snapshot of the aggregate statistics.
    ///
    /// Always succeeds and reflects exactly the state left by the most recently
    /// completed allocate/deallocate call.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        HeapStats::new(self.total_capacity, self.used_bytes)
    }

    /// The recorded size of a tracked live allocation, or `None` if the handle has
    /// no ledger entry.
    #[must_use]
    pub fn tracked_size(&self, handle: AllocHandle) -> Option<usize> {
        self.ledger.get(&handle).copied()
    }

    /// Number of tracked live allocations.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.ledger.len()
    }

    /// The mode this tracker was constructed with.
    #[must_use]
    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Anomalies recorded so far. Always empty in [`TrackingMode::Permissive`].
    #[must_use]
    pub fn anomalies(&self) -> &[LedgerAnomaly] {
        &self.anomalies
    }

    /// Removes and returns all recorded anomalies.
    pub fn take_anomalies(&mut self) -> Vec<LedgerAnomaly> {
        mem::take(&mut self.anomalies)
    }

    /// Shared access to the underlying arena.
    #[must_use]
    pub fn arena(&self) -> &A {
        &self.arena
    }

    /// Exclusive access to the underlying arena.
    ///
    /// Allocations made directly on the arena bypass the ledger entirely. Freeing
    /// such a handle through the tracker is the "never tracked" case of
    /// [`deallocate`][Self::deallocate].
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut A {
        &mut self.arena
    }

    /// Consumes the tracker, returning the underlying arena.
    #[must_use]
    pub fn into_arena(self) -> A {
        self.arena
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::FixedArena;

    assert_impl_all!(HeapTracker<FixedArena>: Send);

    /// A scripted arena for exercising the tracker without real block management.
    ///
    /// Issues sequential handles, fails on demand, and counts every forwarded
    /// deallocation (including null) so tests can verify pass-through behavior.
    #[derive(Debug)]
    struct ScriptedArena {
        next_handle: usize,
        fail_next: bool,
        deallocations_forwarded: usize,
        null_deallocations_forwarded: usize,
    }

    impl ScriptedArena {
        fn new() -> Self {
            Self {
                next_handle: 1,
                fail_next: false,
                deallocations_forwarded: 0,
                null_deallocations_forwarded: 0,
            }
        }
    }

    impl ArenaAlloc for ScriptedArena {
        fn allocate(&mut self, _size: usize) -> Option<AllocHandle> {
            if self.fail_next {
                self.fail_next = false;
                return None;
            }

            let handle = AllocHandle::from_raw(
                NonZeroUsize::new(self.next_handle).expect("handles start at 1"),
            );
            self.next_handle = self
                .next_handle
                .checked_add(1)
                .expect("tests never issue this many handles");
            Some(handle)
        }

        fn deallocate(&mut self, handle: Option<AllocHandle>) {
            match handle {
                Some(_) => {
                    self.deallocations_forwarded =
                        self.deallocations_forwarded.wrapping_add(1);
                }
                None => {
                    self.null_deallocations_forwarded =
                        self.null_deallocations_forwarded.wrapping_add(1);
                }
            }
        }

        fn capacity(&self) -> usize {
            65_536
        }
    }

    #[test]
    fn capacity_is_captured_at_construction() {
        let tracker = HeapTracker::new(ScriptedArena::new());

        assert_eq!(tracker.stats().total_capacity(), 65_536);
        assert_eq!(tracker.stats().used_bytes(), 0);
    }

    #[test]
    fn successful_allocation_is_tracked() {
        let mut tracker = HeapTracker::new(ScriptedArena::new());

        let handle = tracker.allocate(64).expect("scripted arena never fails unprompted");

        assert_eq!(tracker.stats().used_bytes(), 64);
        assert_eq!(tracker.tracked_size(handle), Some(64));
        assert_eq!(tracker.tracked_count(), 1);
    }

    #[test]
    fn failed_allocation_leaves_no_trace() {
        let mut tracker = HeapTracker::new(ScriptedArena::new());
        tracker.arena_mut().fail_next = true;

        let result = tracker.allocate(64);

        assert!(result.is_none());
        assert_eq!(tracker.stats().used_bytes(), 0);
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[test]
    fn zero_size_allocation_is_tracked() {
        let mut tracker = HeapTracker::new(ScriptedArena::new());

        let handle = tracker.allocate(0).expect("scripted arena never fails unprompted");

        assert_eq!(tracker.tracked_size(handle), Some(0));
        assert_eq!(tracker.tracked_count(), 1);
        assert_eq!(tracker.stats().used_bytes(), 0);
    }

    #[test]
    fn deallocation_settles_counters_and_forwards() {
        let mut tracker = HeapTracker::new(ScriptedArena::new());

        let handle = tracker.allocate(100).expect("scripted arena never fails unprompted");
        tracker.deallocate(Some(handle));

        assert_eq!(tracker.stats().used_bytes(), 0);
        assert_eq!(tracker.tracked_size(handle), None);
        assert_eq!(tracker.arena().deallocations_forwarded, 1);
    }

    #[test]
    fn null_deallocation_is_forwarded_without_bookkeeping() {
        let mut tracker = HeapTracker::new(ScriptedArena::new());
        let _live = tracker.allocate(32).expect("scripted arena never fails unprompted");

        tracker.deallocate(None);

        assert_eq!(tracker.stats().used_bytes(), 32);
        assert_eq!(tracker.arena().null_deallocations_forwarded, 1);
    }

    #[test]
    fn double_free_is_forwarded_but_changes_nothing() {
        let mut tracker = HeapTracker::new(ScriptedArena::new());

        let keep = tracker.allocate(20).expect("scripted arena never fails unprompted");
        let freed = tracker.allocate(10).expect("scripted arena never fails unprompted");
        tracker.deallocate(Some(freed));
        assert_eq!(tracker.stats().used_bytes(), 20);

        tracker.deallocate(Some(freed));

        assert_eq!(tracker.stats().used_bytes(), 20);
        assert_eq!(tracker.tracked_size(keep), Some(20));
        assert_eq!(tracker.arena().deallocations_forwarded, 2);
    }

    #[test]
    fn unknown_handle_is_forwarded_but_changes_nothing() {
        let mut tracker = HeapTracker::new(ScriptedArena::new());
        let _live = tracker.allocate(50).expect("scripted arena never fails unprompted");

        let foreign =
            AllocHandle::from_raw(NonZeroUsize::new(0xdead).expect("literal is nonzero"));
        tracker.deallocate(Some(foreign));

        assert_eq!(tracker.stats().used_bytes(), 50);
        assert_eq!(tracker.arena().deallocations_forwarded, 1);
    }

    #[test]
    fn permissive_mode_records_no_anomalies() {
        let mut tracker = HeapTracker::new(ScriptedArena::new());

        let handle = tracker.allocate(8).expect("scripted arena never fails unprompted");
        tracker.deallocate(Some(handle));
        tracker.deallocate(Some(handle));

        assert!(tracker.anomalies().is_empty());
    }

    #[test]
    fn strict_mode_records_untracked_deallocations() {
        let mut tracker = HeapTracker::with_mode(ScriptedArena::new(), TrackingMode::Strict);

        let handle = tracker.allocate(8).expect("scripted arena never fails unprompted");
        tracker.deallocate(Some(handle));
        tracker.deallocate(Some(handle));
        tracker.deallocate(None); // Null is not an anomaly.

        assert_eq!(
            tracker.anomalies(),
            &[LedgerAnomaly::UntrackedDeallocation { handle }]
        );
    }

    #[test]
    fn strict_mode_does_not_change_counters_or_forwarding() {
        let mut tracker = HeapTracker::with_mode(ScriptedArena::new(), TrackingMode::Strict);

        let handle = tracker.allocate(8).expect("scripted arena never fails unprompted");
        tracker.deallocate(Some(handle));
        tracker.deallocate(Some(handle));

        assert_eq!(tracker.stats().used_bytes(), 0);
        assert_eq!(tracker.arena().deallocations_forwarded, 2);
    }

    #[test]
    fn take_anomalies_drains_the_record() {
        let mut tracker = HeapTracker::with_mode(ScriptedArena::new(), TrackingMode::Strict);

        let handle = tracker.allocate(8).expect("scripted arena never fails unprompted");
        tracker.deallocate(Some(handle));
        tracker.deallocate(Some(handle));

        assert_eq!(tracker.take_anomalies().len(), 1);
        assert!(tracker.anomalies().is_empty());
    }

    #[test]
    fn conservation_over_a_mixed_sequence() {
        let mut tracker = HeapTracker::new(ScriptedArena::new());
        let baseline = tracker.stats().used_bytes();

        let handles: Vec<_> = [3_usize, 0, 17, 256, 1]
            .into_iter()
            .map(|size| {
                tracker
                    .allocate(size)
                    .expect("scripted arena never fails unprompted")
            })
            .collect();

        for handle in handles {
            tracker.deallocate(Some(handle));
        }

        assert_eq!(tracker.stats().used_bytes(), baseline);
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[test]
    fn into_arena_returns_the_underlying_arena() {
        let mut tracker = HeapTracker::new(ScriptedArena::new());
        let handle = tracker.allocate(4).expect("scripted arena never fails unprompted");
        tracker.deallocate(Some(handle));

        let arena = tracker.into_arena();

        assert_eq!(arena.deallocations_forwarded, 1);
    }
}

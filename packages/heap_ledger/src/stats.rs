//! Aggregate heap-usage statistics.

use std::fmt;

/// A read-only snapshot of aggregate heap usage.
///
/// Produced by [`HeapTracker::stats`][crate::HeapTracker::stats]. The snapshot
/// reflects exactly the state left behind by the most recently completed
/// allocate/deallocate call; there is no asynchronous staleness to account for.
///
/// # Examples
///
/// ```
/// use heap_ledger::{FixedArena, HeapTracker};
///
/// let mut tracker = HeapTracker::new(FixedArena::with_capacity(4096));
/// let _block = tracker.allocate(128).expect("arena has plenty of room");
///
/// let stats = tracker.stats();
/// assert_eq!(stats.total_capacity(), 4096);
/// assert_eq!(stats.used_bytes(), 128);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct HeapStats {
    total_capacity: usize,
    used_bytes: usize,
}

impl HeapStats {
    pub(crate) const fn new(total_capacity: usize, used_bytes: usize) -> Self {
        Self {
            total_capacity,
            used_bytes,
        }
    }

    /// Total bytes backing the arena, fixed at initialization.
    #[must_use]
    pub const fn total_capacity(self) -> usize {
        self.total_capacity
    }

    /// Sum of the requested sizes of all tracked live allocations.
    ///
    /// Allocations made behind the tracker's back (bypass paths) and any stack or
    /// metadata usage inside the arena are not included; this is the ledger's view.
    #[must_use]
    pub const fn used_bytes(self) -> usize {
        self.used_bytes
    }
}

impl fmt::Display for HeapStats {
    #[cfg_attr(test, mutants::skip)] // No API contract for the exact format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} bytes in use",
            self.used_bytes, self.total_capacity
        )
    }
}

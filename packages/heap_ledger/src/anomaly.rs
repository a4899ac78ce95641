//! Strict-mode reporting of bookkeeping anomalies.

use thiserror::Error;

use crate::AllocHandle;

/// Controls how [`HeapTracker`][crate::HeapTracker] reacts to the deallocation of a
/// handle that has no ledger entry.
///
/// Such a deallocation is either a double free or a free of a handle that never
/// passed through the tracker. In both cases the recorded size is taken as zero and
/// the handle is still forwarded to the arena; the modes differ only in whether the
/// event is remembered.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum TrackingMode {
    /// Absorb the event silently. This matches the tolerance of the underlying
    /// deallocation primitive and is the default.
    #[default]
    Permissive,

    /// Additionally record each event as a [`LedgerAnomaly`], retrievable via
    /// [`HeapTracker::anomalies`][crate::HeapTracker::anomalies].
    Strict,
}

/// A bookkeeping mismatch observed while running in [`TrackingMode::Strict`].
///
/// Anomalies are diagnostics, not failures: recording one never alters the
/// allocator-visible behavior of the call that produced it.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum LedgerAnomaly {
    /// A deallocation was requested for a handle with no ledger entry: either a
    /// double free, or a handle from an allocation path that bypassed the tracker.
    #[error("deallocation of untracked handle {handle} (double free or bypass allocation)")]
    UntrackedDeallocation {
        /// The handle the caller attempted to deallocate.
        handle: AllocHandle,
    },
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;
    use std::num::NonZeroUsize;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(LedgerAnomaly: Send, Sync, Debug);

    #[test]
    fn permissive_is_default() {
        assert_eq!(TrackingMode::default(), TrackingMode::Permissive);
    }

    #[test]
    fn untracked_deallocation_names_the_handle() {
        let handle =
            AllocHandle::from_raw(NonZeroUsize::new(0xbeef).expect("literal is nonzero"));
        let anomaly = LedgerAnomaly::UntrackedDeallocation { handle };

        assert!(anomaly.to_string().contains("0xbeef"));
    }
}

//! Opaque handles for arena allocations.

use std::fmt;
use std::num::NonZeroUsize;

/// An opaque identifier for an allocation issued by an arena.
///
/// Handles are produced by [`ArenaAlloc::allocate`][crate::ArenaAlloc::allocate] and are
/// only meaningful to the arena that issued them. The "null handle" of a C-style
/// allocator is modeled as `Option<AllocHandle>::None`, so every `AllocHandle` value
/// refers to an address the arena actually handed out at some point.
///
/// A handle says nothing about liveness: holding one does not prove the allocation has
/// not been freed. The tracker's ledger is the record of what is live.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AllocHandle(NonZeroUsize);

impl AllocHandle {
    /// Creates a handle from a raw nonzero address-like value.
    ///
    /// Intended for [`ArenaAlloc`][crate::ArenaAlloc] implementations. Callers of the
    /// tracker never construct handles themselves; they only pass back what they were
    /// given.
    #[must_use]
    pub const fn from_raw(raw: NonZeroUsize) -> Self {
        Self(raw)
    }

    /// The raw address-like value behind this handle.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for AllocHandle {
    #[cfg_attr(test, mutants::skip)] // No API contract for the exact format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

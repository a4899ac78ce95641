//! The seam between the tracker and the underlying allocation primitives.

use crate::AllocHandle;

/// The two-operation interface of an underlying arena allocator.
///
/// [`HeapTracker`][crate::HeapTracker] interposes on this interface: every call site
/// depends on the tracker (or on this trait), never on raw allocation primitives, so
/// the composition is resolved at construction time rather than by overwriting
/// function references at runtime.
///
/// The trait captures exactly the contract the tracker relies on:
///
/// * allocation either returns a handle or signals exhaustion with `None`;
/// * deallocation accepts any handle, including `None` (the null handle, a no-op),
///   and reports nothing back;
/// * the total byte capacity backing the arena is fixed at initialization.
///
/// The arena, not the tracker, is the authority on whether a concrete deallocation is
/// valid. The tracker forwards even handles it has never seen; an arena that detects
/// true corruption may fail fatally, and that failure is its own.
pub trait ArenaAlloc {
    /// Attempts to allocate `size` bytes, returning `None` when the arena cannot
    /// satisfy the request.
    ///
    /// A `size` of zero is a legal request: while capacity remains it must succeed,
    /// and the returned handle must be distinct from every other live handle.
    fn allocate(&mut self, size: usize) -> Option<AllocHandle>;

    /// Releases the allocation behind `handle`.
    ///
    /// `None` is the null handle and must be treated as a no-op.
    fn deallocate(&mut self, handle: Option<AllocHandle>);

    /// Total bytes backing this arena, fixed at initialization.
    fn capacity(&self) -> usize;
}

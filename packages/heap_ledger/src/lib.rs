//! Allocation-tracking shim for arena allocators.
//!
//! This package interposes a bookkeeping layer between client code and an underlying
//! fixed-capacity arena allocator. The shim records the requested size of every live
//! allocation in a ledger, maintains aggregate heap-usage statistics and exposes them
//! for inspection, all without altering the allocate/deallocate contract the caller
//! sees.
//!
//! The core functionality includes:
//! - [`HeapTracker`] - The tracking shim; owns the arena, the ledger and the counters
//! - [`ArenaAlloc`] - The two-operation interface an underlying arena must provide
//! - [`FixedArena`] - A first-fit arena over a fixed byte buffer, usable as a test
//!   harness or an in-process heap stand-in
//! - [`HeapStats`] - A read-only snapshot of total capacity and live usage
//! - [`TrackingMode`] / [`LedgerAnomaly`] - Optional strict-mode reporting of
//!   double frees and frees of never-tracked handles
//!
//! # Simple usage
//!
//! ```
//! use heap_ledger::{FixedArena, HeapTracker};
//!
//! let mut tracker = HeapTracker::new(FixedArena::with_capacity(1024));
//! assert_eq!(tracker.stats().used_bytes(), 0);
//!
//! let block = tracker.allocate(64).expect("arena has plenty of room");
//! assert_eq!(tracker.stats().used_bytes(), 64);
//!
//! tracker.deallocate(Some(block));
//! assert_eq!(tracker.stats().used_bytes(), 0);
//! ```
//!
//! # Transparency
//!
//! The tracker never introduces a failure mode of its own. Exhaustion is whatever the
//! arena signals, passed through verbatim with no bookkeeping performed. Deallocating
//! the null handle, an already-freed handle or a handle the tracker has never seen is
//! absorbed without touching the counters, because the arena - not the tracker - is
//! the authority on whether a deallocation is valid:
//!
//! ```
//! use heap_ledger::{FixedArena, HeapTracker};
//!
//! let mut tracker = HeapTracker::new(FixedArena::with_capacity(256));
//!
//! let block = tracker.allocate(100).expect("arena has plenty of room");
//! tracker.deallocate(Some(block));
//! tracker.deallocate(Some(block)); // Double free; absorbed, counters unchanged.
//! tracker.deallocate(None); // Null handle; a no-op, as with the arena itself.
//!
//! assert_eq!(tracker.stats().used_bytes(), 0);
//! ```
//!
//! # Diagnosing caller bugs
//!
//! The permissive behavior above can mask genuine mistakes. [`TrackingMode::Strict`]
//! records each suspicious deallocation as a [`LedgerAnomaly`] without changing the
//! allocator-visible behavior in any way:
//!
//! ```
//! use heap_ledger::{FixedArena, HeapTracker, TrackingMode};
//!
//! let mut tracker =
//!     HeapTracker::with_mode(FixedArena::with_capacity(256), TrackingMode::Strict);
//!
//! let block = tracker.allocate(16).expect("arena has plenty of room");
//! tracker.deallocate(Some(block));
//! tracker.deallocate(Some(block));
//!
//! assert_eq!(tracker.take_anomalies().len(), 1);
//! ```
//!
//! # Concurrency
//!
//! All tracker operations take `&mut self`, which makes the
//! lookup/forward/update sequence of each call a single unit by construction.
//! There is no internal locking; a concurrent embedding must wrap the whole
//! tracker in one mutual-exclusion region.

mod anomaly;
mod arena;
mod fixed_arena;
mod handle;
mod stats;
mod tracker;

pub use anomaly::*;
pub use arena::*;
pub use fixed_arena::*;
pub use handle::*;
pub use stats::*;
pub use tracker::*;

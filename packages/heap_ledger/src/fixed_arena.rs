//! A fixed-capacity arena usable as an in-process heap stand-in.

use std::num::NonZeroUsize;

use foldhash::HashMap;

use crate::{AllocHandle, ArenaAlloc};

/// A first-fit arena allocator over a fixed byte buffer.
///
/// Stands in for the statically allocated heap a hosting environment would provide,
/// so the tracker can be exercised end to end without platform allocation
/// primitives. Handles are byte offsets into the buffer; offset zero is reserved and
/// never handed out, which makes every issued offset a valid [`AllocHandle`].
///
/// The arena honors the contract [`ArenaAlloc`] documents:
///
/// * exhaustion is signaled with `None`, never a panic;
/// * zero-size requests succeed while capacity remains, each reserving one byte
///   internally so that distinct live allocations always have distinct handles;
/// * deallocating `None` or an offset that does not address a live block is ignored.
///
/// Freed ranges are coalesced with their neighbors, so a fully drained arena can
/// always satisfy the same requests again.
///
/// # Examples
///
/// ```
/// use heap_ledger::{ArenaAlloc, FixedArena};
///
/// let mut arena = FixedArena::with_capacity(128);
/// let block = arena.allocate(32).expect("arena has plenty of room");
///
/// arena.write_bytes(block, &[1, 2, 3]);
/// assert_eq!(arena.read_bytes(block, 3), &[1, 2, 3]);
///
/// arena.deallocate(Some(block));
/// ```
#[derive(Debug)]
pub struct FixedArena {
    storage: Vec<u8>,

    /// Reserved length of every live block, keyed by its offset.
    blocks: HashMap<usize, usize>,

    /// Disjoint free ranges `(offset, length)`, sorted by offset and never adjacent.
    free: Vec<(usize, usize)>,
}

impl FixedArena {
    /// Creates an arena backed by `capacity` bytes.
    ///
    /// One byte is sacrificed to keep offset zero out of circulation, so the largest
    /// satisfiable single request is `capacity - 1` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let free = match capacity.checked_sub(1) {
            Some(usable) if usable > 0 => vec![(1, usable)],
            _ => Vec::new(),
        };

        Self {
            storage: vec![0; capacity],
            blocks: HashMap::default(),
            free,
        }
    }

    /// Total bytes currently available for allocation.
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.free.iter().map(|&(_, len)| len).sum()
    }

    /// Number of live blocks.
    #[must_use]
    pub fn live_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Copies `data` into the block behind `handle`, starting at its first byte.
    ///
    /// This is the stand-in for a hosting environment writing into memory it was
    /// handed. Only whole live blocks are addressable; there is no pointer
    /// arithmetic across block boundaries.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not address a live block or if `data` does not fit in
    /// the block's reserved length.
    pub fn write_bytes(&mut self, handle: AllocHandle, data: &[u8]) {
        let reserved = self.reserved_len(handle);
        assert!(
            data.len() <= reserved,
            "write of {} bytes does not fit the block behind {handle}",
            data.len(),
        );

        let start = handle.get();
        let end = start
            .checked_add(data.len())
            .expect("block bounds were validated against the reserved length");
        self.storage
            .get_mut(start..end)
            .expect("live blocks lie within the storage buffer")
            .copy_from_slice(data);
    }

    /// Reads `len` bytes from the block behind `handle`, starting at its first byte.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not address a live block or if `len` exceeds the
    /// block's reserved length.
    #[must_use]
    pub fn read_bytes(&self, handle: AllocHandle, len: usize) -> &[u8] {
        let reserved = self.reserved_len(handle);
        assert!(
            len <= reserved,
            "read of {len} bytes exceeds the block behind {handle}",
        );

        let start = handle.get();
        let end = start
            .checked_add(len)
            .expect("block bounds were validated against the reserved length");
        self.storage
            .get(start..end)
            .expect("live blocks lie within the storage buffer")
    }

    fn reserved_len(&self, handle: AllocHandle) -> usize {
        self.blocks
            .get(&handle.get())
            .copied()
            .expect("handle does not address a live block")
    }

    /// Returns a freed range to the free list, merging it with any neighbors.
    fn release(&mut self, offset: usize, len: usize) {
        let index = self.free.partition_point(|&(start, _)| start < offset);
        self.free.insert(index, (offset, len));

        // One linear pass restores the invariant that free ranges are disjoint,
        // sorted, and non-adjacent.
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(self.free.len());
        for &(start, len) in &self.free {
            let adjacent = merged
                .last()
                .is_some_and(|&(last_start, last_len)| last_start.checked_add(last_len) == Some(start));

            if adjacent {
                let last = merged
                    .last_mut()
                    .expect("adjacency check above proved a last element exists");
                last.1 = last
                    .1
                    .checked_add(len)
                    .expect("free ranges never exceed the arena capacity");
            } else {
                merged.push((start, len));
            }
        }
        self.free = merged;
    }
}

impl ArenaAlloc for FixedArena {
    fn allocate(&mut self, size: usize) -> Option<AllocHandle> {
        // A zero-size request still reserves one byte so that every live handle is
        // distinct, mirroring the unique-pointer behavior of malloc(0).
        let reserved = size.max(1);

        let index = self.free.iter().position(|&(_, len)| len >= reserved)?;
        let (offset, len) = *self
            .free
            .get(index)
            .expect("index came from position() over the same vector");

        let remaining = len
            .checked_sub(reserved)
            .expect("first fit guarantees the range holds the reservation");
        if remaining == 0 {
            self.free.remove(index);
        } else {
            let rest_offset = offset
                .checked_add(reserved)
                .expect("free ranges lie within the storage buffer");
            *self
                .free
                .get_mut(index)
                .expect("index came from position() over the same vector") =
                (rest_offset, remaining);
        }

        self.blocks.insert(offset, reserved);
        Some(AllocHandle::from_raw(
            NonZeroUsize::new(offset).expect("offset zero is never part of a free range"),
        ))
    }

    fn deallocate(&mut self, handle: Option<AllocHandle>) {
        let Some(handle) = handle else {
            return;
        };

        // Offsets that do not address a live block (double free, foreign handle) are
        // ignored; this arena does not treat them as corruption.
        let Some(len) = self.blocks.remove(&handle.get()) else {
            return;
        };

        self.release(handle.get(), len);
    }

    fn capacity(&self) -> usize {
        self.storage.len()
    }
}

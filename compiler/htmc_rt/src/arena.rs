//! Fixed-capacity bump arena for the debug backend.
//!
//! Blocks are handed out in 16-byte units from one per-invocation buffer and
//! are never reclaimed individually. [`BumpArena::mark`] records the current
//! offset; [`BumpArena::rewind`] returns to the last mark.

use std::ptr::NonNull;

/// Capacity used by [`BumpArena::new`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// Allocation granularity and alignment.
pub const BLOCK_SIZE: usize = 16;

#[repr(C, align(16))]
#[derive(Clone, Copy)]
struct Block([u8; BLOCK_SIZE]);

pub struct BumpArena {
    storage: Vec<Block>,
    offset: usize,
    last_offset: usize,
}

impl Default for BumpArena {
    fn default() -> Self {
        Self::new()
    }
}

impl BumpArena {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Arena of at least `capacity` bytes, rounded up to whole blocks.
    pub fn with_capacity(capacity: usize) -> Self {
        let blocks = capacity.div_ceil(BLOCK_SIZE);
        Self {
            storage: vec![Block([0; BLOCK_SIZE]); blocks],
            offset: 0,
            last_offset: 0,
        }
    }

    /// Total bytes available.
    pub fn capacity(&self) -> usize {
        self.storage.len() * BLOCK_SIZE
    }

    /// Bytes handed out so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Hand out a block of at least `nbytes`, 16-byte aligned.
    ///
    /// Zero-byte requests take one block. Returns `None`, leaving the arena
    /// unchanged, when the request does not fit.
    pub fn alloc(&mut self, nbytes: usize) -> Option<NonNull<u8>> {
        let size = nbytes.max(1).checked_next_multiple_of(BLOCK_SIZE)?;
        let end = self.offset.checked_add(size)?;
        if end > self.capacity() {
            tracing::debug!(
                requested = nbytes,
                offset = self.offset,
                capacity = self.capacity(),
                "arena exhausted"
            );
            return None;
        }

        let start = self.offset / BLOCK_SIZE;
        self.offset = end;
        // SAFETY: `end <= capacity`, so `start` indexes a block in `storage`.
        let block = unsafe { self.storage.as_mut_ptr().add(start) };
        NonNull::new(block.cast::<u8>())
    }

    /// Record the current offset as the rewind point.
    pub fn mark(&mut self) {
        self.last_offset = self.offset;
    }

    /// Return to the last mark. Idempotent until the next [`mark`](Self::mark).
    pub fn rewind(&mut self) {
        self.offset = self.last_offset;
    }

    /// Returns `true` if `ptr` points into this arena's storage.
    pub fn contains(&self, ptr: *const u8) -> bool {
        let base = self.storage.as_ptr().cast::<u8>() as usize;
        let addr = ptr as usize;
        addr >= base && addr < base + self.capacity()
    }
}

//! Arena (bump) allocator
//!
//! Hands out consecutive sub-spans of one region by advancing an offset.
//! Individual deallocation is a no-op; memory comes back all at once via
//! [`Resettable::reset`] or when the arena is dropped.
//!
//! # Memory Layout
//! ```text
//! [base]--[a1]-[pad]-[a2]--[a3]--[offset]--------free--------[end]
//! ```

use core::cell::Cell;

use super::region::Region;
use super::{Allocator, MemoryBlock, MemoryUsage, Resettable};
use crate::error::{AllocError, AllocResult};

/// Bump allocator over a single backing region
#[derive(Debug)]
pub struct ArenaAllocator<'a> {
    region: Region<'a>,
    offset: Cell<usize>,
}

impl<'a> ArenaAllocator<'a> {
    /// Acquires a region of `capacity` bytes from `upstream`
    ///
    /// # Errors
    /// - [`AllocError::InvalidSize`] for zero capacity
    /// - Whatever `upstream` reports when it cannot supply the region
    pub fn try_new(capacity: usize, upstream: &'a dyn Allocator) -> AllocResult<Self> {
        Ok(Self::with_region(Region::acquire(capacity, upstream)?))
    }

    /// Like [`try_new`](Self::try_new), but a failure to acquire the region
    /// is fatal
    pub fn new(capacity: usize, upstream: &'a dyn Allocator) -> Self {
        Self::with_region(Region::acquire_or_abort(capacity, upstream))
    }

    /// Uses a caller-supplied buffer as the region
    pub fn from_slice(buffer: &'a mut [u8]) -> AllocResult<Self> {
        Ok(Self::with_region(Region::borrowed(buffer)?))
    }

    fn with_region(region: Region<'a>) -> Self {
        Self {
            region,
            offset: Cell::new(0),
        }
    }

    /// Region size in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Bytes consumed so far, alignment padding included
    #[inline]
    pub fn used(&self) -> usize {
        self.offset.get()
    }

    /// Bytes left past the current offset
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.used()
    }
}

// SAFETY: every block is a distinct, aligned sub-span of the region below
// the offset, which only moves forward until reset.
unsafe impl Allocator for ArenaAllocator<'_> {
    fn allocate(&self, size: usize, align: usize) -> AllocResult<MemoryBlock> {
        if size == 0 {
            return Err(AllocError::invalid_size(size));
        }

        let offset = self.offset.get();
        let start = self
            .region
            .bump(offset, size, align)
            .ok_or_else(|| AllocError::out_of_memory_with_available(size, self.available()))?;

        self.offset.set(start + size);
        Ok(self.region.block_at(start, size))
    }

    unsafe fn deallocate(&self, _block: MemoryBlock) {}

    unsafe fn reallocate(
        &self,
        block: MemoryBlock,
        _size: usize,
        _align: usize,
    ) -> AllocResult<MemoryBlock> {
        Ok(block)
    }
}

impl Resettable for ArenaAllocator<'_> {
    unsafe fn reset(&self) {
        self.offset.set(0);
    }
}

impl MemoryUsage for ArenaAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }
}

//! Main stack allocator implementation
//!
//! ## Invariants
//!
//! - `last_offset <= top start <= offset <= capacity` while a top block exists
//! - Only the most recent allocation can be released or resized in place
//! - `restore_to_marker` never moves the offset forward

use core::cell::Cell;
use core::ptr;

use super::StackMarker;
use crate::allocator::region::Region;
use crate::allocator::{Allocator, MemoryBlock, MemoryUsage, Resettable};
use crate::error::{AllocError, AllocResult};

/// Stack allocator that supports LIFO allocation and deallocation
///
/// Like an arena, but the most recent allocation can be popped or resized
/// in place.
///
/// # Memory Layout
/// ```text
/// [base]----[alloc1]----[alloc2]----[alloc3]----[offset]----[free]----[end]
///                            ^ last_offset  ^ top
/// ```
///
/// Deallocating anything other than the top block is silently ignored.
#[derive(Debug)]
pub struct StackAllocator<'a> {
    region: Region<'a>,
    /// Next free offset
    offset: Cell<usize>,
    /// Offset before the most recent allocation
    last_offset: Cell<usize>,
    /// Start offset of the most recent allocation, if it is still live
    top: Cell<Option<usize>>,
}

impl<'a> StackAllocator<'a> {
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
            last_offset: Cell::new(0),
            top: Cell::new(None),
        }
    }

    /// Region size in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Bytes below the current offset
    #[inline]
    pub fn used(&self) -> usize {
        self.offset.get()
    }

    /// Bytes above the current offset
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Captures the current position
    pub fn mark(&self) -> StackMarker {
        StackMarker {
            offset: self.offset.get(),
        }
    }

    /// Rewinds to `marker`, releasing everything allocated after it
    ///
    /// Returns `false` and does nothing when the marker lies ahead of the
    /// current position.
    ///
    /// # Safety
    /// Blocks allocated after `marker` must not be used afterwards.
    pub unsafe fn restore_to_marker(&self, marker: StackMarker) -> bool {
        if marker.offset > self.offset.get() {
            return false;
        }
        self.offset.set(marker.offset);
        self.last_offset.set(marker.offset);
        self.top.set(None);
        true
    }

    /// Whether `block` is the most recent live allocation
    fn is_top(&self, block: &MemoryBlock) -> bool {
        let offset = block.addr().checked_sub(self.region.base());
        offset.is_some() && offset == self.top.get()
    }

    fn push(&self, from: usize, size: usize, align: usize) -> AllocResult<usize> {
        let start = self
            .region
            .bump(from, size, align)
            .ok_or_else(|| AllocError::out_of_memory_with_available(size, self.capacity() - from))?;

        self.last_offset.set(from);
        self.top.set(Some(start));
        self.offset.set(start + size);
        Ok(start)
    }
}

// SAFETY: blocks are distinct aligned sub-spans below the offset; the
// offset only rewinds past a block once that block is released or a marker
// restore invalidates it.
unsafe impl Allocator for StackAllocator<'_> {
    fn allocate(&self, size: usize, align: usize) -> AllocResult<MemoryBlock> {
        let start = self.push(self.offset.get(), size, align)?;
        Ok(self.region.block_at(start, size))
    }

    unsafe fn deallocate(&self, block: MemoryBlock) {
        if self.is_top(&block) {
            self.offset.set(self.last_offset.get());
            self.top.set(None);
        }
    }

    unsafe fn reallocate(
        &self,
        block: MemoryBlock,
        size: usize,
        align: usize,
    ) -> AllocResult<MemoryBlock> {
        if !self.is_top(&block) {
            return Ok(block);
        }

        let old_start = block.addr() - self.region.base();
        let start = self.push(self.last_offset.get(), size, align)?;
        let new_block = self.region.block_at(start, size);

        let keep = block.len().min(size);
        if start != old_start && keep > 0 {
            // SAFETY: both spans lie inside the region; ptr::copy handles
            // the overlap between old and new placement.
            unsafe { ptr::copy(block.as_ptr(), new_block.as_ptr(), keep) };
        }
        Ok(new_block)
    }
}

impl Resettable for StackAllocator<'_> {
    unsafe fn reset(&self) {
        self.offset.set(0);
        self.last_offset.set(0);
        self.top.set(None);
    }
}

impl MemoryUsage for StackAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }
}

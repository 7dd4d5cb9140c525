//! First-fit free-list allocator
//!
//! # Invariants
//!
//! - Every byte of the region is covered by exactly one entry of either the
//!   free set or the reserved set
//! - After any deallocate no two free entries touch or overlap
//! - Reserved entries are keyed by the exact offset handed to the caller

use core::cell::RefCell;
use core::ptr;

#[cfg(feature = "logging")]
use crossfire_log::warn;

use super::blocks::{BlockRange, BlockSet};
use crate::allocator::region::Region;
use crate::allocator::{
    Allocator, FragmentationStats, MemoryBlock, MemoryUsage, Resettable,
};
use crate::error::{AllocError, AllocResult};
use crate::utils::{aligned_offset, checked_align_up};

#[derive(Debug)]
struct Blocks {
    free: BlockSet,
    reserved: BlockSet,
}

impl Blocks {
    fn whole(capacity: usize) -> Self {
        let mut free = BlockSet::new();
        free.insert(0, capacity);
        Self {
            free,
            reserved: BlockSet::new(),
        }
    }
}

/// General-purpose allocator over a single backing region
///
/// Keeps every unused span in an address-ordered free set and every live
/// allocation in a reserved set. Allocation takes the lowest-addressed free
/// span that fits and splits off the remainder; deallocation coalesces the
/// freed span with touching neighbours.
///
/// # Memory Layout
/// ```text
/// [base]-[reserved]-[free]-[reserved][reserved]-[free..............][end]
/// ```
#[derive(Debug)]
pub struct GeneralPurposeAllocator<'a> {
    region: Region<'a>,
    sets: RefCell<Blocks>,
}

impl<'a> GeneralPurposeAllocator<'a> {
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
        let sets = RefCell::new(Blocks::whole(region.len()));
        Self { region, sets }
    }

    /// Region size in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Free spans in address order
    pub fn free_blocks(&self) -> Vec<BlockRange> {
        self.sets.borrow().free.iter().collect()
    }

    /// Reserved spans in address order
    ///
    /// Lengths include the rounding to the requested alignment.
    pub fn reserved_blocks(&self) -> Vec<BlockRange> {
        self.sets.borrow().reserved.iter().collect()
    }

    /// Sum of all free spans
    pub fn free_bytes(&self) -> usize {
        self.sets.borrow().free.total()
    }

    /// Sum of all reserved spans
    pub fn reserved_bytes(&self) -> usize {
        self.sets.borrow().reserved.total()
    }

    /// Whether `block` is a live allocation of this allocator
    pub fn owns(&self, block: &MemoryBlock) -> bool {
        self.region
            .offset_of(block)
            .is_some_and(|offset| self.sets.borrow().reserved.get(offset).is_some())
    }

    /// Shape of the free space
    pub fn fragmentation(&self) -> FragmentationStats {
        let sets = self.sets.borrow();
        let largest = sets.free.iter().map(|b| b.len).max().unwrap_or(0);
        FragmentationStats::calculate(sets.free.total(), largest, sets.free.len())
    }

    /// Checks the bookkeeping invariants
    ///
    /// Conservation, bounds, no overlap between any two entries, and no two
    /// touching free entries.
    pub fn validate(&self) -> Result<(), &'static str> {
        let sets = self.sets.borrow();

        if sets.free.total() + sets.reserved.total() != self.capacity() {
            return Err("free and reserved bytes do not add up to the capacity");
        }

        let mut all: Vec<(BlockRange, bool)> = sets
            .free
            .iter()
            .map(|b| (b, true))
            .chain(sets.reserved.iter().map(|b| (b, false)))
            .collect();
        all.sort_unstable_by_key(|(b, _)| b.offset);

        for pair in all.windows(2) {
            if pair[0].0.end() > pair[1].0.offset {
                return Err("blocks overlap");
            }
        }
        if all.last().is_some_and(|(b, _)| b.end() > self.capacity()) {
            return Err("block extends past the region");
        }

        let free: Vec<BlockRange> = sets.free.iter().collect();
        if free.windows(2).any(|pair| pair[0].end() >= pair[1].offset) {
            return Err("adjacent free blocks were not coalesced");
        }

        Ok(())
    }

    /// First free span able to hold `size` bytes at an `align`-aligned address
    ///
    /// Returns the span and the aligned offset inside it.
    fn find_fit(&self, free: &BlockSet, size: usize, align: usize) -> Option<(BlockRange, usize)> {
        let base = self.region.base();
        free.iter().find_map(|block| {
            let start = aligned_offset(base, block.offset, align)?;
            let end = start.checked_add(size)?;
            (end <= block.end()).then_some((block, start))
        })
    }
}

// SAFETY: a block is handed out only after its span moves from the free set
// to the reserved set, so outstanding blocks never overlap; spans are
// aligned against the absolute address.
unsafe impl Allocator for GeneralPurposeAllocator<'_> {
    fn allocate(&self, size: usize, align: usize) -> AllocResult<MemoryBlock> {
        if size == 0 {
            return Err(AllocError::invalid_size(size));
        }
        let aligned_size =
            checked_align_up(size, align).ok_or_else(|| AllocError::out_of_memory(size))?;

        let mut sets = self.sets.borrow_mut();
        let Some((block, start)) = self.find_fit(&sets.free, aligned_size, align) else {
            let available = sets.free.total();
            return Err(AllocError::out_of_memory_with_available(size, available));
        };

        sets.free.remove(block.offset);
        if start > block.offset {
            sets.free.insert(block.offset, start - block.offset);
        }
        sets.reserved.insert(start, aligned_size);
        let tail = start + aligned_size;
        if tail < block.end() {
            sets.free.insert(tail, block.end() - tail);
        }

        Ok(self.region.block_at(start, size))
    }

    unsafe fn deallocate(&self, block: MemoryBlock) {
        let mut sets = self.sets.borrow_mut();
        let Some((offset, len)) = self
            .region
            .offset_of(&block)
            .and_then(|offset| Some((offset, sets.reserved.remove(offset)?)))
        else {
            #[cfg(feature = "logging")]
            warn!(
                addr = block.addr(),
                len = block.len(),
                "ignoring deallocation of a block this allocator does not own"
            );
            return;
        };

        let mut start = offset;
        let mut end = offset + len;

        if let Some(prev) = sets.free.predecessor(start) {
            if prev.end() >= start {
                sets.free.remove(prev.offset);
                start = prev.offset;
                end = end.max(prev.end());
            }
        }

        while let Some(next) = sets.free.successor(start) {
            if next.offset > end {
                break;
            }
            sets.free.remove(next.offset);
            end = end.max(next.end());
        }

        sets.free.insert(start, end - start);
    }

    unsafe fn reallocate(
        &self,
        block: MemoryBlock,
        size: usize,
        align: usize,
    ) -> AllocResult<MemoryBlock> {
        let new_block = self.allocate(size, align)?;

        let keep = block.len().min(size);
        if keep > 0 {
            // SAFETY: both blocks are live reservations, so they are disjoint.
            unsafe { ptr::copy_nonoverlapping(block.as_ptr(), new_block.as_ptr(), keep) };
        }

        // SAFETY: caller passes a live block from this allocator.
        unsafe { self.deallocate(block) };
        Ok(new_block)
    }
}

impl Resettable for GeneralPurposeAllocator<'_> {
    unsafe fn reset(&self) {
        *self.sets.borrow_mut() = Blocks::whole(self.capacity());
    }
}

impl MemoryUsage for GeneralPurposeAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.reserved_bytes()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.free_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::SystemAllocator;

    fn range(offset: usize, len: usize) -> BlockRange {
        BlockRange { offset, len }
    }

    #[test]
    fn starts_as_one_free_block() {
        let gpa = GeneralPurposeAllocator::try_new(512, &SystemAllocator).unwrap();
        assert_eq!(gpa.free_blocks(), vec![range(0, 512)]);
        assert!(gpa.reserved_blocks().is_empty());
        assert!(gpa.validate().is_ok());
    }

    #[test]
    fn split_reserves_rounded_size() {
        let gpa = GeneralPurposeAllocator::try_new(256, &SystemAllocator).unwrap();
        let block = gpa.allocate(10, 8).unwrap();
        assert_eq!(block.len(), 10);
        assert_eq!(gpa.reserved_blocks(), vec![range(0, 16)]);
        assert_eq!(gpa.free_blocks(), vec![range(16, 240)]);
    }

    #[test]
    fn front_padding_stays_free() {
        let gpa = GeneralPurposeAllocator::try_new(256, &SystemAllocator).unwrap();
        gpa.allocate(4, 4).unwrap();
        let wide = gpa.allocate(16, 16).unwrap();
        assert_eq!(wide.addr() % 16, 0);
        assert_eq!(gpa.free_blocks()[0], range(4, 12));
        assert!(gpa.validate().is_ok());
    }

    #[test]
    fn unknown_blocks_are_ignored() {
        let gpa = GeneralPurposeAllocator::try_new(128, &SystemAllocator).unwrap();
        let block = gpa.allocate(32, 8).unwrap();
        let interior = gpa.region.block_at(8, 8);
        let mut foreign = [0u8; 8];
        let outside = MemoryBlock::new(ptr::NonNull::from(&mut foreign).cast(), 8);

        assert!(gpa.owns(&block));
        assert!(!gpa.owns(&interior));
        // SAFETY: neither block is owned, so both calls are no-ops.
        unsafe {
            gpa.deallocate(interior);
            gpa.deallocate(outside);
        }
        assert_eq!(gpa.reserved_blocks(), vec![range(0, 32)]);
        assert!(gpa.validate().is_ok());
    }

    #[test]
    fn reset_restores_the_whole_region() {
        let gpa = GeneralPurposeAllocator::try_new(128, &SystemAllocator).unwrap();
        gpa.allocate(32, 8).unwrap();
        gpa.allocate(32, 8).unwrap();
        // SAFETY: nothing allocated above is used again.
        unsafe { gpa.reset() };
        assert_eq!(gpa.free_blocks(), vec![range(0, 128)]);
        assert_eq!(gpa.used_memory(), 0);
    }
}

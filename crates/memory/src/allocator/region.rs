//! Backing region shared by the arena, stack and general-purpose strategies

use core::alloc::Layout;
use core::marker::PhantomData;
use core::ptr::NonNull;

#[cfg(feature = "logging")]
use crossfire_log::error;

use super::{Allocator, DEFAULT_ALIGNMENT, MemoryBlock};
use crate::error::{AllocError, AllocResult};
use crate::utils::aligned_offset;

/// One contiguous span of memory
///
/// Either acquired from an upstream allocator, and returned to it exactly
/// once on drop, or borrowed from a caller-supplied buffer for `'a`.
pub(crate) struct Region<'a> {
    block: MemoryBlock,
    upstream: Option<&'a dyn Allocator>,
    _borrow: PhantomData<&'a mut [u8]>,
}

impl<'a> Region<'a> {
    /// Acquires `capacity` bytes from `upstream`
    pub(crate) fn acquire(capacity: usize, upstream: &'a dyn Allocator) -> AllocResult<Self> {
        if capacity == 0 {
            return Err(AllocError::invalid_size(0));
        }
        let block = upstream.allocate(capacity, DEFAULT_ALIGNMENT)?;
        Ok(Self {
            block: block.with_len(capacity),
            upstream: Some(upstream),
            _borrow: PhantomData,
        })
    }

    /// [`acquire`](Self::acquire), treating failure as fatal
    pub(crate) fn acquire_or_abort(capacity: usize, upstream: &'a dyn Allocator) -> Self {
        match Self::acquire(capacity, upstream) {
            Ok(region) => region,
            Err(err) => {
                #[cfg(feature = "logging")]
                error!(capacity, error = %err, "failed to acquire backing region");
                #[cfg(not(feature = "logging"))]
                let _ = err;

                let layout = Layout::from_size_align(capacity.max(1), DEFAULT_ALIGNMENT)
                    .unwrap_or(Layout::new::<u8>());
                std::alloc::handle_alloc_error(layout)
            }
        }
    }

    /// Wraps a caller-supplied buffer
    pub(crate) fn borrowed(buffer: &'a mut [u8]) -> AllocResult<Self> {
        if buffer.is_empty() {
            return Err(AllocError::invalid_size(0));
        }
        let block = MemoryBlock::new(NonNull::from(&mut *buffer).cast(), buffer.len());
        Ok(Self {
            block,
            upstream: None,
            _borrow: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn base(&self) -> usize {
        self.block.addr()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.block.len()
    }

    /// Offset of `block` from the region base, if it starts inside the region
    #[inline]
    pub(crate) fn offset_of(&self, block: &MemoryBlock) -> Option<usize> {
        let offset = block.addr().checked_sub(self.base())?;
        (offset < self.len()).then_some(offset)
    }

    /// Aligned start for `size` bytes bumped from `offset`, if it fits
    #[inline]
    pub(crate) fn bump(&self, offset: usize, size: usize, align: usize) -> Option<usize> {
        let start = aligned_offset(self.base(), offset, align)?;
        let end = start.checked_add(size)?;
        (end <= self.len()).then_some(start)
    }

    /// Block covering `[offset, offset + len)`
    ///
    /// Callers keep `offset + len <= self.len()`.
    #[inline]
    pub(crate) fn block_at(&self, offset: usize, len: usize) -> MemoryBlock {
        debug_assert!(offset + len <= self.len());
        // SAFETY: offset stays within the region, which is a single live
        // allocation, so the result is in bounds and non-null.
        let ptr = unsafe { self.block.as_non_null().add(offset) };
        MemoryBlock::new(ptr, len)
    }
}

impl Drop for Region<'_> {
    fn drop(&mut self) {
        if let Some(upstream) = self.upstream {
            // SAFETY: the block came from upstream.allocate in acquire() and
            // is released exactly once, here.
            unsafe { upstream.deallocate(self.block) };
        }
    }
}

impl core::fmt::Debug for Region<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Region")
            .field("base", &format_args!("{:#x}", self.base()))
            .field("len", &self.len())
            .field("borrowed", &self.upstream.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::SystemAllocator;

    #[test]
    fn zero_capacity_is_rejected() {
        let err = Region::acquire(0, &SystemAllocator).unwrap_err();
        assert!(err.is_invalid_size());
        assert!(Region::borrowed(&mut []).unwrap_err().is_invalid_size());
    }

    #[test]
    fn offsets_only_match_inside() {
        let mut buf = [0u8; 64];
        let region = Region::borrowed(&mut buf).unwrap();
        let inner = region.block_at(16, 8);
        assert_eq!(region.offset_of(&inner), Some(16));

        let outside = MemoryBlock::new(NonNull::from(&mut [0u8; 4]).cast(), 4);
        assert_eq!(region.offset_of(&outside), None);

        let past_end = region.block_at(64, 0);
        assert_eq!(region.offset_of(&past_end), None);
    }
}

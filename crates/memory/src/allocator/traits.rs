//! The allocation contract shared by every strategy
//!
//! The system is built around one core trait:
//! - [`Allocator`]: allocate / deallocate / reallocate of raw [`MemoryBlock`]s,
//!   plus typed helpers layered on top
//!
//! and two capability traits:
//! - [`MemoryUsage`]: capacity reporting
//! - [`Resettable`]: bulk invalidation of every outstanding block
//!
//! # Safety
//!
//! `Allocator` is an unsafe trait: implementors promise that every block
//! returned by `allocate` / `reallocate` is valid for reads and writes of
//! `len` bytes, aligned to the requested alignment, and not handed to anyone
//! else until it is passed back.
//!
//! Blanket impls for `&A` forward every call to `A`, so the contract is
//! preserved through delegation.

use core::mem::{align_of, size_of};
use core::ptr::NonNull;

use super::MemoryBlock;
use super::sealed::private::Sealed;
use crate::error::{AllocError, AllocResult};

/// Alignment used when a strategy acquires its backing region
///
/// Matches the platform's maximum fundamental alignment on the targets we
/// care about.
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Allocation contract
///
/// Sealed: usable as a bound and as `&dyn Allocator` from anywhere, but only
/// implemented by the strategies of this crate.
///
/// # Safety
///
/// Implementors must ensure that:
/// - Returned blocks are valid for reads and writes of `len` bytes
/// - Returned blocks start at an address aligned to the requested alignment
/// - A block is never handed out twice while it is outstanding
pub unsafe trait Allocator: Sealed {
    /// Allocates `size` bytes aligned to `align`
    ///
    /// `align` must be a power of two. Whether `size == 0` is rejected is
    /// strategy-specific.
    ///
    /// # Errors
    /// - [`AllocError::OutOfMemory`] when no region is large enough
    /// - [`AllocError::InvalidSize`] for rejected zero-size requests
    fn allocate(&self, size: usize, align: usize) -> AllocResult<MemoryBlock>;

    /// Releases a block
    ///
    /// # Safety
    /// - `block` must have been returned by this allocator and not released yet
    /// - After this call the block's memory must not be accessed
    unsafe fn deallocate(&self, block: MemoryBlock);

    /// Resizes a block, in place where the strategy can, otherwise by
    /// allocate + copy + release
    ///
    /// On error the original block stays valid.
    ///
    /// # Safety
    /// - `block` must have been returned by this allocator and not released yet
    /// - On success `block` must no longer be used; only the returned block is
    ///   valid
    unsafe fn reallocate(
        &self,
        block: MemoryBlock,
        size: usize,
        align: usize,
    ) -> AllocResult<MemoryBlock>;

    /// Allocates storage for a `T` and moves `value` into it
    ///
    /// Zero-sized types are placed at a dangling, aligned address and never
    /// touch the allocator.
    fn create<T>(&self, value: T) -> AllocResult<NonNull<T>>
    where
        Self: Sized,
    {
        let ptr = if size_of::<T>() == 0 {
            NonNull::<T>::dangling()
        } else {
            self.allocate(size_of::<T>(), align_of::<T>())?
                .as_non_null()
                .cast::<T>()
        };

        // SAFETY: ptr is valid for a write of T (fresh allocation of
        // size_of::<T>() bytes at align_of::<T>(), or dangling for a ZST).
        unsafe { ptr.as_ptr().write(value) };
        Ok(ptr)
    }

    /// Drops the `T` in place and releases its storage
    ///
    /// # Safety
    /// - `ptr` must come from [`create`](Allocator::create) on this allocator
    /// - The value must still be initialized and not destroyed before
    unsafe fn destroy<T>(&self, ptr: NonNull<T>)
    where
        Self: Sized,
    {
        // SAFETY: caller guarantees ptr holds a live T created by us.
        unsafe { ptr.as_ptr().drop_in_place() };

        if size_of::<T>() != 0 {
            let block = MemoryBlock::new(ptr.cast(), size_of::<T>());
            // SAFETY: block is exactly what create() obtained from allocate().
            unsafe { self.deallocate(block) };
        }
    }

    /// Allocates uninitialized storage for `count` values of `T`
    ///
    /// # Errors
    /// `size_of::<T>() * count` overflowing is reported as
    /// [`AllocError::OutOfMemory`].
    fn alloc<T>(&self, count: usize) -> AllocResult<NonNull<[T]>>
    where
        Self: Sized,
    {
        let bytes = size_of::<T>()
            .checked_mul(count)
            .ok_or_else(|| AllocError::out_of_memory(usize::MAX))?;

        let ptr = if bytes == 0 {
            NonNull::<T>::dangling()
        } else {
            self.allocate(bytes, align_of::<T>())?
                .as_non_null()
                .cast::<T>()
        };

        Ok(NonNull::slice_from_raw_parts(ptr, count))
    }

    /// Releases storage obtained from [`alloc`](Allocator::alloc)
    ///
    /// Elements are not dropped.
    ///
    /// # Safety
    /// - `slice` must come from `alloc` on this allocator with the same count
    /// - It must not have been released before
    unsafe fn dealloc<T>(&self, slice: NonNull<[T]>)
    where
        Self: Sized,
    {
        let bytes = size_of::<T>() * slice.len();
        if bytes == 0 {
            return;
        }
        let block = MemoryBlock::new(slice.cast::<u8>(), bytes);
        // SAFETY: caller guarantees the slice came from alloc() on self.
        unsafe { self.deallocate(block) };
    }
}

// SAFETY: forwards every call to A, preserving its contract.
unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, size: usize, align: usize) -> AllocResult<MemoryBlock> {
        (**self).allocate(size, align)
    }

    #[inline]
    unsafe fn deallocate(&self, block: MemoryBlock) {
        // SAFETY: caller upholds A::deallocate's contract.
        unsafe { (**self).deallocate(block) }
    }

    #[inline]
    unsafe fn reallocate(
        &self,
        block: MemoryBlock,
        size: usize,
        align: usize,
    ) -> AllocResult<MemoryBlock> {
        // SAFETY: caller upholds A::reallocate's contract.
        unsafe { (**self).reallocate(block, size, align) }
    }
}

/// Memory usage reporting
pub trait MemoryUsage {
    /// Get currently used memory in bytes
    fn used_memory(&self) -> usize;

    /// Get available memory in bytes (if known)
    fn available_memory(&self) -> Option<usize>;

    /// Get total memory capacity in bytes (if known)
    fn total_memory(&self) -> Option<usize> {
        self.available_memory()
            .map(|available| self.used_memory() + available)
    }

    /// Memory usage as a percentage (0.0 to 100.0)
    ///
    /// `None` if total memory is unknown.
    fn memory_usage_percent(&self) -> Option<f32> {
        self.total_memory().map(|total| {
            if total == 0 {
                0.0
            } else {
                (self.used_memory() as f32 / total as f32) * 100.0
            }
        })
    }

    /// Snapshot of all of the above
    fn memory_usage(&self) -> BasicMemoryUsage {
        BasicMemoryUsage {
            used: self.used_memory(),
            available: self.available_memory(),
            total: self.total_memory(),
            usage_percent: self.memory_usage_percent(),
        }
    }
}

/// Basic memory usage information
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicMemoryUsage {
    /// Currently used memory in bytes
    pub used: usize,
    /// Available memory in bytes (None if unlimited)
    pub available: Option<usize>,
    /// Total memory capacity in bytes (None if unlimited)
    pub total: Option<usize>,
    /// Memory usage as percentage (None if cannot be calculated)
    pub usage_percent: Option<f32>,
}

impl core::fmt::Display for BasicMemoryUsage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "used: {} bytes", self.used)?;

        if let Some(total) = self.total {
            write!(f, ", total: {total} bytes")?;
        }

        if let Some(percent) = self.usage_percent {
            write!(f, " ({percent:.1}%)")?;
        }

        Ok(())
    }
}

/// Allocators that can drop every outstanding block at once
pub trait Resettable {
    /// Reset allocator to initial state
    ///
    /// # Safety
    /// - All blocks allocated before reset become invalid immediately
    /// - Caller must ensure no live references into them exist
    unsafe fn reset(&self);

    /// Check if this allocator can be reset
    fn can_reset(&self) -> bool {
        true
    }
}

//! Tracking allocator implementation
//!
//! Wraps another allocator, counts every operation, poisons memory on the
//! way in and out, and reports leaks when dropped.
//!
//! ## Invariants
//!
//! - Every successful allocation is counted and its bytes added
//! - Every deallocation is counted and its bytes subtracted
//! - Failed allocations only bump the failure counter
//! - Reallocation moves the byte totals by the size delta
//! - Fresh bytes read as `fresh_pattern`; released bytes are overwritten
//!   with `freed_pattern` before the inner allocator sees them

use core::cell::Cell;
use core::mem::ManuallyDrop;
use core::ptr;

#[cfg(feature = "logging")]
use crossfire_log::error;

use super::{Allocator, AllocatorStats, MemoryBlock, MemoryUsage, Resettable};
use crate::error::AllocResult;

/// Byte written over freshly allocated memory
pub const FRESH_PATTERN: u8 = 0xAA;

/// Byte written over memory right before it is released
pub const FREED_PATTERN: u8 = 0xDD;

/// Configuration for [`TrackingAllocator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Fill allocated and released bytes with the patterns below
    pub poison: bool,
    /// Pattern for fresh bytes
    pub fresh_pattern: u8,
    /// Pattern for released bytes
    pub freed_pattern: u8,
    /// Log an error on drop when counters do not balance
    pub report_leaks: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            poison: true,
            fresh_pattern: FRESH_PATTERN,
            freed_pattern: FREED_PATTERN,
            report_leaks: true,
        }
    }
}

impl TrackingConfig {
    /// Counting only: no poisoning and no leak report
    pub fn quiet() -> Self {
        Self {
            poison: false,
            report_leaks: false,
            ..Self::default()
        }
    }
}

/// A wrapper allocator that tracks usage and poisons memory
///
/// Owns its inner allocator; wrap `&A` to observe an allocator that lives
/// elsewhere.
#[derive(Debug)]
pub struct TrackingAllocator<A> {
    inner: A,
    config: TrackingConfig,
    stats: Cell<AllocatorStats>,
}

impl<A> TrackingAllocator<A> {
    /// Creates a tracker with the default configuration
    pub fn new(allocator: A) -> Self {
        Self::with_config(allocator, TrackingConfig::default())
    }

    /// Creates a tracker with a custom configuration
    pub fn with_config(allocator: A, config: TrackingConfig) -> Self {
        Self {
            inner: allocator,
            config,
            stats: Cell::new(AllocatorStats::new()),
        }
    }

    /// Gets a reference to the underlying allocator
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Consumes the tracker without a leak report and returns the
    /// underlying allocator
    pub fn into_inner(self) -> A {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so `inner` is moved out exactly
        // once; the remaining fields need no drop.
        unsafe { ptr::read(&this.inner) }
    }

    /// Active configuration
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Number of successful allocations
    pub fn allocation_count(&self) -> usize {
        self.stats.get().allocation_count
    }

    /// Number of deallocations
    pub fn deallocation_count(&self) -> usize {
        self.stats.get().deallocation_count
    }

    /// Cumulative bytes allocated
    pub fn allocated_bytes(&self) -> usize {
        self.stats.get().total_bytes_allocated
    }

    /// Cumulative bytes deallocated
    pub fn deallocated_bytes(&self) -> usize {
        self.stats.get().total_bytes_deallocated
    }

    /// Bytes currently outstanding
    pub fn current_usage(&self) -> usize {
        self.stats.get().allocated_bytes
    }

    /// Highest value `current_usage` has reached
    pub fn peak_usage(&self) -> usize {
        self.stats.get().peak_allocated_bytes
    }

    /// Snapshot of every counter
    pub fn statistics(&self) -> AllocatorStats {
        self.stats.get()
    }

    /// Zeroes every counter
    pub fn reset_statistics(&self) {
        self.stats.set(AllocatorStats::new());
    }

    /// Whether counts or byte totals currently disagree
    pub fn detect_leaks(&self) -> bool {
        self.stats.get().has_leaks()
    }

    fn update(&self, f: impl FnOnce(&mut AllocatorStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn poison(&self, block: &MemoryBlock, from: usize, pattern: u8) {
        if !self.config.poison || from >= block.len() {
            return;
        }
        // SAFETY: callers pass live blocks they may write; from < len.
        unsafe { ptr::write_bytes(block.as_ptr().add(from), pattern, block.len() - from) };
    }
}

// SAFETY: forwards to the inner allocator; counting and poisoning only touch
// bytes inside blocks the caller currently owns.
unsafe impl<A: Allocator> Allocator for TrackingAllocator<A> {
    fn allocate(&self, size: usize, align: usize) -> AllocResult<MemoryBlock> {
        match self.inner.allocate(size, align) {
            Ok(block) => {
                self.update(|s| s.record_allocation(block.len()));
                self.poison(&block, 0, self.config.fresh_pattern);
                Ok(block)
            }
            Err(err) => {
                self.update(AllocatorStats::record_failure);
                Err(err)
            }
        }
    }

    unsafe fn deallocate(&self, block: MemoryBlock) {
        self.poison(&block, 0, self.config.freed_pattern);
        // SAFETY: caller upholds the inner deallocate contract.
        unsafe { self.inner.deallocate(block) };
        self.update(|s| s.record_deallocation(block.len()));
    }

    unsafe fn reallocate(
        &self,
        block: MemoryBlock,
        size: usize,
        align: usize,
    ) -> AllocResult<MemoryBlock> {
        // SAFETY: caller upholds the inner reallocate contract.
        match unsafe { self.inner.reallocate(block, size, align) } {
            Ok(new_block) => {
                self.update(|s| s.record_reallocation(block.len(), new_block.len()));
                self.poison(&new_block, block.len(), self.config.fresh_pattern);
                Ok(new_block)
            }
            Err(err) => {
                self.update(AllocatorStats::record_failure);
                Err(err)
            }
        }
    }
}

impl<A: MemoryUsage> MemoryUsage for TrackingAllocator<A> {
    fn used_memory(&self) -> usize {
        self.inner.used_memory()
    }

    fn available_memory(&self) -> Option<usize> {
        self.inner.available_memory()
    }
}

impl<A: Resettable> Resettable for TrackingAllocator<A> {
    unsafe fn reset(&self) {
        // SAFETY: caller guarantees no block from before the reset is used.
        unsafe { self.inner.reset() };
        self.reset_statistics();
    }

    fn can_reset(&self) -> bool {
        self.inner.can_reset()
    }
}

impl<A> Drop for TrackingAllocator<A> {
    fn drop(&mut self) {
        let stats = self.stats.get();
        if !self.config.report_leaks || !stats.has_leaks() {
            return;
        }

        #[cfg(feature = "logging")]
        error!(
            allocations = stats.allocation_count,
            deallocations = stats.deallocation_count,
            bytes_allocated = stats.total_bytes_allocated,
            bytes_deallocated = stats.total_bytes_deallocated,
            outstanding = stats.allocated_bytes,
            "memory leak detected: {} allocation(s) not released, {} byte(s) outstanding",
            stats.outstanding_allocations(),
            stats.allocated_bytes,
        );
    }
}

/// Convenience trait for easy wrapping
pub trait TrackExt: Allocator + Sized {
    /// Wrap this allocator with tracking
    fn with_tracking(self) -> TrackingAllocator<Self> {
        TrackingAllocator::new(self)
    }
}

impl<A: Allocator> TrackExt for A {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::SystemAllocator;

    #[test]
    fn basic_tracking() {
        let allocator = SystemAllocator::new().with_tracking();

        assert_eq!(allocator.allocation_count(), 0);
        assert_eq!(allocator.current_usage(), 0);

        let block = allocator.allocate(8, 8).unwrap();
        assert_eq!(allocator.allocation_count(), 1);
        assert_eq!(allocator.current_usage(), 8);

        // SAFETY: block came from this allocator.
        unsafe { allocator.deallocate(block) };
        assert_eq!(allocator.deallocation_count(), 1);
        assert_eq!(allocator.current_usage(), 0);
        assert_eq!(allocator.deallocated_bytes(), 8);
        assert!(!allocator.detect_leaks());
    }

    #[test]
    fn peak_tracking() {
        let allocator = SystemAllocator::new().with_tracking();

        let a = allocator.allocate(8, 8).unwrap();
        let b = allocator.allocate(8, 8).unwrap();
        assert_eq!(allocator.peak_usage(), 16);

        // SAFETY: both blocks came from this allocator.
        unsafe {
            allocator.deallocate(a);
            allocator.deallocate(b);
        }
        assert_eq!(allocator.peak_usage(), 16);
    }

    #[test]
    fn leak_detection() {
        let allocator = TrackingAllocator::with_config(SystemAllocator, TrackingConfig::quiet());
        let kept = allocator.allocate(8, 8).unwrap();
        let freed = allocator.allocate(8, 8).unwrap();

        // SAFETY: freed came from this allocator.
        unsafe { allocator.deallocate(freed) };
        assert!(allocator.detect_leaks());
        assert_eq!(allocator.statistics().outstanding_allocations(), 1);

        // SAFETY: clean up so nothing leaks from the test itself.
        unsafe { allocator.deallocate(kept) };
    }

    #[test]
    fn quiet_config_skips_poisoning() {
        let mut buf = [0u8; 32];
        let arena = crate::allocator::ArenaAllocator::from_slice(&mut buf).unwrap();
        let allocator = TrackingAllocator::with_config(&arena, TrackingConfig::quiet());
        let block = allocator.allocate(16, 1).unwrap();
        // SAFETY: block is live.
        assert!(unsafe { block.as_slice() }.iter().all(|&b| b == 0));
    }

    #[test]
    fn into_inner_returns_the_allocator() {
        let tracked = TrackingAllocator::new(SystemAllocator);
        let _leak = tracked.allocate(0, 1).unwrap();
        let _system: SystemAllocator = tracked.into_inner();
    }
}

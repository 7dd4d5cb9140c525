//! Allocation statistics
//!
//! [`AllocatorStats`] is a plain `Copy` snapshot; the tracking decorator
//! keeps one in a `Cell` and updates it through the `record_*` methods.
//! [`FragmentationStats`] describes the free space of a free-list strategy.

use core::fmt;

/// Statistics for memory allocators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Total bytes currently allocated
    pub allocated_bytes: usize,
    /// Peak bytes allocated
    pub peak_allocated_bytes: usize,
    /// Total number of allocations
    pub allocation_count: usize,
    /// Total number of deallocations
    pub deallocation_count: usize,
    /// Total number of reallocations
    pub reallocation_count: usize,
    /// Number of failed allocations
    pub failed_allocations: usize,
    /// Total bytes ever allocated (cumulative)
    pub total_bytes_allocated: usize,
    /// Total bytes ever deallocated (cumulative)
    pub total_bytes_deallocated: usize,
}

impl AllocatorStats {
    /// Creates a new empty stats object
    pub const fn new() -> Self {
        Self {
            allocated_bytes: 0,
            peak_allocated_bytes: 0,
            allocation_count: 0,
            deallocation_count: 0,
            reallocation_count: 0,
            failed_allocations: 0,
            total_bytes_allocated: 0,
            total_bytes_deallocated: 0,
        }
    }

    /// Reset all statistics to zero
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn record_allocation(&mut self, bytes: usize) {
        self.allocation_count += 1;
        self.grow(bytes);
    }

    pub(crate) fn record_deallocation(&mut self, bytes: usize) {
        self.deallocation_count += 1;
        self.shrink(bytes);
    }

    pub(crate) fn record_reallocation(&mut self, old: usize, new: usize) {
        self.reallocation_count += 1;
        if new > old {
            self.grow(new - old);
        } else {
            self.shrink(old - new);
        }
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed_allocations += 1;
    }

    fn grow(&mut self, bytes: usize) {
        self.total_bytes_allocated += bytes;
        self.allocated_bytes += bytes;
        self.peak_allocated_bytes = self.peak_allocated_bytes.max(self.allocated_bytes);
    }

    fn shrink(&mut self, bytes: usize) {
        self.total_bytes_deallocated += bytes;
        self.allocated_bytes = self.allocated_bytes.saturating_sub(bytes);
    }

    /// Calculate the average allocation size
    pub fn average_allocation_size(&self) -> Option<f64> {
        if self.allocation_count > 0 {
            Some(self.total_bytes_allocated as f64 / self.allocation_count as f64)
        } else {
            None
        }
    }

    /// Allocations not yet matched by a deallocation
    pub fn outstanding_allocations(&self) -> usize {
        self.allocation_count.saturating_sub(self.deallocation_count)
    }

    /// Counts or byte totals disagree
    pub fn has_leaks(&self) -> bool {
        self.allocation_count != self.deallocation_count
            || self.total_bytes_allocated != self.total_bytes_deallocated
    }

    /// Fraction of allocation attempts that succeeded (0.0 to 1.0)
    pub fn allocation_efficiency(&self) -> f64 {
        let total_attempts = self.allocation_count + self.failed_allocations;
        if total_attempts > 0 {
            self.allocation_count as f64 / total_attempts as f64
        } else {
            1.0
        }
    }
}

impl fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Allocator Statistics:")?;
        writeln!(f, "  Current allocated: {} bytes", self.allocated_bytes)?;
        writeln!(f, "  Peak allocated: {} bytes", self.peak_allocated_bytes)?;
        writeln!(f, "  Allocations: {}", self.allocation_count)?;
        writeln!(f, "  Deallocations: {}", self.deallocation_count)?;
        writeln!(f, "  Reallocations: {}", self.reallocation_count)?;
        writeln!(f, "  Failed allocations: {}", self.failed_allocations)?;

        if let Some(avg) = self.average_allocation_size() {
            writeln!(f, "  Average allocation size: {avg:.2} bytes")?;
        }

        write!(
            f,
            "  Allocation efficiency: {:.2}%",
            self.allocation_efficiency() * 100.0
        )
    }
}

/// Fragmentation statistics for memory analysis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FragmentationStats {
    /// Total free memory across all fragments (bytes)
    pub total_free: usize,

    /// Size of the largest contiguous free block (bytes)
    pub largest_block: usize,

    /// Number of distinct free fragments
    pub fragment_count: usize,

    /// External fragmentation ratio (0-100)
    ///
    /// Calculated as: `100 * (1 - largest_block / total_free)`
    pub fragmentation_percent: u8,
}

impl FragmentationStats {
    /// Calculate fragmentation percentage from free space metrics
    pub fn calculate(total_free: usize, largest_block: usize, fragment_count: usize) -> Self {
        let fragmentation_percent = if total_free > 0 {
            let ratio = 1.0 - (largest_block as f64 / total_free as f64);
            (ratio * 100.0).clamp(0.0, 100.0) as u8
        } else {
            0
        };

        Self {
            total_free,
            largest_block,
            fragment_count,
            fragmentation_percent,
        }
    }

    /// Check if fragmentation is concerning (>50%)
    #[inline]
    pub fn is_fragmented(&self) -> bool {
        self.fragmentation_percent > 50
    }
}

impl fmt::Display for FragmentationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes free in {} fragments, largest {} bytes ({}% fragmented)",
            self.total_free, self.fragment_count, self.largest_block, self.fragmentation_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_survives_deallocation() {
        let mut stats = AllocatorStats::new();
        stats.record_allocation(100);
        stats.record_allocation(50);
        stats.record_deallocation(100);

        assert_eq!(stats.allocated_bytes, 50);
        assert_eq!(stats.peak_allocated_bytes, 150);
        assert_eq!(stats.outstanding_allocations(), 1);
        assert!(stats.has_leaks());
    }

    #[test]
    fn reallocation_moves_byte_totals() {
        let mut stats = AllocatorStats::new();
        stats.record_allocation(64);
        stats.record_reallocation(64, 128);
        assert_eq!(stats.total_bytes_allocated, 128);
        assert_eq!(stats.allocated_bytes, 128);

        stats.record_reallocation(128, 32);
        assert_eq!(stats.total_bytes_deallocated, 96);
        assert_eq!(stats.allocated_bytes, 32);

        stats.record_deallocation(32);
        assert!(!stats.has_leaks());
        assert_eq!(stats.reallocation_count, 2);
    }

    #[test]
    fn fragmentation_percent() {
        let whole = FragmentationStats::calculate(1000, 1000, 1);
        assert_eq!(whole.fragmentation_percent, 0);
        assert!(!whole.is_fragmented());

        let split = FragmentationStats::calculate(1000, 200, 5);
        assert_eq!(split.fragmentation_percent, 80);
        assert!(split.is_fragmented());

        assert_eq!(FragmentationStats::calculate(0, 0, 0).fragmentation_percent, 0);
    }
}

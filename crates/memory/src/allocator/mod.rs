//! Allocation contract and strategies
//!
//! Every strategy implements the sealed [`Allocator`] trait:
//! - [`SystemAllocator`] - the platform allocator, the usual upstream
//! - [`ArenaAllocator`] - bump allocation, bulk release only
//! - [`StackAllocator`] - bump allocation with LIFO release and markers
//! - [`GeneralPurposeAllocator`] - first-fit free list with coalescing
//! - [`TrackingAllocator`] - counting and poisoning decorator over any of
//!   the above

// Core allocator types
mod block;
mod region;
mod stats;
mod system;
mod traits;
mod tracking;

pub(crate) mod sealed;

// Allocator implementations
pub mod arena;
pub mod general;
pub mod stack;

// Re-exports for convenience
pub use arena::ArenaAllocator;
pub use block::MemoryBlock;
pub use general::{BlockRange, GeneralPurposeAllocator};
pub use stack::{StackAllocator, StackFrame, StackMarker};
pub use stats::{AllocatorStats, FragmentationStats};
pub use system::SystemAllocator;
pub use tracking::{FREED_PATTERN, FRESH_PATTERN, TrackExt, TrackingAllocator, TrackingConfig};
pub use traits::{Allocator, BasicMemoryUsage, DEFAULT_ALIGNMENT, MemoryUsage, Resettable};

pub use crate::error::{AllocError, AllocResult};

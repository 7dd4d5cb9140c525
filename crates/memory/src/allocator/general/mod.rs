//! General-purpose first-fit allocator with coalescing
//!
//! ## Modules
//! - `allocator` - [`GeneralPurposeAllocator`] itself
//! - `blocks` - address-ordered block sets and [`BlockRange`]

pub mod allocator;
pub mod blocks;

pub use allocator::GeneralPurposeAllocator;
pub use blocks::BlockRange;

//! # crossfire-memory
//!
//! Pluggable memory allocation for CrossFire.
//!
//! One allocation contract ([`allocator::Allocator`]) with interchangeable
//! strategies:
//! - OS-backed allocation through the platform allocator
//! - Arena (bump) and stack (LIFO bump) allocators over a single region
//! - A general-purpose first-fit free-list allocator with coalescing
//! - A tracking decorator that counts, poisons and reports leaks
//!
//! plus [`Unique`](ownership::Unique) and [`Shared`](ownership::Shared)
//! handles built purely on the contract.
//!
//! ## Quick Start
//!
//! ```rust
//! use crossfire_memory::prelude::*;
//!
//! # fn main() -> AllocResult<()> {
//! let gpa = GeneralPurposeAllocator::try_new(4096, &SystemAllocator)?;
//! let tracked = gpa.with_tracking();
//!
//! let block = tracked.allocate(100, 8)?;
//! // SAFETY: block came from `tracked` and is released once.
//! unsafe { tracked.deallocate(block) };
//!
//! let value = Unique::new(42u32, &tracked)?;
//! assert_eq!(*value, 42);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `logging` (default): leak reports and allocator diagnostics through
//!   `crossfire-log`
//!
//! ## Threading
//!
//! Allocators use `Cell` / `RefCell` bookkeeping and are `!Sync`; share one
//! across threads only behind your own synchronization.

#![warn(clippy::all)]
#![warn(rust_2018_idioms)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Precision loss in usize -> f64 casts is acceptable for stats
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod allocator;
pub mod error;
pub mod ownership;
pub mod utils;

/// Prelude for common imports
pub mod prelude {
    pub use crate::allocator::{
        AllocError, AllocResult, Allocator, ArenaAllocator, GeneralPurposeAllocator, MemoryBlock,
        MemoryUsage, Resettable, StackAllocator, StackFrame, SystemAllocator, TrackExt,
        TrackingAllocator, TrackingConfig,
    };
    pub use crate::ownership::{Shared, Unique};
}

//! Stack allocator for LIFO memory management
//!
//! ## Modules
//! - `allocator` - [`StackAllocator`] with LIFO semantics
//! - `frame` - RAII helper for automatic stack restoration
//! - `marker` - Position markers for scoped deallocation

pub mod allocator;
pub mod frame;
pub mod marker;

pub use allocator::StackAllocator;
pub use frame::StackFrame;
pub use marker::StackMarker;

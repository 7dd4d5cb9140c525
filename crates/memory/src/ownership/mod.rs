//! Smart handles built purely on the allocation contract
//!
//! - [`Unique`] - exclusive ownership, destroyed on drop
//! - [`Shared`] - shared ownership with a count cell from the same allocator
//!
//! Both borrow their allocator for `'a`, so the allocator (and its region)
//! always outlives the handles it produced.

mod shared;
mod unique;

pub use shared::Shared;
pub use unique::Unique;

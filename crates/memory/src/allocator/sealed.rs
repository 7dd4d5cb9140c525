//! Sealing for the allocation contract
//!
//! [`Allocator`](super::Allocator) can be named and used as a bound from any
//! crate, but only the strategies defined here implement it. The set of
//! variants is closed, which keeps the block bookkeeping invariants inside
//! this crate.

pub(crate) mod private {
    /// Private sealing trait; not nameable outside `crossfire-memory`
    pub trait Sealed {}

    impl Sealed for crate::allocator::system::SystemAllocator {}
    impl Sealed for crate::allocator::arena::ArenaAllocator<'_> {}
    impl Sealed for crate::allocator::stack::StackAllocator<'_> {}
    impl Sealed for crate::allocator::general::GeneralPurposeAllocator<'_> {}

    // Wrappers are sealed for any inner allocator
    impl<A> Sealed for crate::allocator::tracking::TrackingAllocator<A> {}

    // References to sealed types are also sealed
    impl<T: ?Sized + Sealed> Sealed for &T {}
}

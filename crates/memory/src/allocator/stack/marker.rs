//! Stack marker for position tracking

/// Marker representing a position in the stack allocator
///
/// Can be used to reset the allocator to this position, releasing every
/// allocation made after the marker was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StackMarker {
    pub(super) offset: usize,
}

impl StackMarker {
    /// Region offset captured by this marker
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

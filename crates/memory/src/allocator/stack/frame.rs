//! RAII-based stack frame for automatic restoration

use super::{StackAllocator, StackMarker};

/// Restores its allocator to the position captured at construction when
/// dropped
///
/// Every block allocated from the allocator while the frame is alive is
/// released with it, so none of them may outlive the frame.
pub struct StackFrame<'s, 'a> {
    allocator: &'s StackAllocator<'a>,
    marker: StackMarker,
}

impl<'s, 'a> StackFrame<'s, 'a> {
    /// Creates a new stack frame that will restore to the current position
    /// when dropped
    pub fn new(allocator: &'s StackAllocator<'a>) -> Self {
        let marker = allocator.mark();
        Self { allocator, marker }
    }

    /// Gets the underlying allocator
    pub fn allocator(&self) -> &'s StackAllocator<'a> {
        self.allocator
    }

    /// Position this frame will restore to
    pub fn marker(&self) -> StackMarker {
        self.marker
    }

    /// Manually restore and consume this frame
    pub fn restore(self) {
        drop(self);
    }
}

impl Drop for StackFrame<'_, '_> {
    fn drop(&mut self) {
        // SAFETY: blocks allocated inside the frame are not used past it.
        unsafe {
            let _ = self.allocator.restore_to_marker(self.marker);
        }
    }
}

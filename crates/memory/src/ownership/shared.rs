use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::NonNull;

use crate::allocator::Allocator;
use crate::error::AllocResult;

/// Shared owner of a `T` placed in allocator memory
///
/// The payload and a reference-count cell are both allocated from the same
/// allocator. Cloning bumps the count; the last handle to drop destroys
/// both. Counting is not atomic, so handles stay on one thread.
pub struct Shared<'a, T, A: Allocator + ?Sized> {
    ptr: NonNull<T>,
    count: NonNull<Cell<usize>>,
    alloc: &'a A,
    _owns: PhantomData<T>,
}

impl<'a, T, A: Allocator + ?Sized> Shared<'a, T, A> {
    /// Moves `value` into storage from `alloc`, with a count of one
    ///
    /// If the count cell cannot be allocated the payload is destroyed and
    /// the error returned.
    pub fn new(value: T, alloc: &'a A) -> AllocResult<Self> {
        let ptr = <&'a A as Allocator>::create(&alloc, value)?;
        let count = match <&'a A as Allocator>::create(&alloc, Cell::new(1usize)) {
            Ok(count) => count,
            Err(err) => {
                // SAFETY: ptr was just created and is not shared yet.
                unsafe { <&'a A as Allocator>::destroy(&alloc, ptr) };
                return Err(err);
            }
        };

        Ok(Self {
            ptr,
            count,
            alloc,
            _owns: PhantomData,
        })
    }

    fn counter(&self) -> &Cell<usize> {
        // SAFETY: the count cell lives as long as any handle does.
        unsafe { self.count.as_ref() }
    }

    /// Number of live handles
    pub fn strong_count(this: &Self) -> usize {
        this.counter().get()
    }

    /// Whether both handles share one payload
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.ptr == other.ptr
    }

    /// Mutable access when this is the only handle
    pub fn get_mut(this: &mut Self) -> Option<&mut T> {
        if Self::strong_count(this) == 1 {
            // SAFETY: no other handle can observe the payload.
            Some(unsafe { this.ptr.as_mut() })
        } else {
            None
        }
    }

    /// Allocator the payload lives in
    pub fn allocator(this: &Self) -> &'a A {
        this.alloc
    }
}

impl<T, A: Allocator + ?Sized> Clone for Shared<'_, T, A> {
    fn clone(&self) -> Self {
        let counter = self.counter();
        counter.set(counter.get() + 1);
        Self {
            ptr: self.ptr,
            count: self.count,
            alloc: self.alloc,
            _owns: PhantomData,
        }
    }
}

impl<T, A: Allocator + ?Sized> Deref for Shared<'_, T, A> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the payload lives as long as any handle does.
        unsafe { self.ptr.as_ref() }
    }
}

impl<'a, T, A: Allocator + ?Sized> Drop for Shared<'a, T, A> {
    fn drop(&mut self) {
        let remaining = self.counter().get() - 1;
        self.counter().set(remaining);
        if remaining > 0 {
            return;
        }

        // SAFETY: this was the last handle; both cells came from create()
        // on this allocator and are destroyed exactly once.
        unsafe {
            <&'a A as Allocator>::destroy(&self.alloc, self.ptr);
            <&'a A as Allocator>::destroy(&self.alloc, self.count);
        }
    }
}

impl<T: fmt::Debug, A: Allocator + ?Sized> fmt::Debug for Shared<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&**self).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{
        ArenaAllocator, GeneralPurposeAllocator, SystemAllocator, TrackingAllocator, TrackingConfig,
    };

    #[test]
    fn last_handle_releases_both_cells() {
        let gpa = GeneralPurposeAllocator::try_new(256, &SystemAllocator).unwrap();
        let first = Shared::new(42u64, &gpa).unwrap();
        let second = first.clone();

        assert_eq!(Shared::strong_count(&first), 2);
        assert!(Shared::ptr_eq(&first, &second));
        assert_eq!(gpa.reserved_blocks().len(), 2);

        drop(first);
        assert_eq!(*second, 42);
        assert_eq!(Shared::strong_count(&second), 1);

        drop(second);
        assert_eq!(gpa.reserved_bytes(), 0);
    }

    #[test]
    fn get_mut_requires_uniqueness() {
        let gpa = GeneralPurposeAllocator::try_new(256, &SystemAllocator).unwrap();
        let mut value = Shared::new(1i32, &gpa).unwrap();
        *Shared::get_mut(&mut value).unwrap() = 2;

        let other = value.clone();
        assert!(Shared::get_mut(&mut value).is_none());
        assert_eq!(*other, 2);
    }

    #[test]
    fn count_failure_releases_payload() {
        #[repr(align(8))]
        struct Buf([u8; 8]);

        let mut buf = Buf([0; 8]);
        let arena = ArenaAllocator::from_slice(&mut buf.0).unwrap();
        let tracked = TrackingAllocator::with_config(&arena, TrackingConfig::quiet());

        // the payload fills the arena, leaving no room for the count cell
        let err = Shared::new(7u64, &tracked).unwrap_err();
        assert!(err.is_out_of_memory());
        assert_eq!(tracked.allocation_count(), 1);
        assert_eq!(tracked.deallocation_count(), 1);
    }
}

use core::fmt;
use core::marker::PhantomData;
use core::mem::{ManuallyDrop, size_of};
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

use crate::allocator::{Allocator, MemoryBlock};
use crate::error::AllocResult;

/// Exclusive owner of a `T` placed in allocator memory
///
/// Moves, never copies. The value is dropped and its storage released when
/// the handle is dropped or [`reset`](Unique::reset).
pub struct Unique<'a, T, A: Allocator + ?Sized> {
    ptr: NonNull<T>,
    alloc: &'a A,
    _owns: PhantomData<T>,
}

impl<'a, T, A: Allocator + ?Sized> Unique<'a, T, A> {
    /// Moves `value` into storage from `alloc`
    pub fn new(value: T, alloc: &'a A) -> AllocResult<Self> {
        let ptr = <&'a A as Allocator>::create(&alloc, value)?;
        Ok(Self {
            ptr,
            alloc,
            _owns: PhantomData,
        })
    }

    /// Adopts a pointer produced by `create` on `alloc`
    ///
    /// # Safety
    /// `ptr` must hold a live `T` created through `alloc` and not be owned
    /// by anything else.
    pub unsafe fn from_raw(ptr: NonNull<T>, alloc: &'a A) -> Self {
        Self {
            ptr,
            alloc,
            _owns: PhantomData,
        }
    }

    /// Allocator the value lives in
    pub fn allocator(&self) -> &'a A {
        self.alloc
    }

    /// Pointer to the value
    pub fn as_ptr(&self) -> NonNull<T> {
        self.ptr
    }

    /// Drops the value and releases its storage now
    pub fn reset(self) {
        drop(self);
    }

    /// Moves the value out and releases the storage
    pub fn into_inner(self) -> T {
        let this = ManuallyDrop::new(self);
        // SAFETY: the value is live and read exactly once; `this` is never
        // dropped, so the value is not dropped a second time.
        let value = unsafe { this.ptr.as_ptr().read() };
        if size_of::<T>() != 0 {
            let block = MemoryBlock::new(this.ptr.cast(), size_of::<T>());
            // SAFETY: block is the storage create() obtained for the value.
            unsafe { this.alloc.deallocate(block) };
        }
        value
    }

    /// Gives up ownership without dropping; see [`from_raw`](Unique::from_raw)
    pub fn into_raw(self) -> NonNull<T> {
        ManuallyDrop::new(self).ptr
    }
}

impl<T, A: Allocator + ?Sized> Deref for Unique<'_, T, A> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the handle owns a live, initialized T.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T, A: Allocator + ?Sized> DerefMut for Unique<'_, T, A> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the handle owns the T exclusively.
        unsafe { self.ptr.as_mut() }
    }
}

impl<'a, T, A: Allocator + ?Sized> Drop for Unique<'a, T, A> {
    fn drop(&mut self) {
        // SAFETY: ptr came from create() on this allocator and is destroyed
        // only here.
        unsafe { <&'a A as Allocator>::destroy(&self.alloc, self.ptr) };
    }
}

impl<T: fmt::Debug, A: Allocator + ?Sized> fmt::Debug for Unique<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unique").field(&**self).finish()
    }
}

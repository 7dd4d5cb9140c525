//! Memory block handle passed across the allocation contract

use core::ptr::NonNull;

/// An address + length pair
///
/// Denotes either a live allocation handed to a caller or a sub-region of an
/// allocator's backing memory. The handle itself owns nothing: whoever
/// received it from `allocate` is responsible for passing it back exactly
/// once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryBlock {
    ptr: NonNull<u8>,
    len: usize,
}

impl MemoryBlock {
    /// Creates a block from a pointer and a length
    #[inline]
    pub const fn new(ptr: NonNull<u8>, len: usize) -> Self {
        Self { ptr, len }
    }

    /// A zero-length block whose address is aligned to `align`
    ///
    /// Used for zero-size requests that a strategy does not reject. The
    /// address must never be dereferenced or freed.
    #[inline]
    pub fn dangling(align: usize) -> Self {
        debug_assert!(align.is_power_of_two());
        let ptr = NonNull::new(core::ptr::without_provenance_mut::<u8>(align))
            .unwrap_or(NonNull::dangling());
        Self { ptr, len: 0 }
    }

    /// Raw pointer to the first byte
    #[inline]
    pub const fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Non-null pointer to the first byte
    #[inline]
    pub const fn as_non_null(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Length in bytes
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the block is zero-length
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of the first byte
    #[inline]
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr().addr()
    }

    /// Address one past the last byte
    #[inline]
    pub fn end(&self) -> usize {
        self.addr() + self.len
    }

    /// Same address, different length
    #[inline]
    pub(crate) const fn with_len(self, len: usize) -> Self {
        Self { ptr: self.ptr, len }
    }

    /// Views the block as a byte slice
    ///
    /// # Safety
    ///
    /// The block must be live, its bytes initialized, and no mutable access
    /// may happen for the chosen lifetime.
    #[inline]
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        // SAFETY: caller guarantees the block is live and initialized for 'a.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Views the block as a mutable byte slice
    ///
    /// # Safety
    ///
    /// The block must be live and no other access may happen for the chosen
    /// lifetime.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice<'a>(&self) -> &'a mut [u8] {
        // SAFETY: caller guarantees exclusive access to a live block for 'a.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Overwrites every byte with `byte`
    ///
    /// # Safety
    ///
    /// The block must be live and writable.
    #[inline]
    pub unsafe fn fill(&self, byte: u8) {
        // SAFETY: caller guarantees the block is writable for `len` bytes.
        unsafe { core::ptr::write_bytes(self.ptr.as_ptr(), byte, self.len) };
    }
}

//! System allocator implementation
//!
//! Delegates to the platform's aligned allocation primitives through `libc`
//! (`posix_memalign` / `free` on Unix, `_aligned_malloc` / `_aligned_free`
//! on Windows). Those release a block from its address alone, which is all a
//! [`MemoryBlock`] carries.

use core::ptr::{self, NonNull};

use super::{Allocator, MemoryBlock};
use crate::error::{AllocError, AllocResult};

/// Wrapper for the platform allocator
///
/// Stateless and `Copy`; pass it by reference as the upstream of a region
/// owning strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

impl SystemAllocator {
    /// Creates a new SystemAllocator
    #[inline]
    pub const fn new() -> Self {
        SystemAllocator
    }

    /// Returns information about the system allocator
    pub fn info() -> &'static str {
        #[cfg(target_os = "linux")]
        return "Linux system allocator (posix_memalign, typically glibc or musl)";

        #[cfg(target_os = "windows")]
        return "Windows CRT aligned allocator (_aligned_malloc)";

        #[cfg(target_os = "macos")]
        return "macOS system allocator (libsystem_malloc)";

        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        return "Platform-specific system allocator";
    }
}

#[cfg(unix)]
fn raw_alloc(size: usize, align: usize) -> *mut u8 {
    // posix_memalign wants a multiple of sizeof(void*)
    let align = align.max(size_of::<usize>());
    let mut out: *mut libc::c_void = ptr::null_mut();
    // SAFETY: `out` is a valid location for the result; align is a power of
    // two and a multiple of the pointer size.
    let rc = unsafe { libc::posix_memalign(&mut out, align, size) };
    if rc == 0 { out.cast() } else { ptr::null_mut() }
}

#[cfg(unix)]
unsafe fn raw_free(ptr: *mut u8) {
    // SAFETY: caller passes a pointer obtained from raw_alloc.
    unsafe { libc::free(ptr.cast()) }
}

#[cfg(windows)]
fn raw_alloc(size: usize, align: usize) -> *mut u8 {
    // SAFETY: _aligned_malloc accepts any size and power-of-two alignment.
    unsafe { libc::aligned_malloc(size, align).cast() }
}

#[cfg(windows)]
unsafe fn raw_free(ptr: *mut u8) {
    // SAFETY: caller passes a pointer obtained from raw_alloc.
    unsafe { libc::aligned_free(ptr.cast()) }
}

// SAFETY: blocks come straight from the platform allocator with the
// requested size and alignment and are not shared.
unsafe impl Allocator for SystemAllocator {
    fn allocate(&self, size: usize, align: usize) -> AllocResult<MemoryBlock> {
        debug_assert!(align.is_power_of_two());
        if size == 0 {
            return Ok(MemoryBlock::dangling(align));
        }

        match NonNull::new(raw_alloc(size, align)) {
            Some(ptr) => Ok(MemoryBlock::new(ptr, size)),
            None => Err(AllocError::out_of_memory(size)),
        }
    }

    unsafe fn deallocate(&self, block: MemoryBlock) {
        if block.is_empty() {
            return;
        }
        // SAFETY: non-empty blocks handed out by allocate() came from raw_alloc.
        unsafe { raw_free(block.as_ptr()) };
    }

    unsafe fn reallocate(
        &self,
        block: MemoryBlock,
        size: usize,
        align: usize,
    ) -> AllocResult<MemoryBlock> {
        let new_block = self
            .allocate(size, align)
            .map_err(|_| AllocError::realloc_failed(size, align))?;

        let copy_len = block.len().min(size);
        if copy_len > 0 {
            // SAFETY: both blocks are live, distinct, and at least copy_len long.
            unsafe { ptr::copy_nonoverlapping(block.as_ptr(), new_block.as_ptr(), copy_len) };
        }

        // SAFETY: the caller handed us a live block from this allocator.
        unsafe { self.deallocate(block) };
        Ok(new_block)
    }
}

//! Alignment helpers shared by the allocation strategies
//!
//! All helpers assume `alignment` is a power of two; that is part of the
//! allocation contract and only checked in debug builds.

/// Aligns a value up to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use crossfire_memory::utils::align_up;
///
/// assert_eq!(align_up(7, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// ```
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Overflow-checked [`align_up`]
///
/// # Examples
/// ```
/// use crossfire_memory::utils::checked_align_up;
///
/// assert_eq!(checked_align_up(9, 8), Some(16));
/// assert_eq!(checked_align_up(usize::MAX, 8), None);
/// ```
#[inline(always)]
pub const fn checked_align_up(value: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    match value.checked_add(alignment - 1) {
        Some(bumped) => Some(bumped & !(alignment - 1)),
        None => None,
    }
}

/// Checks if a value is aligned to the given alignment
///
/// # Examples
/// ```
/// use crossfire_memory::utils::is_aligned;
///
/// assert!(is_aligned(16, 8));
/// assert!(!is_aligned(17, 8));
/// ```
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    value & (alignment - 1) == 0
}

/// Offset to add to `offset` so that `base + offset` lands on `alignment`
///
/// Strategies hand out sub-spans of a region whose base may be less aligned
/// than the request, so alignment is applied to the absolute address and
/// converted back to a region offset. `None` on overflow.
#[inline]
pub(crate) fn aligned_offset(base: usize, offset: usize, alignment: usize) -> Option<usize> {
    let addr = base.checked_add(offset)?;
    let aligned = checked_align_up(addr, alignment)?;
    Some(aligned - base)
}

//! Address arithmetic for bump allocation.
//!
//! The arena tracks its cursor as a plain address so the alignment rule can
//! be applied to absolute addresses. Pointers are rebuilt from the block's
//! base with [`NonNull::map_addr`], keeping the base's provenance.

use std::num::NonZeroUsize;
use std::ptr::NonNull;

/// Address of `ptr`.
#[inline]
pub(crate) fn addr(ptr: NonNull<u8>) -> usize {
    ptr.addr().get()
}

/// Round `addr` up to the next multiple of `align` (a power of two).
///
/// Adds `-addr & (align - 1)`, which is zero when `addr` is already aligned.
/// Returns `None` if the result does not fit in `usize`.
#[inline]
pub(crate) fn align_up(addr: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    addr.checked_add(addr.wrapping_neg() & (align - 1))
}

/// A pointer to `addr` derived from `base`.
///
/// `addr` must not be below `base`.
#[inline]
pub(crate) fn pointer_at(base: NonNull<u8>, addr: usize) -> NonNull<u8> {
    debug_assert!(addr >= self::addr(base));
    base.map_addr(|a| a.saturating_add(addr - a.get()))
}

/// A non-null pointer aligned to `align`, valid only for zero-sized access.
#[inline]
pub(crate) fn dangling(align: usize) -> NonNull<u8> {
    match NonZeroUsize::new(align) {
        Some(a) => NonNull::dangling().with_addr(a),
        None => NonNull::dangling(),
    }
}

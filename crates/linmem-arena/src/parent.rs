//! Built-in parents backed by the Rust global allocator.
//!
//! - [`Global`]: plain global allocation. Cannot grow in place, because
//!   the global `realloc` is free to move a block.
//! - [`Reservation`]: obtains a fixed-size reservation up front and "grows"
//!   by raising a committed watermark inside it, so the base never moves.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use linmem_core::{AllocError, MemoryResource};

use crate::raw;

/// The Rust global allocator as an arena parent.
///
/// This is the default parent of [`LinearArena`](crate::LinearArena).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

impl MemoryResource for Global {
    fn allocate(&mut self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        if bytes == 0 {
            return Ok(raw::dangling(align));
        }
        let layout = Layout::from_size_align(bytes, align).map_err(|_| AllocError::Overflow)?;
        // SAFETY: `layout` has a non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::OutOfMemory {
            requested: bytes,
            available: 0,
        })
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, bytes: usize, align: usize) {
        if bytes == 0 {
            return;
        }
        // SAFETY: the caller passes the size and alignment the block was
        // allocated with, which `allocate` already validated as a layout.
        unsafe {
            let layout = Layout::from_size_align_unchecked(bytes, align);
            alloc::dealloc(ptr.as_ptr(), layout);
        }
    }
}

/// A growable parent that never moves its block.
///
/// The full `limit` is taken from the global allocator on the first
/// `allocate`; `reallocate` only moves the committed watermark, so it always
/// returns the original base. `max_size` reports `limit`, which is what lets
/// an arena clamp its doubling to the reservation.
///
/// Holds at most one block at a time.
#[derive(Debug)]
pub struct Reservation {
    limit: usize,
    block: Option<(NonNull<u8>, Layout)>,
    committed: usize,
}

impl Reservation {
    /// A reservation of `limit` bytes, taken lazily.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            block: None,
            committed: 0,
        }
    }

    /// The reservation size.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes currently committed to the owner of the block.
    pub fn committed(&self) -> usize {
        self.committed
    }

    fn refuse(&self, requested: usize) -> AllocError {
        if requested > self.limit {
            AllocError::ExceedsMaxSize {
                requested,
                max: self.limit,
            }
        } else {
            AllocError::OutOfMemory {
                requested,
                available: 0,
            }
        }
    }
}

impl MemoryResource for Reservation {
    const CAN_REALLOCATE: bool = true;

    fn allocate(&mut self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        if self.block.is_some() || bytes == 0 || bytes > self.limit {
            return Err(self.refuse(bytes));
        }
        let layout =
            Layout::from_size_align(self.limit, align).map_err(|_| AllocError::Overflow)?;
        // SAFETY: `layout` has a non-zero size since `0 < bytes <= limit`.
        let ptr = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(AllocError::OutOfMemory {
            requested: self.limit,
            available: 0,
        })?;
        self.block = Some((ptr, layout));
        self.committed = bytes;
        Ok(ptr)
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, _bytes: usize, _align: usize) {
        match self.block {
            Some((base, layout)) if base == ptr => {
                self.block = None;
                self.committed = 0;
                // SAFETY: `base` was allocated with `layout` and is released once.
                unsafe { alloc::dealloc(base.as_ptr(), layout) };
            }
            _ => debug_assert!(false, "pointer was not allocated by this reservation"),
        }
    }

    unsafe fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        bytes: usize,
        _align: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        match self.block {
            Some((base, _)) if base == ptr && bytes > 0 && bytes <= self.limit => {
                self.committed = bytes;
                Ok(base)
            }
            _ => Err(self.refuse(bytes)),
        }
    }

    fn max_size(&self) -> Option<usize> {
        Some(self.limit)
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if let Some((base, layout)) = self.block.take() {
            // SAFETY: `base` was allocated with `layout` and never released.
            unsafe { alloc::dealloc(base.as_ptr(), layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_round_trips_a_block() {
        let mut global = Global;
        let ptr = global.allocate(64, 16).unwrap();
        assert_eq!(raw::addr(ptr) % 16, 0);
        // SAFETY: freshly allocated 64-byte block.
        unsafe {
            ptr.as_ptr().write_bytes(0xAB, 64);
            assert_eq!(*ptr.as_ptr().add(63), 0xAB);
            global.deallocate(ptr, 64, 16);
        }
    }

    #[test]
    fn global_zero_bytes_is_dangling_and_aligned() {
        let mut global = Global;
        let ptr = global.allocate(0, 32).unwrap();
        assert_eq!(raw::addr(ptr) % 32, 0);
        // SAFETY: zero-sized blocks are never released to the allocator.
        unsafe { global.deallocate(ptr, 0, 32) };
    }

    #[test]
    fn global_rejects_invalid_layout() {
        let mut global = Global;
        assert_eq!(global.allocate(usize::MAX, 16), Err(AllocError::Overflow));
    }

    #[test]
    fn global_cannot_reallocate() {
        fn can_reallocate<R: MemoryResource>(_: &R) -> bool {
            R::CAN_REALLOCATE
        }
        assert!(!can_reallocate(&Global));
    }

    #[test]
    fn reservation_grows_in_place_up_to_limit() {
        let mut reservation = Reservation::new(256);
        let ptr = reservation.allocate(16, 16).unwrap();
        assert_eq!(reservation.committed(), 16);
        // SAFETY: `ptr` is the reservation's live block.
        let grown = unsafe { reservation.reallocate(ptr, 256, 16) }.unwrap();
        assert_eq!(grown, ptr);
        assert_eq!(reservation.committed(), 256);
        // SAFETY: as above.
        let refused = unsafe { reservation.reallocate(ptr, 257, 16) };
        assert_eq!(
            refused,
            Err(AllocError::ExceedsMaxSize {
                requested: 257,
                max: 256
            })
        );
        // SAFETY: releasing the live block once.
        unsafe { reservation.deallocate(ptr, 256, 16) };
        assert_eq!(reservation.committed(), 0);
    }

    #[test]
    fn reservation_holds_one_block() {
        let mut reservation = Reservation::new(64);
        reservation.allocate(8, 8).unwrap();
        assert!(reservation.allocate(8, 8).is_err());
    }

    #[test]
    fn reservation_reports_limit_as_max_size() {
        let reservation = Reservation::new(4096);
        assert_eq!(reservation.max_size(), Some(4096));
        assert_eq!(reservation.limit(), 4096);
    }
}

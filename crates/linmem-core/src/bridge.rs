//! Presents an [`Allocator`] as a [`MemoryResource`].
//!
//! Arenas are parameterized by a resource. An allocator-shaped parent is
//! wrapped in [`FromAllocator`], which converts byte counts to element
//! counts (rounding up) and inherits the allocator's growth capability and
//! maximum size.

use std::mem;
use std::ptr::NonNull;

use crate::error::AllocError;
use crate::traits::{Allocator, MemoryResource};

/// An allocator-shaped parent seen through the resource interface.
///
/// The requested alignment is advisory: the allocator aligns to its element
/// type. Arenas align every allocation against absolute addresses, so a less
/// aligned base only costs padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FromAllocator<A> {
    allocator: A,
}

impl<A: Allocator> FromAllocator<A> {
    /// Wrap an allocator.
    pub fn new(allocator: A) -> Self {
        const {
            assert!(
                mem::size_of::<A::Value>() != 0,
                "parent allocators must have a sized element type"
            )
        };
        Self { allocator }
    }

    /// The wrapped allocator.
    pub fn get_ref(&self) -> &A {
        &self.allocator
    }

    /// Unwrap the allocator.
    pub fn into_inner(self) -> A {
        self.allocator
    }
}

/// Number of `V` elements needed to cover `bytes` bytes.
fn elements_for<V>(bytes: usize) -> usize {
    bytes.div_ceil(mem::size_of::<V>())
}

impl<A: Allocator> MemoryResource for FromAllocator<A> {
    const CAN_REALLOCATE: bool = A::CAN_REALLOCATE;

    fn allocate(&mut self, bytes: usize, _align: usize) -> Result<NonNull<u8>, AllocError> {
        let n = elements_for::<A::Value>(bytes);
        self.allocator.allocate(n).map(NonNull::cast)
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, bytes: usize, _align: usize) {
        let n = elements_for::<A::Value>(bytes);
        // SAFETY: forwarded from the caller; `n` is the element count the
        // block was allocated or last resized with.
        unsafe { self.allocator.deallocate(ptr.cast(), n) }
    }

    unsafe fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        bytes: usize,
        _align: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let n = elements_for::<A::Value>(bytes);
        // SAFETY: forwarded from the caller.
        unsafe { self.allocator.reallocate(ptr.cast(), n) }.map(NonNull::cast)
    }

    fn max_size(&self) -> Option<usize> {
        self.allocator
            .max_size()
            .map(|n| n.saturating_mul(mem::size_of::<A::Value>()))
    }
}

//! Parent allocator contracts and their compile-time capabilities.
//!
//! A parent comes in one of two shapes:
//!
//! - [`MemoryResource`]: untyped, `allocate(bytes, align)`.
//! - [`Allocator`]: typed, `allocate(n)` of `Self::Value`, cheap to clone
//!   and rebindable to other element types.
//!
//! Either shape may additionally grow a block in place (`reallocate`) and
//! report a maximum allocation size (`max_size`). Growth is advertised by the
//! associated constant `CAN_REALLOCATE`; code generic over a parent branches
//! on it at compile time and operations that need growth assert it in a
//! `const` block, so a non-growable parent cannot even instantiate them.

use std::ptr::NonNull;

use crate::error::AllocError;

/// Untyped, size-and-alignment allocation interface.
///
/// This is the shape arenas are parameterized by. Arenas implement it too,
/// which is what lets construction helpers and adaptors accept "any
/// arena-shaped resource".
pub trait MemoryResource {
    /// Whether [`reallocate`](Self::reallocate) can resize a block in place.
    ///
    /// Implementations that set this to `true` must return the original
    /// pointer from a successful `reallocate`. Returning a different pointer
    /// is reported to arenas as a relocation, which they treat as fatal.
    const CAN_REALLOCATE: bool = false;

    /// Allocate a block of `bytes` bytes aligned to `align`.
    fn allocate(&mut self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block returned by this resource, `bytes` its
    /// current size and `align` the alignment it was allocated with.
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, bytes: usize, align: usize);

    /// Resize a block to `bytes` bytes.
    ///
    /// The default refuses every request; only resources with
    /// [`CAN_REALLOCATE`](Self::CAN_REALLOCATE) override it.
    ///
    /// # Safety
    ///
    /// Same requirements as [`deallocate`](Self::deallocate). On success the
    /// old pointer must only be used again if it equals the returned one.
    unsafe fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        bytes: usize,
        align: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let _ = (ptr, align);
        Err(AllocError::OutOfMemory {
            requested: bytes,
            available: 0,
        })
    }

    /// The largest block this resource can provide, if it has a limit.
    fn max_size(&self) -> Option<usize> {
        None
    }
}

/// Typed allocation interface over elements of [`Value`](Self::Value).
///
/// Allocators are handles: cloning one must be cheap and every clone must
/// allocate from the same underlying state.
pub trait Allocator: Clone {
    /// Element type this allocator hands out.
    type Value;

    /// The same allocator, handing out elements of `U` instead.
    type Rebind<U>: Allocator<Value = U>;

    /// Whether [`reallocate`](Self::reallocate) can resize in place.
    ///
    /// Same contract as [`MemoryResource::CAN_REALLOCATE`].
    const CAN_REALLOCATE: bool = false;

    /// Allocate space for `n` contiguous elements.
    fn allocate(&self, n: usize) -> Result<NonNull<Self::Value>, AllocError>;

    /// Release space for `n` elements.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this allocator (or a clone or rebind
    /// of it) for exactly `n` elements, and must still be live.
    unsafe fn deallocate(&self, ptr: NonNull<Self::Value>, n: usize);

    /// Resize the allocation at `ptr` to `n` elements.
    ///
    /// # Safety
    ///
    /// Same requirements as [`deallocate`](Self::deallocate).
    unsafe fn reallocate(
        &self,
        ptr: NonNull<Self::Value>,
        n: usize,
    ) -> Result<NonNull<Self::Value>, AllocError> {
        let _ = ptr;
        Err(AllocError::OutOfMemory {
            requested: n,
            available: 0,
        })
    }

    /// The largest number of elements this allocator can provide, if limited.
    fn max_size(&self) -> Option<usize> {
        None
    }

    /// Rebind to another element type, sharing the same underlying state.
    fn rebind<U>(&self) -> Self::Rebind<U>;
}

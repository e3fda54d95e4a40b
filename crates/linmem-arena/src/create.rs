//! Construct values in arena memory.
//!
//! Two families with the same helpers:
//!
//! - [`from_resource`] takes any [`MemoryResource`] by `&mut`, including a
//!   [`LinearArena`](crate::LinearArena) directly. Its helpers are also
//!   re-exported at this level.
//! - [`from_allocator`] takes any [`Allocator`] and rebinds it to the
//!   element type being constructed.
//!
//! Values are never dropped, so every helper refuses, at build time, types
//! that need dropping. Results are raw [`NonNull`] handles: the arena, not a
//! borrow, decides how long they stay valid, and
//! [`reset`](crate::LinearArena::reset) invalidates all of them.
//!
//! ```
//! use linmem_arena::{create, Global, LinearArena};
//!
//! let mut arena = LinearArena::with_capacity(64, Global).unwrap();
//! let answer = create::object(&mut arena, 42u32).unwrap();
//! let squares = create::array(&mut arena, [1u64, 2, 3, 4].iter().map(|i| i * i)).unwrap();
//!
//! // SAFETY: the arena is alive and has not been reset.
//! unsafe {
//!     assert_eq!(*answer.as_ref(), 42);
//!     assert_eq!(squares.as_ref(), &[1, 4, 9, 16]);
//! }
//! ```
//!
//! [`MemoryResource`]: linmem_core::MemoryResource
//! [`Allocator`]: linmem_core::Allocator

use std::mem;
use std::ptr::NonNull;

pub use from_resource::*;

/// Build-time rejection of element types with drop glue.
fn forbid_drop_glue<T>() {
    const {
        assert!(
            !mem::needs_drop::<T>(),
            "arena values are never dropped; use a type without drop glue"
        )
    };
}

/// Move exactly `len` items from `items` into the uninitialized run at `ptr`.
///
/// # Panics
///
/// Panics if `items` runs out early. The written prefix is abandoned in the
/// arena, which is sound because it needs no dropping.
///
/// # Safety
///
/// `ptr` must be valid for writes of `len` consecutive `T`s.
unsafe fn write_exact<T>(
    ptr: NonNull<T>,
    len: usize,
    items: impl Iterator<Item = T>,
) -> NonNull<[T]> {
    let mut written = 0;
    for item in items.take(len) {
        // SAFETY: `written < len`, inside the run the caller vouched for.
        unsafe { ptr.add(written).write(item) };
        written += 1;
    }
    assert_eq!(
        written, len,
        "iterator yielded {written} items after reporting {len}"
    );
    NonNull::slice_from_raw_parts(ptr, len)
}

/// Construction from a [`MemoryResource`](linmem_core::MemoryResource).
pub mod from_resource {
    use std::mem;
    use std::ptr::NonNull;

    use linmem_core::{AllocError, MemoryResource};

    use super::{forbid_drop_glue, write_exact};

    fn slots<T, R: MemoryResource>(resource: &mut R, len: usize) -> Result<NonNull<T>, AllocError> {
        let bytes = len
            .checked_mul(mem::size_of::<T>())
            .ok_or(AllocError::Overflow)?;
        resource
            .allocate(bytes, mem::align_of::<T>())
            .map(NonNull::cast)
    }

    /// Move `value` into the resource.
    pub fn object<T, R: MemoryResource>(
        resource: &mut R,
        value: T,
    ) -> Result<NonNull<T>, AllocError> {
        object_with(resource, || value)
    }

    /// A default-constructed `T` in the resource.
    pub fn object_default<T: Default, R: MemoryResource>(
        resource: &mut R,
    ) -> Result<NonNull<T>, AllocError> {
        object_with(resource, T::default)
    }

    /// The value returned by `make`, built only once space is secured.
    pub fn object_with<T, R: MemoryResource>(
        resource: &mut R,
        make: impl FnOnce() -> T,
    ) -> Result<NonNull<T>, AllocError> {
        forbid_drop_glue::<T>();
        let ptr = slots::<T, R>(resource, 1)?;
        // SAFETY: `ptr` is a fresh, aligned slot for one `T`.
        unsafe { ptr.write(make()) };
        Ok(ptr)
    }

    /// `len` default-constructed `T`s.
    pub fn array_default<T: Default, R: MemoryResource>(
        resource: &mut R,
        len: usize,
    ) -> Result<NonNull<[T]>, AllocError> {
        array_as(resource, (0..len).map(|_| T::default()))
    }

    /// The items of `items`, in order, with the element type taken from the
    /// iterator.
    ///
    /// # Panics
    ///
    /// Panics if the iterator yields fewer items than its `len` reported.
    pub fn array<I, R>(resource: &mut R, items: I) -> Result<NonNull<[I::Item]>, AllocError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        R: MemoryResource,
    {
        array_as(resource, items)
    }

    /// The items of `items`, in order, each converted into `T`.
    ///
    /// # Panics
    ///
    /// Panics if the iterator yields fewer items than its `len` reported.
    pub fn array_as<T, I, R>(resource: &mut R, items: I) -> Result<NonNull<[T]>, AllocError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        I::Item: Into<T>,
        R: MemoryResource,
    {
        forbid_drop_glue::<T>();
        let items = items.into_iter();
        let len = items.len();
        let ptr = slots::<T, R>(resource, len)?;
        // SAFETY: `ptr` is a fresh, aligned run of `len` slots.
        Ok(unsafe { write_exact(ptr, len, items.map(Into::into)) })
    }
}

/// Construction from an [`Allocator`](linmem_core::Allocator).
///
/// Each helper rebinds the allocator to the element type, so any allocator
/// handle works regardless of its own `Value`.
pub mod from_allocator {
    use std::ptr::NonNull;

    use linmem_core::{AllocError, Allocator};

    use super::{forbid_drop_glue, write_exact};

    /// Move `value` into the allocator's memory.
    pub fn object<T, A: Allocator>(allocator: &A, value: T) -> Result<NonNull<T>, AllocError> {
        object_with(allocator, || value)
    }

    /// A default-constructed `T`.
    pub fn object_default<T: Default, A: Allocator>(
        allocator: &A,
    ) -> Result<NonNull<T>, AllocError> {
        object_with(allocator, T::default)
    }

    /// The value returned by `make`, built only once space is secured.
    pub fn object_with<T, A: Allocator>(
        allocator: &A,
        make: impl FnOnce() -> T,
    ) -> Result<NonNull<T>, AllocError> {
        forbid_drop_glue::<T>();
        let ptr = allocator.rebind::<T>().allocate(1)?;
        // SAFETY: `ptr` is a fresh, aligned slot for one `T`.
        unsafe { ptr.write(make()) };
        Ok(ptr)
    }

    /// `len` default-constructed `T`s.
    pub fn array_default<T: Default, A: Allocator>(
        allocator: &A,
        len: usize,
    ) -> Result<NonNull<[T]>, AllocError> {
        array_as(allocator, (0..len).map(|_| T::default()))
    }

    /// The items of `items`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the iterator yields fewer items than its `len` reported.
    pub fn array<I, A>(allocator: &A, items: I) -> Result<NonNull<[I::Item]>, AllocError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        A: Allocator,
    {
        array_as(allocator, items)
    }

    /// The items of `items`, in order, each converted into `T`.
    ///
    /// # Panics
    ///
    /// Panics if the iterator yields fewer items than its `len` reported.
    pub fn array_as<T, I, A>(allocator: &A, items: I) -> Result<NonNull<[T]>, AllocError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        I::Item: Into<T>,
        A: Allocator,
    {
        forbid_drop_glue::<T>();
        let items = items.into_iter();
        let len = items.len();
        let ptr = allocator.rebind::<T>().allocate(len)?;
        // SAFETY: `ptr` is a fresh, aligned run of `len` slots.
        Ok(unsafe { write_exact(ptr, len, items.map(Into::into)) })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::allocator::LinearAllocator;
    use crate::linear::LinearArena;
    use crate::parent::Global;
    use crate::pmr::{PmrLinearArena, PolymorphicAllocator};
    use linmem_core::AllocError;

    /// Claims `len` items but yields only those in `range`.
    struct ShortIter {
        range: std::ops::Range<u32>,
        len: usize,
    }

    impl Iterator for ShortIter {
        type Item = u32;

        fn next(&mut self) -> Option<u32> {
            self.range.next()
        }

        fn size_hint(&self) -> (usize, Option<usize>) {
            (self.len, Some(self.len))
        }
    }

    impl ExactSizeIterator for ShortIter {}

    fn arena(capacity: usize) -> LinearArena {
        LinearArena::with_capacity(capacity, Global).unwrap()
    }

    #[test]
    fn default_object_is_zero() {
        let mut arena = arena(64);
        let p = object_default::<i32, _>(&mut arena).unwrap();
        // SAFETY: `p` was just initialized and the arena is alive.
        assert_eq!(unsafe { p.read() }, 0);
    }

    #[test]
    fn object_holds_its_value() {
        let mut arena = arena(64);
        let p = object(&mut arena, 42i32).unwrap();
        // SAFETY: as above.
        assert_eq!(unsafe { p.read() }, 42);
    }

    #[test]
    fn consecutive_objects_are_contiguous() {
        let mut arena = arena(64);
        let a = object(&mut arena, 1i32).unwrap();
        let b = object(&mut arena, 2i32).unwrap();
        // SAFETY: `a` is followed by `b` within one block.
        assert_eq!(unsafe { a.add(1) }, b);
    }

    #[test]
    fn object_with_builds_in_place() {
        let mut arena = arena(64);
        let p = object_with(&mut arena, || (7u8, 9u64)).unwrap();
        // SAFETY: initialized above.
        assert_eq!(unsafe { p.read() }, (7, 9));
    }

    #[test]
    fn object_with_does_not_run_on_exhaustion() {
        let mut arena = arena(4);
        let mut ran = false;
        let result = object_with(&mut arena, || {
            ran = true;
            0u64
        });
        assert!(matches!(result, Err(AllocError::OutOfMemory { .. })));
        assert!(!ran);
    }

    #[test]
    fn default_array_is_zeroed() {
        let mut arena = arena(64);
        let p = array_default::<u16, _>(&mut arena, 5).unwrap();
        // SAFETY: all five elements were initialized.
        assert_eq!(unsafe { p.as_ref() }, &[0; 5]);
        assert_eq!(arena.size(), 10);
    }

    #[test]
    fn array_keeps_iteration_order() {
        let mut arena = arena(64);
        let p = array(&mut arena, vec![3i64, 1, 4, 1, 5]).unwrap();
        // SAFETY: all elements were initialized.
        assert_eq!(unsafe { p.as_ref() }, &[3, 1, 4, 1, 5]);
    }

    #[test]
    fn array_as_converts_items() {
        let mut arena = arena(64);
        let p = array_as::<u32, _, _>(&mut arena, [1u8, 2, 255]).unwrap();
        // SAFETY: all elements were initialized.
        assert_eq!(unsafe { p.as_ref() }, &[1u32, 2, 255]);
    }

    #[test]
    fn empty_array_is_empty() {
        let mut arena = arena(8);
        let p = array(&mut arena, Vec::<u64>::new()).unwrap();
        assert_eq!(p.len(), 0);
        assert_eq!(arena.size(), 0);
    }

    #[test]
    #[should_panic(expected = "iterator yielded 2 items after reporting 4")]
    fn short_iterator_panics() {
        let mut arena = arena(64);
        let _ = array(&mut arena, ShortIter { range: 0..2, len: 4 });
    }

    #[test]
    fn oversized_array_is_an_overflow() {
        let mut arena = arena(8);
        let result = array_default::<u64, _>(&mut arena, usize::MAX);
        assert_eq!(result, Err(AllocError::Overflow));
    }

    #[test]
    fn allocator_family_rebinds() {
        let arena = RefCell::new(arena(64));
        let bytes = LinearAllocator::<u8>::new(&arena);
        let n = from_allocator::object(&bytes, 0x0102_0304u32).unwrap();
        let d = from_allocator::object_default::<f64, _>(&bytes).unwrap();
        let w = from_allocator::object_with(&bytes, || 5u16).unwrap();
        // SAFETY: all three were initialized and the arena is alive.
        unsafe {
            assert_eq!(n.read(), 0x0102_0304);
            assert_eq!(d.read(), 0.0);
            assert_eq!(w.read(), 5);
        }
        assert_eq!(arena.borrow().size(), 18);
    }

    #[test]
    fn allocator_family_builds_arrays() {
        let arena = RefCell::new(arena(128));
        let alloc = LinearAllocator::<u8>::new(&arena);
        let zeros = from_allocator::array_default::<u32, _>(&alloc, 3).unwrap();
        let chars = from_allocator::array(&alloc, "abc".chars().collect::<Vec<_>>()).unwrap();
        let wide = from_allocator::array_as::<i64, _, _>(&alloc, [-1i8, 2]).unwrap();
        // SAFETY: every element was initialized.
        unsafe {
            assert_eq!(zeros.as_ref(), &[0, 0, 0]);
            assert_eq!(chars.as_ref(), &['a', 'b', 'c']);
            assert_eq!(wide.as_ref(), &[-1, 2]);
        }
    }

    #[test]
    fn polymorphic_allocator_constructs_through_dispatch() {
        let pmr = PmrLinearArena::with_capacity(64, Global).unwrap();
        let alloc = PolymorphicAllocator::<()>::new(&pmr);
        let p = from_allocator::object(&alloc, 99u64).unwrap();
        // SAFETY: initialized above.
        assert_eq!(unsafe { p.read() }, 99);
        assert_eq!(pmr.size(), 8);
    }
}

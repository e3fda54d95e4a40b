//! Typed allocator handle over a shared arena.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use linmem_core::{AllocError, Allocator, MemoryResource};

use crate::linear::LinearArena;

/// A copyable, rebindable handle that allocates `T`s from an arena.
///
/// The arena is borrowed through a [`RefCell`], so any number of handles,
/// for any element types, can share it. Each call borrows the arena
/// mutably for its duration only.
///
/// Handles compare equal when they refer to the same arena, whatever their
/// element types.
pub struct LinearAllocator<'a, T, R = LinearArena> {
    resource: &'a RefCell<R>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, R: MemoryResource> LinearAllocator<'a, T, R> {
    /// A handle allocating from `resource`.
    pub fn new(resource: &'a RefCell<R>) -> Self {
        Self {
            resource,
            _marker: PhantomData,
        }
    }

    /// Space for `n` contiguous `T`s, aligned for `T`.
    ///
    /// Nothing is initialized.
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        let bytes = n
            .checked_mul(mem::size_of::<T>())
            .ok_or(AllocError::Overflow)?;
        self.resource
            .borrow_mut()
            .allocate(bytes, mem::align_of::<T>())
            .map(NonNull::cast)
    }

    /// Hand `n` elements back to the resource.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`allocate`](Self::allocate) on a handle to the
    /// same resource, for exactly `n` elements.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        let bytes = n * mem::size_of::<T>();
        // SAFETY: forwarded from the caller.
        unsafe {
            self.resource
                .borrow_mut()
                .deallocate(ptr.cast(), bytes, mem::align_of::<T>())
        }
    }

    /// The same handle, allocating `U`s.
    pub fn rebind<U>(&self) -> LinearAllocator<'a, U, R> {
        LinearAllocator::new(self.resource)
    }

    /// The shared resource.
    pub fn resource(&self) -> &'a RefCell<R> {
        self.resource
    }
}

impl<'a, T, R: MemoryResource> From<&'a RefCell<R>> for LinearAllocator<'a, T, R> {
    fn from(resource: &'a RefCell<R>) -> Self {
        Self::new(resource)
    }
}

impl<T, R> Clone for LinearAllocator<'_, T, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, R> Copy for LinearAllocator<'_, T, R> {}

impl<T, R> fmt::Debug for LinearAllocator<'_, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearAllocator")
            .field("element", &std::any::type_name::<T>())
            .field("resource", &ptr::from_ref(self.resource))
            .finish()
    }
}

impl<T, U, R> PartialEq<LinearAllocator<'_, U, R>> for LinearAllocator<'_, T, R> {
    fn eq(&self, other: &LinearAllocator<'_, U, R>) -> bool {
        ptr::eq(self.resource, other.resource)
    }
}

impl<T, R> Eq for LinearAllocator<'_, T, R> {}

impl<'a, T, R: MemoryResource> Allocator for LinearAllocator<'a, T, R> {
    type Value = T;
    type Rebind<U> = LinearAllocator<'a, U, R>;
    const CAN_REALLOCATE: bool = R::CAN_REALLOCATE;

    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        LinearAllocator::allocate(self, n)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        // SAFETY: forwarded from the caller.
        unsafe { LinearAllocator::deallocate(self, ptr, n) }
    }

    unsafe fn reallocate(&self, ptr: NonNull<T>, n: usize) -> Result<NonNull<T>, AllocError> {
        let bytes = n
            .checked_mul(mem::size_of::<T>())
            .ok_or(AllocError::Overflow)?;
        // SAFETY: forwarded from the caller.
        unsafe {
            self.resource
                .borrow_mut()
                .reallocate(ptr.cast(), bytes, mem::align_of::<T>())
        }
        .map(NonNull::cast)
    }

    fn max_size(&self) -> Option<usize> {
        let max = self.resource.borrow().max_size()?;
        match mem::size_of::<T>() {
            0 => Some(max),
            size => Some(max / size),
        }
    }

    fn rebind<U>(&self) -> LinearAllocator<'a, U, R> {
        LinearAllocator::rebind(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parent::Global;
    use linmem_test_utils::{GrowableParent, BASE_ADDR};

    #[test]
    fn allocates_aligned_elements() {
        let arena = RefCell::new(LinearArena::with_capacity(64, Global).unwrap());
        let bytes = LinearAllocator::<u8>::new(&arena);
        let words = bytes.rebind::<u64>();

        let b = bytes.allocate(3).unwrap();
        let w = words.allocate(2).unwrap();
        assert_eq!(w.as_ptr() as usize % mem::align_of::<u64>(), 0);
        assert!(w.as_ptr() as usize >= b.as_ptr() as usize + 3);
        assert_eq!(arena.borrow().size(), 8 + 16);
    }

    #[test]
    fn writes_through_allocated_elements() {
        let arena = RefCell::new(LinearArena::with_capacity(64, Global).unwrap());
        let alloc = LinearAllocator::<u32>::new(&arena);
        let p = alloc.allocate(4).unwrap();
        // SAFETY: `p` points at four uninitialized `u32`s inside the arena.
        unsafe {
            for i in 0..4 {
                p.add(i).write(i as u32 * 10);
            }
            assert_eq!(p.add(3).read(), 30);
        }
    }

    #[test]
    fn handles_compare_by_arena() {
        let a = RefCell::new(LinearArena::with_capacity(16, Global).unwrap());
        let b = RefCell::new(LinearArena::with_capacity(16, Global).unwrap());
        let a1 = LinearAllocator::<u32>::new(&a);
        let a2 = LinearAllocator::<f64>::from(&a);
        let b1 = LinearAllocator::<u32>::new(&b);
        assert!(a1 == a2);
        assert!(a1 == a1.clone());
        assert!(a1 != b1);
        assert!(a1.rebind::<u8>() == a1);
    }

    #[test]
    fn deallocate_leaves_arena_untouched() {
        let arena = RefCell::new(LinearArena::with_capacity(16, Global).unwrap());
        let alloc = LinearAllocator::<u16>::new(&arena);
        let p = alloc.allocate(2).unwrap();
        // SAFETY: `p` was allocated for two elements above.
        unsafe { alloc.deallocate(p, 2) };
        assert_eq!(arena.borrow().size(), 4);
    }

    #[test]
    fn element_count_overflow_is_reported() {
        let arena = RefCell::new(LinearArena::with_capacity(16, Global).unwrap());
        let alloc = LinearAllocator::<u64>::new(&arena);
        assert_eq!(alloc.allocate(usize::MAX), Err(AllocError::Overflow));
    }

    #[test]
    fn exhaustion_is_an_error() {
        let arena = RefCell::new(LinearArena::with_capacity(16, Global).unwrap());
        let alloc = LinearAllocator::<u64>::new(&arena);
        alloc.allocate(2).unwrap();
        assert!(matches!(
            alloc.allocate(1),
            Err(AllocError::OutOfMemory { .. })
        ));
    }

    #[test]
    fn handle_inherits_arena_capabilities() {
        type Handle<'a> = LinearAllocator<'a, u8, LinearArena<GrowableParent>>;
        // Arenas never reallocate, even over a growable parent.
        let outer = RefCell::new(LinearArena::new(GrowableParent::new()));
        let handle = LinearAllocator::<u8, _>::new(&outer);
        assert!(!<Handle<'_> as Allocator>::CAN_REALLOCATE);
        let p = handle.allocate(8).unwrap();
        assert_eq!(p.as_ptr() as usize, BASE_ADDR);
        assert_eq!(outer.borrow().capacity(), 8);
    }
}

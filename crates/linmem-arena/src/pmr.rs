//! Polymorphic (dynamically dispatched) resource interface.
//!
//! [`PolymorphicResource`] is the object-safe face of an arena: code that
//! holds a `&dyn PolymorphicResource` can allocate without knowing the
//! arena's parent type. Two forms are provided:
//!
//! - any `RefCell<R>` with `R: MemoryResource` is a resource, so a
//!   `&RefCell<LinearArena<P>>` works as a non-owning handle;
//! - [`PmrLinearArena`] owns its arena and re-exposes its management calls.
//!
//! [`PolymorphicAllocator`] puts a typed [`Allocator`] on top of either, so
//! the construction helpers work through type erasure too.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use linmem_core::{AllocError, Allocator, MemoryResource};

use crate::config::ArenaConfig;
use crate::linear::LinearArena;
use crate::parent::Global;

/// Untyped allocation behind dynamic dispatch.
pub trait PolymorphicResource {
    /// Allocate `bytes` bytes aligned to `align`.
    fn allocate(&self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block from this resource with the given size and
    /// alignment.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize, align: usize);

    /// Whether memory from `self` can be released through `other`.
    ///
    /// Resources are only equal to themselves.
    fn is_equal(&self, other: &dyn PolymorphicResource) -> bool {
        ptr::addr_eq(ptr::from_ref(self), ptr::from_ref(other))
    }
}

impl<R: MemoryResource> PolymorphicResource for RefCell<R> {
    fn allocate(&self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        self.borrow_mut().allocate(bytes, align)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize, align: usize) {
        // SAFETY: forwarded from the caller.
        unsafe { self.borrow_mut().deallocate(ptr, bytes, align) }
    }
}

/// A [`LinearArena`] that owns itself behind the polymorphic interface.
#[derive(Debug)]
pub struct PmrLinearArena<P: MemoryResource = Global> {
    arena: RefCell<LinearArena<P>>,
}

impl<P: MemoryResource> PmrLinearArena<P> {
    /// See [`LinearArena::with_capacity`].
    pub fn with_capacity(capacity: usize, parent: P) -> Result<Self, AllocError> {
        LinearArena::with_capacity(capacity, parent).map(Self::from)
    }

    /// See [`LinearArena::with_config`].
    pub fn with_config(config: &ArenaConfig, parent: P) -> Result<Self, AllocError> {
        LinearArena::with_config(config, parent).map(Self::from)
    }

    /// See [`LinearArena::new`]. Growable parents only.
    pub fn new(parent: P) -> Self {
        Self::from(LinearArena::new(parent))
    }

    /// See [`LinearArena::reset`].
    pub fn reset(&mut self) {
        self.arena.get_mut().reset();
    }

    /// See [`LinearArena::truncate`]. Growable parents only.
    pub fn truncate(&mut self) -> Result<(), AllocError> {
        self.arena.get_mut().truncate()
    }

    /// Base address of the backing block, if any.
    pub fn data(&self) -> Option<NonNull<u8>> {
        self.arena.borrow().data()
    }

    /// Bytes allocated so far.
    pub fn size(&self) -> usize {
        self.arena.borrow().size()
    }

    /// Bytes reserved from the parent.
    pub fn capacity(&self) -> usize {
        self.arena.borrow().capacity()
    }

    /// The wrapped arena.
    pub fn backing_resource(&self) -> Ref<'_, LinearArena<P>> {
        self.arena.borrow()
    }

    /// The arena's parent.
    pub fn parent(&self) -> Ref<'_, P> {
        Ref::map(self.arena.borrow(), LinearArena::parent)
    }

    /// The arena's parent, mutably.
    pub fn parent_mut(&mut self) -> &mut P {
        self.arena.get_mut().parent_mut()
    }

    /// Give up the polymorphic wrapper.
    pub fn into_inner(self) -> LinearArena<P> {
        self.arena.into_inner()
    }
}

impl<P: MemoryResource> From<LinearArena<P>> for PmrLinearArena<P> {
    fn from(arena: LinearArena<P>) -> Self {
        Self {
            arena: RefCell::new(arena),
        }
    }
}

impl<P: MemoryResource> PolymorphicResource for PmrLinearArena<P> {
    fn allocate(&self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        self.arena.borrow_mut().allocate(bytes, align)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize, _align: usize) {
        self.arena.borrow_mut().deallocate(ptr, bytes);
    }
}

/// A typed allocator over any [`PolymorphicResource`].
///
/// Two allocators are equal when their resources are
/// [equal](PolymorphicResource::is_equal).
pub struct PolymorphicAllocator<'a, T> {
    resource: &'a dyn PolymorphicResource,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> PolymorphicAllocator<'a, T> {
    /// An allocator drawing from `resource`.
    pub fn new(resource: &'a dyn PolymorphicResource) -> Self {
        Self {
            resource,
            _marker: PhantomData,
        }
    }

    /// The underlying resource.
    pub fn resource(&self) -> &'a dyn PolymorphicResource {
        self.resource
    }
}

impl<T> Clone for PolymorphicAllocator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PolymorphicAllocator<'_, T> {}

impl<T> fmt::Debug for PolymorphicAllocator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicAllocator")
            .field("element", &std::any::type_name::<T>())
            .field("resource", &ptr::from_ref(self.resource).cast::<()>())
            .finish()
    }
}

impl<T, U> PartialEq<PolymorphicAllocator<'_, U>> for PolymorphicAllocator<'_, T> {
    fn eq(&self, other: &PolymorphicAllocator<'_, U>) -> bool {
        self.resource.is_equal(other.resource)
    }
}

impl<T> Eq for PolymorphicAllocator<'_, T> {}

impl<'a, T> Allocator for PolymorphicAllocator<'a, T> {
    type Value = T;
    type Rebind<U> = PolymorphicAllocator<'a, U>;

    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        let bytes = n
            .checked_mul(mem::size_of::<T>())
            .ok_or(AllocError::Overflow)?;
        self.resource
            .allocate(bytes, mem::align_of::<T>())
            .map(NonNull::cast)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        let bytes = n * mem::size_of::<T>();
        // SAFETY: forwarded from the caller.
        unsafe {
            self.resource
                .deallocate(ptr.cast(), bytes, mem::align_of::<T>())
        }
    }

    fn rebind<U>(&self) -> PolymorphicAllocator<'a, U> {
        PolymorphicAllocator::new(self.resource)
    }
}

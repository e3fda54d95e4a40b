//! Mock parents and allocators for linmem development.
//!
//! Every mock here hands out synthetic addresses starting at [`BASE_ADDR`]
//! and never backs them with memory. Arenas only do arithmetic on the
//! addresses they receive, so these mocks let tests assert exact offsets and
//! parent-side sizes. Never dereference a pointer obtained from a mock.
//!
//! The mocks check their own bookkeeping: releasing an unknown block, or
//! dropping a mock that still has a live block, panics.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

use std::cell::RefCell;
use std::marker::PhantomData;
use std::mem;
use std::num::NonZeroUsize;
use std::ptr::NonNull;
use std::rc::Rc;
use std::thread;

use linmem_core::{AllocError, Allocator, MemoryResource};

/// Address of the first block every mock hands out.
pub const BASE_ADDR: usize = 0x1000;

/// Distance between consecutive blocks from [`RelocatingParent`].
pub const RELOCATION_STRIDE: usize = 0x10_0000;

/// A pointer to `addr` that must never be dereferenced.
pub fn synthetic(addr: usize) -> NonNull<u8> {
    let addr = NonZeroUsize::new(addr).expect("synthetic addresses are non-zero");
    NonNull::dangling().with_addr(addr)
}

fn check_align(align: usize) {
    assert!(
        align.is_power_of_two() && BASE_ADDR % align == 0,
        "mock parents cannot satisfy alignment {align}"
    );
}

fn check_no_leak(live: bool, what: &str) {
    if live && !thread::panicking() {
        panic!("{what} dropped with a live block");
    }
}

/// A parent that serves one block at a constant address and cannot grow.
#[derive(Debug, Default)]
pub struct FixedParent {
    outstanding: Option<usize>,
    allocations: usize,
}

impl FixedParent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a block is currently handed out.
    pub fn is_allocated(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Total successful `allocate` calls.
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}

impl MemoryResource for FixedParent {
    fn allocate(&mut self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        check_align(align);
        if self.outstanding.is_some() {
            return Err(AllocError::OutOfMemory {
                requested: bytes,
                available: 0,
            });
        }
        self.outstanding = Some(bytes);
        self.allocations += 1;
        Ok(synthetic(BASE_ADDR))
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, bytes: usize, _align: usize) {
        assert_eq!(ptr.addr().get(), BASE_ADDR, "unknown block released");
        assert_eq!(self.outstanding.take(), Some(bytes), "size mismatch on release");
    }
}

impl Drop for FixedParent {
    fn drop(&mut self) {
        check_no_leak(self.outstanding.is_some(), "FixedParent");
    }
}

/// A parent that grows its single block in place.
///
/// Optionally capped with [`capped`](Self::capped), and can be told to
/// refuse growth to exercise failure paths.
#[derive(Debug, Default)]
pub struct GrowableParent {
    size: usize,
    live: bool,
    max: Option<usize>,
    refuse: bool,
    reallocations: usize,
    history: Vec<usize>,
    last_align: Option<usize>,
}

impl GrowableParent {
    pub fn new() -> Self {
        Self::default()
    }

    /// A parent whose `max_size` is `max` bytes.
    pub fn capped(max: usize) -> Self {
        let mut parent = Self::new();
        parent.max = Some(max);
        parent
    }

    /// Make every following `reallocate` fail (or succeed again).
    pub fn refuse_growth(&mut self, refuse: bool) {
        self.refuse = refuse;
    }

    /// Size of the live block, or zero if none.
    pub fn size(&self) -> usize {
        if self.live {
            self.size
        } else {
            0
        }
    }

    /// Successful `reallocate` calls.
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    /// Every size the block has had, in order, across its lifetimes.
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// Alignment passed to the most recent `allocate`.
    pub fn last_align(&self) -> Option<usize> {
        self.last_align
    }

    fn check_max(&self, bytes: usize) -> Result<(), AllocError> {
        match self.max {
            Some(max) if bytes > max => Err(AllocError::ExceedsMaxSize {
                requested: bytes,
                max,
            }),
            _ => Ok(()),
        }
    }
}

impl MemoryResource for GrowableParent {
    const CAN_REALLOCATE: bool = true;

    fn allocate(&mut self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        check_align(align);
        assert!(!self.live, "GrowableParent holds one block at a time");
        self.check_max(bytes)?;
        self.live = true;
        self.size = bytes;
        self.history.push(bytes);
        self.last_align = Some(align);
        Ok(synthetic(BASE_ADDR))
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, bytes: usize, _align: usize) {
        assert!(self.live, "no live block to release");
        assert_eq!(ptr.addr().get(), BASE_ADDR, "unknown block released");
        assert_eq!(bytes, self.size, "size mismatch on release");
        self.live = false;
        self.size = 0;
    }

    unsafe fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        bytes: usize,
        _align: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        assert!(self.live, "no live block to resize");
        assert_eq!(ptr.addr().get(), BASE_ADDR, "unknown block resized");
        if self.refuse {
            return Err(AllocError::OutOfMemory {
                requested: bytes,
                available: self.size,
            });
        }
        self.check_max(bytes)?;
        self.size = bytes;
        self.reallocations += 1;
        self.history.push(bytes);
        Ok(ptr)
    }

    fn max_size(&self) -> Option<usize> {
        self.max
    }
}

impl Drop for GrowableParent {
    fn drop(&mut self) {
        check_no_leak(self.live, "GrowableParent");
    }
}

/// Address of the block [`MisalignedParent`] hands out: one past
/// [`BASE_ADDR`], so any alignment above one is missed.
pub const MISALIGNED_ADDR: usize = BASE_ADDR + 1;

/// A growable parent that ignores the requested alignment.
#[derive(Debug, Default)]
pub struct MisalignedParent {
    size: Option<usize>,
    max: Option<usize>,
}

impl MisalignedParent {
    pub fn new() -> Self {
        Self::default()
    }

    /// A parent whose `max_size` is `max` bytes.
    pub fn capped(max: usize) -> Self {
        Self {
            size: None,
            max: Some(max),
        }
    }

    /// Size of the live block, if any.
    pub fn live(&self) -> Option<usize> {
        self.size
    }

    fn check_max(&self, bytes: usize) -> Result<(), AllocError> {
        match self.max {
            Some(max) if bytes > max => Err(AllocError::ExceedsMaxSize {
                requested: bytes,
                max,
            }),
            _ => Ok(()),
        }
    }
}

impl MemoryResource for MisalignedParent {
    const CAN_REALLOCATE: bool = true;

    fn allocate(&mut self, bytes: usize, _align: usize) -> Result<NonNull<u8>, AllocError> {
        assert!(self.size.is_none(), "MisalignedParent holds one block");
        self.check_max(bytes)?;
        self.size = Some(bytes);
        Ok(synthetic(MISALIGNED_ADDR))
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, bytes: usize, _align: usize) {
        assert_eq!(ptr.addr().get(), MISALIGNED_ADDR, "unknown block released");
        assert_eq!(self.size.take(), Some(bytes), "size mismatch on release");
    }

    unsafe fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        bytes: usize,
        _align: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        assert!(self.size.is_some(), "no live block to resize");
        assert_eq!(ptr.addr().get(), MISALIGNED_ADDR, "unknown block resized");
        self.check_max(bytes)?;
        self.size = Some(bytes);
        Ok(ptr)
    }

    fn max_size(&self) -> Option<usize> {
        self.max
    }
}

impl Drop for MisalignedParent {
    fn drop(&mut self) {
        check_no_leak(self.size.is_some(), "MisalignedParent");
    }
}

/// A parent that claims to grow in place but moves the block every time.
#[derive(Debug)]
pub struct RelocatingParent {
    current: Option<(usize, usize)>,
    next_addr: usize,
}

impl RelocatingParent {
    pub fn new() -> Self {
        Self {
            current: None,
            next_addr: BASE_ADDR,
        }
    }

    /// Number of blocks currently handed out (zero or one).
    pub fn live_blocks(&self) -> usize {
        usize::from(self.current.is_some())
    }

    fn hand_out(&mut self, bytes: usize) -> NonNull<u8> {
        let addr = self.next_addr;
        self.next_addr += RELOCATION_STRIDE;
        self.current = Some((addr, bytes));
        synthetic(addr)
    }
}

impl Default for RelocatingParent {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResource for RelocatingParent {
    const CAN_REALLOCATE: bool = true;

    fn allocate(&mut self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        check_align(align);
        assert!(self.current.is_none(), "RelocatingParent holds one block");
        Ok(self.hand_out(bytes))
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, bytes: usize, _align: usize) {
        assert_eq!(
            self.current.take(),
            Some((ptr.addr().get(), bytes)),
            "unknown block released"
        );
    }

    unsafe fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        bytes: usize,
        _align: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let (addr, _) = self.current.expect("no live block to resize");
        assert_eq!(ptr.addr().get(), addr, "unknown block resized");
        Ok(self.hand_out(bytes))
    }
}

impl Drop for RelocatingParent {
    fn drop(&mut self) {
        check_no_leak(self.current.is_some(), "RelocatingParent");
    }
}

#[derive(Debug, Default)]
struct ElementState {
    live_bytes: Option<usize>,
    allocations: usize,
    reallocations: usize,
}

/// A typed, growable allocator over `V` elements.
///
/// Clones and rebinds share one set of counters and one live block. The
/// element cap given to [`capped`](Self::capped) is counted in elements of
/// the allocator it was set on and carried across rebinds as a byte count.
pub struct ElementAllocator<V> {
    state: Rc<RefCell<ElementState>>,
    max_bytes: Option<usize>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> ElementAllocator<V> {
    pub fn new() -> Self {
        Self {
            state: Rc::default(),
            max_bytes: None,
            _marker: PhantomData,
        }
    }

    /// An allocator that serves at most `max` elements.
    pub fn capped(max: usize) -> Self {
        Self {
            max_bytes: Some(max * mem::size_of::<V>()),
            ..Self::new()
        }
    }

    /// Size of the live block in bytes, or zero if none.
    pub fn live_bytes(&self) -> usize {
        self.state.borrow().live_bytes.unwrap_or(0)
    }

    /// Successful `allocate` calls across clones and rebinds.
    pub fn allocations(&self) -> usize {
        self.state.borrow().allocations
    }

    pub fn reallocations(&self) -> usize {
        self.state.borrow().reallocations
    }

    fn bytes_for(n: usize) -> usize {
        n * mem::size_of::<V>()
    }

    fn check_max(&self, n: usize) -> Result<(), AllocError> {
        match self.max_size() {
            Some(max) if n > max => Err(AllocError::ExceedsMaxSize { requested: n, max }),
            _ => Ok(()),
        }
    }
}

impl<V> Default for ElementAllocator<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for ElementAllocator<V> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            max_bytes: self.max_bytes,
            _marker: PhantomData,
        }
    }
}

impl<V> Allocator for ElementAllocator<V> {
    type Value = V;
    type Rebind<U> = ElementAllocator<U>;
    const CAN_REALLOCATE: bool = true;

    fn allocate(&self, n: usize) -> Result<NonNull<V>, AllocError> {
        check_align(mem::align_of::<V>());
        self.check_max(n)?;
        let mut state = self.state.borrow_mut();
        assert!(state.live_bytes.is_none(), "ElementAllocator holds one block");
        state.live_bytes = Some(Self::bytes_for(n));
        state.allocations += 1;
        Ok(synthetic(BASE_ADDR).cast())
    }

    unsafe fn deallocate(&self, ptr: NonNull<V>, n: usize) {
        assert_eq!(ptr.addr().get(), BASE_ADDR, "unknown block released");
        let mut state = self.state.borrow_mut();
        assert_eq!(
            state.live_bytes.take(),
            Some(Self::bytes_for(n)),
            "size mismatch on release"
        );
    }

    unsafe fn reallocate(&self, ptr: NonNull<V>, n: usize) -> Result<NonNull<V>, AllocError> {
        assert_eq!(ptr.addr().get(), BASE_ADDR, "unknown block resized");
        self.check_max(n)?;
        let mut state = self.state.borrow_mut();
        assert!(state.live_bytes.is_some(), "no live block to resize");
        state.live_bytes = Some(Self::bytes_for(n));
        state.reallocations += 1;
        Ok(ptr)
    }

    fn max_size(&self) -> Option<usize> {
        let size = mem::size_of::<V>().max(1);
        self.max_bytes.map(|bytes| bytes / size)
    }

    fn rebind<U>(&self) -> ElementAllocator<U> {
        ElementAllocator {
            state: Rc::clone(&self.state),
            max_bytes: self.max_bytes,
            _marker: PhantomData,
        }
    }
}

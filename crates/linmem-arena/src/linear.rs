//! The linear arena: one contiguous block with a bump cursor.
//!
//! A [`LinearArena`] owns a single block obtained from its parent and hands
//! out aligned sub-ranges of it by advancing a cursor. Individual
//! allocations are never freed; [`LinearArena::reset`] rewinds the cursor.
//!
//! When a request does not fit, an arena whose parent can grow in place asks
//! for `max(bytes in use, 2 × capacity)` (clamped to the parent's maximum)
//! and insists the block keeps its address. Previously returned pointers stay
//! valid across growth; a parent that moves the block is a fatal error.

use std::ptr::NonNull;

use linmem_core::{AllocError, MemoryResource};
use tracing::{debug, trace, warn};

use crate::config::ArenaConfig;
use crate::parent::Global;
use crate::raw;

/// A possibly-growable bump arena over one parent block.
///
/// Only types without drop glue should be placed in an arena: nothing is
/// ever dropped. Use [`create`](crate::create) to construct values.
///
/// The arena is not `Clone`; moving it transfers ownership of the block.
/// The block is returned to the parent when the arena is dropped.
#[derive(Debug)]
pub struct LinearArena<P: MemoryResource = Global> {
    parent: P,
    /// Base of the backing block; `None` while the arena owns no block.
    begin: Option<NonNull<u8>>,
    /// Address of the first unallocated byte.
    next: usize,
    /// One past the last usable byte.
    end: usize,
    /// Alignment the block was requested with.
    align: usize,
}

impl<P: MemoryResource> LinearArena<P> {
    /// An arena with a first block of `capacity` bytes.
    ///
    /// A `capacity` of zero allocates nothing up front.
    pub fn with_capacity(capacity: usize, parent: P) -> Result<Self, AllocError> {
        Self::with_config(&ArenaConfig::new(capacity), parent)
    }

    /// An arena built from `config`.
    ///
    /// # Panics
    ///
    /// Panics if `config.backing_align` is not a power of two.
    pub fn with_config(config: &ArenaConfig, mut parent: P) -> Result<Self, AllocError> {
        assert!(
            config.backing_align.is_power_of_two(),
            "backing alignment {} is not a power of two",
            config.backing_align
        );
        let capacity = config.initial_capacity;
        if capacity == 0 {
            return Ok(Self::empty(parent, config.backing_align));
        }
        let base = parent.allocate(capacity, config.backing_align)?;
        let Some(end) = raw::addr(base).checked_add(capacity) else {
            // SAFETY: `base` was just allocated with this size and alignment.
            unsafe { parent.deallocate(base, capacity, config.backing_align) };
            return Err(AllocError::Overflow);
        };
        Ok(Self {
            parent,
            begin: Some(base),
            next: raw::addr(base),
            end,
            align: config.backing_align,
        })
    }

    /// An empty arena that takes its first block on first use.
    ///
    /// Only available for parents that can grow; an empty arena over a fixed
    /// parent could never allocate. Instantiating this with such a parent
    /// fails to build.
    pub fn new(parent: P) -> Self {
        const {
            assert!(
                P::CAN_REALLOCATE,
                "an empty arena needs a parent that can reallocate"
            )
        };
        Self::empty(parent, ArenaConfig::DEFAULT_BACKING_ALIGN)
    }

    fn empty(parent: P, align: usize) -> Self {
        Self {
            parent,
            begin: None,
            next: 0,
            end: 0,
            align,
        }
    }

    /// Reserve `bytes` bytes at the next multiple of `align`.
    ///
    /// Zero-byte requests succeed without advancing the cursor. They return
    /// the aligned cursor while it stays within the block, and an aligned
    /// dangling pointer once it would fall past the end. If the
    /// request does not fit, the arena grows in place when its parent allows
    /// it; otherwise the call fails and the arena is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two.
    pub fn allocate(&mut self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        assert!(
            align.is_power_of_two(),
            "alignment {align} is not a power of two"
        );
        let Some(base) = self.begin else {
            return self.allocate_first(bytes, align);
        };
        let start = raw::align_up(self.next, align).ok_or(AllocError::Overflow)?;
        if bytes == 0 {
            if start > self.end {
                return Ok(raw::dangling(align));
            }
            return Ok(raw::pointer_at(base, start));
        }
        let next = start.checked_add(bytes).ok_or(AllocError::Overflow)?;
        if next > self.end {
            self.grow(base, next, bytes)?;
        }
        self.next = next;
        Ok(raw::pointer_at(base, start))
    }

    /// Individual allocations are never released; this does nothing.
    pub fn deallocate(&mut self, ptr: NonNull<u8>, bytes: usize) {
        let _ = (ptr, bytes);
    }

    /// Rewind the cursor to the start of the block.
    ///
    /// Every pointer previously handed out may be reused by later
    /// allocations; callers must not hold on to any of them. Capacity is
    /// unchanged.
    pub fn reset(&mut self) {
        trace!(released = self.size(), "linear arena reset");
        self.next = self.begin.map_or(0, raw::addr);
    }

    /// Shrink the parent block to the bytes currently in use.
    ///
    /// With nothing in use the block is handed back to the parent and the
    /// capacity becomes zero. Only available for parents that can grow;
    /// instantiating this with any other parent fails to build.
    pub fn truncate(&mut self) -> Result<(), AllocError> {
        const {
            assert!(
                P::CAN_REALLOCATE,
                "truncate needs a parent that can reallocate"
            )
        };
        let Some(base) = self.begin else {
            return Ok(());
        };
        let used = self.size();
        let capacity = self.capacity();
        if used == capacity {
            return Ok(());
        }
        if used == 0 {
            self.release();
            debug!(capacity, "linear arena truncated to empty");
            return Ok(());
        }
        // SAFETY: `base` is our live block of `capacity` bytes.
        let resized = unsafe { self.parent.reallocate(base, used, self.align) }?;
        if resized != base {
            return Err(self.abandon(base, resized, used));
        }
        self.end = self.next;
        debug!(from = capacity, to = used, "linear arena truncated");
        Ok(())
    }

    /// Base address of the backing block, if the arena owns one.
    pub fn data(&self) -> Option<NonNull<u8>> {
        self.begin
    }

    /// Bytes allocated so far, including alignment padding.
    pub fn size(&self) -> usize {
        self.begin.map_or(0, |base| self.next - raw::addr(base))
    }

    /// Bytes reserved from the parent.
    pub fn capacity(&self) -> usize {
        self.begin.map_or(0, |base| self.end - raw::addr(base))
    }

    /// Bytes left before the arena has to grow.
    pub fn remaining(&self) -> usize {
        self.end - self.next
    }

    /// The parent allocator.
    pub fn parent(&self) -> &P {
        &self.parent
    }

    /// The parent allocator, mutably.
    ///
    /// Releasing or resizing the arena's block through this reference breaks
    /// the arena.
    pub fn parent_mut(&mut self) -> &mut P {
        &mut self.parent
    }

    /// First allocation of an arena that owns no block yet.
    fn allocate_first(&mut self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        if bytes == 0 {
            return Ok(raw::dangling(align));
        }
        if !P::CAN_REALLOCATE {
            return Err(AllocError::OutOfMemory {
                requested: bytes,
                available: 0,
            });
        }
        if let Some(max) = self.parent.max_size() {
            if bytes > max {
                return Err(AllocError::ExceedsMaxSize {
                    requested: bytes,
                    max,
                });
            }
        }
        let block_align = self.align.max(align);
        let base = self.parent.allocate(bytes, block_align)?;
        let Some(end) = raw::addr(base).checked_add(bytes) else {
            // SAFETY: `base` was just allocated with this size and alignment.
            unsafe { self.parent.deallocate(base, bytes, block_align) };
            return Err(AllocError::Overflow);
        };
        let previous_align = self.align;
        self.begin = Some(base);
        self.next = raw::addr(base);
        self.end = end;
        self.align = block_align;
        // A parent that ignored the alignment leaves padding to cover, which
        // goes through the regular growth path. If that fails the block goes
        // back and the arena stays empty.
        match self.allocate(bytes, align) {
            Ok(ptr) => {
                debug!(capacity = self.capacity(), "linear arena took its first block");
                Ok(ptr)
            }
            Err(err) => {
                self.release();
                self.align = previous_align;
                Err(err)
            }
        }
    }

    /// Hand the block, if any, back to the parent and become empty.
    fn release(&mut self) {
        let capacity = self.capacity();
        let Some(base) = self.begin.take() else {
            return;
        };
        self.next = 0;
        self.end = 0;
        // SAFETY: `base` was our live block of `capacity` bytes.
        unsafe { self.parent.deallocate(base, capacity, self.align) };
    }

    /// Grow the block in place so that `next` fits.
    ///
    /// Commits nothing unless the parent confirms the same base address.
    fn grow(&mut self, base: NonNull<u8>, next: usize, bytes: usize) -> Result<(), AllocError> {
        if !P::CAN_REALLOCATE {
            return Err(AllocError::OutOfMemory {
                requested: bytes,
                available: self.remaining(),
            });
        }
        let capacity = self.capacity();
        let used = next - raw::addr(base);
        let target = self.growth_target(used, capacity)?;
        let end = raw::addr(base)
            .checked_add(target)
            .ok_or(AllocError::Overflow)?;
        // SAFETY: `base` is our live block of `capacity` bytes.
        let resized = unsafe { self.parent.reallocate(base, target, self.align) }?;
        if resized != base {
            return Err(self.abandon(base, resized, target));
        }
        debug!(
            from = capacity,
            to = target,
            requested = bytes,
            "linear arena grew in place"
        );
        self.end = end;
        Ok(())
    }

    /// The larger of `used` and double the capacity, clamped to the parent's
    /// maximum when `used` still fits under it.
    fn growth_target(&self, used: usize, capacity: usize) -> Result<usize, AllocError> {
        let target = used.max(capacity.saturating_mul(2));
        match self.parent.max_size() {
            Some(max) if used > max => Err(AllocError::ExceedsMaxSize {
                requested: used,
                max,
            }),
            Some(max) => Ok(target.min(max)),
            None => Ok(target),
        }
    }

    /// Give a relocated block back to the parent and become empty.
    ///
    /// Every pointer handed out pointed into the old block, which the parent
    /// has already released, so there is nothing left worth keeping.
    fn abandon(&mut self, base: NonNull<u8>, moved: NonNull<u8>, bytes: usize) -> AllocError {
        warn!(
            expected = raw::addr(base),
            actual = raw::addr(moved),
            "parent relocated the arena block"
        );
        self.begin = None;
        self.next = 0;
        self.end = 0;
        // SAFETY: the parent just handed us `moved` as a block of `bytes`.
        unsafe { self.parent.deallocate(moved, bytes, self.align) };
        AllocError::Relocated {
            expected: raw::addr(base),
            actual: raw::addr(moved),
        }
    }
}

impl<P: MemoryResource> MemoryResource for LinearArena<P> {
    // The arena never reallocates; only its parent does.
    const CAN_REALLOCATE: bool = false;

    fn allocate(&mut self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        LinearArena::allocate(self, bytes, align)
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, bytes: usize, _align: usize) {
        LinearArena::deallocate(self, ptr, bytes);
    }
}

impl<P: MemoryResource> Drop for LinearArena<P> {
    fn drop(&mut self) {
        self.release();
    }
}

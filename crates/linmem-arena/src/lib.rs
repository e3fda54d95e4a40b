//! Linear bump arena with in-place growth.
//!
//! A [`LinearArena`] owns one contiguous block from a parent allocator and
//! hands out aligned byte ranges by bumping a cursor. Nothing is freed
//! individually; [`LinearArena::reset`] rewinds the whole arena.
//!
//! # Architecture
//!
//! ```text
//! LinearArena<P> (begin / next / end over one parent block)
//! ├── parent P: MemoryResource   Global, Reservation, FromAllocator<A>, ...
//! ├── LinearAllocator<'a, T, R>  typed, copyable handle over &RefCell<R>
//! ├── PolymorphicResource        dyn-dispatched face (RefCell<R>, PmrLinearArena)
//! │   └── PolymorphicAllocator   typed handle over &dyn PolymorphicResource
//! └── create                     construct values without drop glue
//! ```
//!
//! # Growth
//!
//! When a request overflows the block and the parent can reallocate in
//! place, the arena asks for `max(bytes in use, 2 × capacity)`, clamped to
//! the parent's `max_size`. The base address never changes, so pointers
//! already handed out stay valid. A parent that moves the block anyway is
//! reported as [`AllocError::Relocated`] and the arena drops to empty.
//!
//! # Unsafe code
//!
//! Confined to releasing blocks to parents and to writing values in
//! [`create`]. Address arithmetic in `raw` is safe and keeps the base
//! pointer's provenance.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod allocator;
pub mod config;
pub mod create;
pub mod linear;
pub mod parent;
pub mod pmr;
mod raw;

// Public re-exports for the primary API surface.
pub use allocator::LinearAllocator;
pub use config::ArenaConfig;
pub use linear::LinearArena;
pub use linmem_core::{AllocError, Allocator, FromAllocator, MemoryResource};
pub use parent::{Global, Reservation};
pub use pmr::{PmrLinearArena, PolymorphicAllocator, PolymorphicResource};

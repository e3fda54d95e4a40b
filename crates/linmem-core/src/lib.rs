//! Core contracts for the linmem linear arena.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! two shapes a backing ("parent") allocator can take, the compile-time
//! capability constants arenas branch on, and the single error type every
//! allocation path reports.
//!
//! - [`MemoryResource`]: untyped `allocate(bytes, align)` shape.
//! - [`Allocator`]: typed, cheaply clonable, rebindable shape.
//! - [`FromAllocator`]: presents an [`Allocator`] as a [`MemoryResource`].
//!
//! Growth support is advertised through the associated constant
//! `CAN_REALLOCATE`, so every decision that depends on it is made when the
//! generic code is instantiated, never at runtime.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod bridge;
pub mod error;
pub mod traits;

pub use bridge::FromAllocator;
pub use error::AllocError;
pub use traits::{Allocator, MemoryResource};

//! linmem: a linear (bump-pointer) arena allocator with in-place growth.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! linmem sub-crates. For most users, adding `linmem` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::cell::RefCell;
//!
//! use linmem::prelude::*;
//!
//! // A fixed 1 KiB arena on the global allocator.
//! let mut arena = LinearArena::with_capacity(1024, Global).unwrap();
//! let id = create::object(&mut arena, 7u32).unwrap();
//! let samples = create::array_default::<f32, _>(&mut arena, 16).unwrap();
//! assert_eq!(samples.len(), 16);
//!
//! // An arena that starts empty and grows in place inside a reservation.
//! let mut growing = LinearArena::new(Reservation::new(1 << 20));
//! for i in 0..1000u64 {
//!     create::object(&mut growing, i).unwrap();
//! }
//! assert_eq!(growing.size(), 8000);
//!
//! // Typed handles share one arena across element types.
//! let shared = RefCell::new(LinearArena::with_capacity(256, Global).unwrap());
//! let bytes = LinearAllocator::<u8>::new(&shared);
//! let words = create::from_allocator::array(&bytes, [1u64, 2, 3]).unwrap();
//!
//! // SAFETY: the arenas are alive and were never reset.
//! unsafe {
//!     assert_eq!(id.read(), 7);
//!     assert_eq!(words.as_ref(), &[1, 2, 3]);
//! }
//!
//! // Everything is released at once.
//! arena.reset();
//! assert_eq!(arena.size(), 0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`traits`] | `linmem-core` | Parent traits, `FromAllocator`, `AllocError` |
//! | [`arena`] | `linmem-arena` | `LinearArena`, parents, adaptors, construction helpers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Parent allocator contracts and the error type (`linmem-core`).
///
/// Implement [`traits::MemoryResource`] or [`traits::Allocator`] to back an
/// arena with your own allocator.
pub use linmem_core as traits;

/// The arena and its adaptors (`linmem-arena`).
///
/// [`arena::LinearArena`] is the allocator itself; [`arena::create`] builds
/// values in it; [`arena::pmr`] holds the dynamically dispatched interface.
pub use linmem_arena as arena;

/// Common imports for typical linmem usage.
///
/// ```rust
/// use linmem::prelude::*;
/// ```
///
/// This imports the arena, its configuration and built-in parents, both
/// adaptor families, the parent traits, and the [`create`](crate::arena::create)
/// module.
pub mod prelude {
    // Arena
    pub use linmem_arena::{create, ArenaConfig, LinearArena};

    // Parents
    pub use linmem_arena::{Global, Reservation};
    pub use linmem_core::{Allocator, FromAllocator, MemoryResource};

    // Adaptors
    pub use linmem_arena::{
        LinearAllocator, PmrLinearArena, PolymorphicAllocator, PolymorphicResource,
    };

    // Errors
    pub use linmem_core::AllocError;
}

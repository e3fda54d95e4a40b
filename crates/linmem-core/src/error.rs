//! Allocation failure type shared by arenas, adaptors and parents.
//!
//! Every variant means the same thing to a caller: the requested allocation
//! did not happen. The variants only record why, for diagnostics.

use std::error::Error;
use std::fmt;

/// Errors that can occur while allocating from an arena or its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// Not enough capacity and the parent could not provide more.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes that were still available.
        available: usize,
    },
    /// The parent returned a different base address while resizing a block.
    ///
    /// Arenas never follow a relocated block: every pointer they have handed
    /// out would dangle.
    Relocated {
        /// Base address the arena owned before the call.
        expected: usize,
        /// Address the parent returned.
        actual: usize,
    },
    /// Address or size arithmetic overflowed `usize`.
    Overflow,
    /// The bytes in use would exceed the parent's maximum allocation size.
    ExceedsMaxSize {
        /// Number of bytes that would be in use.
        requested: usize,
        /// The parent's maximum size.
        max: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                available,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes, {available} bytes available"
                )
            }
            Self::Relocated { expected, actual } => {
                write!(
                    f,
                    "parent relocated the arena block from {expected:#x} to {actual:#x}"
                )
            }
            Self::Overflow => write!(f, "allocation size overflows the address space"),
            Self::ExceedsMaxSize { requested, max } => {
                write!(
                    f,
                    "{requested} bytes exceed the parent's maximum size of {max} bytes"
                )
            }
        }
    }
}

impl Error for AllocError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_message_names_both_sizes() {
        let err = AllocError::OutOfMemory {
            requested: 24,
            available: 6,
        };
        assert_eq!(
            err.to_string(),
            "out of memory: requested 24 bytes, 6 bytes available"
        );
    }

    #[test]
    fn relocated_message_is_hex() {
        let err = AllocError::Relocated {
            expected: 0x1000,
            actual: 0x2000,
        };
        assert_eq!(
            err.to_string(),
            "parent relocated the arena block from 0x1000 to 0x2000"
        );
    }

    #[test]
    fn usable_as_boxed_error() {
        let err: Box<dyn Error> = Box::new(AllocError::Overflow);
        assert!(err.to_string().contains("overflows"));
    }
}

//! Arena configuration parameters.

/// Configuration for a [`LinearArena`](crate::LinearArena).
///
/// Controls how large the first backing block is and how it is aligned.
/// All values are immutable once the arena is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the first backing block in bytes.
    ///
    /// Default: 1 MiB. Zero defers the first parent allocation to the first
    /// non-empty request, which only growable parents can satisfy.
    pub initial_capacity: usize,

    /// Alignment the backing block is requested with.
    ///
    /// Default: 16. Must be a power of two. Allocations are aligned against
    /// absolute addresses regardless, so this only decides how much padding
    /// the first few allocations may need.
    pub backing_align: usize,
}

impl ArenaConfig {
    /// Default initial capacity: 1 MiB.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 1024 * 1024;

    /// Default backing alignment, enough for any primitive type.
    pub const DEFAULT_BACKING_ALIGN: usize = 16;

    /// Create a config with the given initial capacity.
    ///
    /// Uses default values for all other parameters.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            backing_align: Self::DEFAULT_BACKING_ALIGN,
        }
    }

    /// Replace the backing alignment.
    pub fn with_backing_align(mut self, backing_align: usize) -> Self {
        self.backing_align = backing_align;
        self
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_initial_capacity_is_one_mib() {
        let config = ArenaConfig::default();
        assert_eq!(config.initial_capacity, 1024 * 1024);
        assert_eq!(config.backing_align, 16);
    }

    #[test]
    fn backing_align_override_preserves_capacity() {
        let config = ArenaConfig::new(64).with_backing_align(64);
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.backing_align, 64);
    }
}

//! Workloads for benchmarking the linmem arena.
//!
//! - [`mixed_requests`]: deterministic `(bytes, align)` request stream
//! - [`total_footprint`]: upper bound on the bytes a request stream needs

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Generate `count` allocation requests via a simple hash of the seed.
///
/// Sizes fall in `1..=max_bytes`; alignments are powers of two up to 16.
/// The same `(count, max_bytes, seed)` always yields the same stream.
pub fn mixed_requests(count: usize, max_bytes: usize, seed: u64) -> Vec<(usize, usize)> {
    assert!(max_bytes > 0, "max_bytes must be positive");
    (0..count)
        .map(|i| {
            let h = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add((i as u64).wrapping_mul(1442695040888963407));
            let h = h ^ (h >> 33);
            let bytes = (h % max_bytes as u64) as usize + 1;
            let align = 1usize << ((h >> 20) % 5);
            (bytes, align)
        })
        .collect()
}

/// Bytes needed to serve `requests` in order, assuming worst-case padding.
pub fn total_footprint(requests: &[(usize, usize)]) -> usize {
    requests.iter().map(|&(bytes, align)| bytes + align - 1).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_deterministic() {
        assert_eq!(mixed_requests(100, 64, 7), mixed_requests(100, 64, 7));
        assert_ne!(mixed_requests(100, 64, 7), mixed_requests(100, 64, 8));
    }

    #[test]
    fn requests_stay_in_range() {
        for (bytes, align) in mixed_requests(1000, 32, 42) {
            assert!((1..=32).contains(&bytes));
            assert!(align.is_power_of_two() && align <= 16);
        }
    }

    #[test]
    fn footprint_covers_padding() {
        assert_eq!(total_footprint(&[(3, 1), (8, 8)]), 3 + 15);
    }
}

use linmem_arena::{AllocError, LinearArena};
use linmem_test_utils::{FixedParent, GrowableParent};
use proptest::prelude::*;

fn request() -> impl Strategy<Value = (usize, usize)> {
    (0usize..64, 0u32..7).prop_map(|(bytes, shift)| (bytes, 1usize << shift))
}

proptest! {
    #[test]
    fn allocations_are_aligned_and_disjoint(
        capacity in 0usize..512,
        requests in prop::collection::vec(request(), 1..64),
    ) {
        let mut arena = LinearArena::with_capacity(capacity, FixedParent::new()).unwrap();
        let mut taken: Vec<(usize, usize)> = Vec::new();
        for (bytes, align) in requests {
            let before = arena.size();
            match arena.allocate(bytes, align) {
                Ok(ptr) => {
                    let start = ptr.addr().get();
                    prop_assert_eq!(start % align, 0);
                    if bytes == 0 {
                        prop_assert_eq!(arena.size(), before);
                        continue;
                    }
                    let base = arena.data().unwrap().addr().get();
                    prop_assert!(start >= base);
                    prop_assert!(start + bytes <= base + arena.capacity());
                    for &(s, len) in &taken {
                        prop_assert!(start >= s + len || start + bytes <= s);
                    }
                    prop_assert!(arena.size() >= before + bytes);
                    taken.push((start, bytes));
                }
                Err(err) => {
                    let is_out_of_memory = matches!(err, AllocError::OutOfMemory { .. });
                    prop_assert!(is_out_of_memory);
                    prop_assert_eq!(arena.size(), before);
                }
            }
        }
    }

    #[test]
    fn growth_is_max_of_needed_and_double(
        initial in 1usize..256,
        requests in prop::collection::vec(1usize..2048, 1..32),
    ) {
        let mut arena = LinearArena::with_capacity(initial, GrowableParent::new()).unwrap();
        let mut capacity = initial;
        let mut used = 0;
        for bytes in requests {
            arena.allocate(bytes, 1).unwrap();
            used += bytes;
            if used > capacity {
                capacity = used.max(capacity * 2);
            }
            prop_assert_eq!(arena.size(), used);
            prop_assert_eq!(arena.capacity(), capacity);
            prop_assert_eq!(arena.parent().size(), capacity);
        }
        arena.truncate().unwrap();
        prop_assert_eq!(arena.capacity(), used);
    }

    #[test]
    fn reset_returns_to_the_base(
        requests in prop::collection::vec(request(), 1..32),
    ) {
        let mut arena = LinearArena::with_capacity(4096, FixedParent::new()).unwrap();
        for (bytes, align) in requests {
            arena.allocate(bytes, align).unwrap();
        }
        let capacity = arena.capacity();
        arena.reset();
        prop_assert_eq!(arena.size(), 0);
        prop_assert_eq!(arena.capacity(), capacity);
        let first = arena.allocate(1, 1).unwrap();
        prop_assert_eq!(Some(first), arena.data());
    }
}

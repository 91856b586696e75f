// TreeMultimap property tests through the public API.
//
// Property 1: rebuild round trip.
//  - For any multiset of keys, perfectly_balance preserves the in-order
//    (key, count) sequence, size and count, and leaves the tree balanced
//    with minimal height.
//
// Property 2: deletions keep the AVL bound.
//  - Insert a multiset, then delete a random selection (some ignoring
//    counts); after every step the invariant checker passes and the
//    aggregate count matches an independent recount.
use proptest::prelude::*;
use tree_multimap::{IterationType, NodeField, TreeMultimap};

proptest! {
    #[test]
    fn prop_rebuild_round_trip(
        keys in proptest::collection::vec(0u16..500, 0..300),
        recursive in any::<bool>(),
    ) {
        let mut t: TreeMultimap<u16, ()> = TreeMultimap::new();
        for k in &keys {
            t.add(*k, ());
        }
        let before: Vec<(u16, usize)> = t.iter().map(|n| (*n.key(), n.count())).collect();
        let (size, total) = (t.size(), t.count());
        let it = if recursive { IterationType::Recursive } else { IterationType::Iterative };

        prop_assert_eq!(t.perfectly_balance(Some(it)), !keys.is_empty());
        let after: Vec<(u16, usize)> = t.iter().map(|n| (*n.key(), n.count())).collect();
        prop_assert_eq!(after, before);
        prop_assert_eq!((t.size(), t.count()), (size, total));
        prop_assert_eq!(total, keys.len());
        prop_assert!(t.is_avl_balanced());
        if size > 0 {
            let minimal = (usize::BITS - size.leading_zeros()) as isize - 1;
            prop_assert_eq!(t.get_height(None), minimal);
        }
        prop_assert!(t.check_invariants().is_ok());
    }
}

proptest! {
    #[test]
    fn prop_deletions_keep_balance(
        keys in proptest::collection::vec(0u8..64, 1..200),
        dels in proptest::collection::vec((0u8..64, any::<bool>()), 0..200),
    ) {
        let mut t: TreeMultimap<u8, u8> = TreeMultimap::new();
        t.extend(keys.iter().map(|&k| (k, k)));
        for (k, ignore_count) in dels {
            let had = t.get(&k).and_then(|id| id.count(&t));
            let total = t.count();
            let out = t.delete(&k, ignore_count);
            match had {
                None => prop_assert!(out.is_empty()),
                Some(c) => {
                    let removed = if ignore_count { c } else { 1 };
                    prop_assert_eq!(t.count(), total - removed);
                }
            }
            prop_assert!(t.check_invariants().is_ok(), "{:?}", t.check_invariants());
            prop_assert_eq!(t.subtree_sum(None, NodeField::Count), t.count());
        }
    }
}

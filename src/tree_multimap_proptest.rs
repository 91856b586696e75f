#![cfg(test)]

// In-crate property tests for TreeMultimap against a BTreeMap model.

use crate::config::IterationType;
use crate::traversal::DfsOrder;
use crate::tree_multimap::{Deleted, TreeMultimap};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Add(i16, usize),
    Delete(i16),
    DeleteAll(i16),
    DeleteByValue(i16),
    AddGreater(i16, isize),
    Rebalance(IterationType),
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    // Narrow key range so duplicates and deletions of live keys are common.
    let key = -40i16..40;
    prop_oneof![
        6 => (key.clone(), 1usize..4).prop_map(|(k, c)| Op::Add(k, c)),
        3 => key.clone().prop_map(Op::Delete),
        1 => key.clone().prop_map(Op::DeleteAll),
        1 => key.clone().prop_map(Op::DeleteByValue),
        1 => (key, -2isize..3).prop_map(|(k, d)| Op::AddGreater(k, d)),
        1 => prop_oneof![Just(IterationType::Recursive), Just(IterationType::Iterative)]
            .prop_map(Op::Rebalance),
        1 => Just(Op::Clear),
    ]
}

fn model_total(model: &BTreeMap<i16, usize>) -> usize {
    model.values().sum()
}

// Property: state-machine equivalence against BTreeMap<key, count>.
// Invariants checked after every op:
// - in-order keys and counts equal the model's,
// - size/count equal the model's key count and count sum,
// - check_invariants passes (order, AVL bound, stored heights, links, total),
// - is_avl_balanced agrees for both iteration variants.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in proptest::collection::vec(arb_op(), 1..120)) {
        let mut sut: TreeMultimap<i16, i32> = TreeMultimap::new();
        let mut model: BTreeMap<i16, usize> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Add(k, c) => {
                    let id = sut.add_with_count(k, i32::from(k) * 2, c);
                    prop_assert!(id.is_some());
                    *model.entry(k).or_insert(0) += c;
                }
                Op::Delete(k) => {
                    let out = sut.delete(&k, false);
                    match model.get(&k).copied() {
                        None => prop_assert!(out.is_empty()),
                        Some(c) if c > 1 => {
                            let decremented = matches!(out[0].deleted, Deleted::Decremented(_));
                            prop_assert!(decremented);
                            model.insert(k, c - 1);
                        }
                        Some(_) => {
                            let removed_one = matches!(out[0].deleted, Deleted::Removed { count: 1, .. });
                            prop_assert!(removed_one, "expected removal of a single occurrence");
                            model.remove(&k);
                        }
                    }
                }
                Op::DeleteAll(k) => {
                    let out = sut.delete(&k, true);
                    match model.remove(&k) {
                        None => prop_assert!(out.is_empty()),
                        Some(c) => match &out[0].deleted {
                            Deleted::Removed { key, count, .. } => {
                                prop_assert_eq!(*key, k);
                                prop_assert_eq!(*count, c);
                            }
                            other => prop_assert!(false, "unexpected {:?}", other),
                        },
                    }
                }
                Op::DeleteByValue(k) => {
                    let out = sut.delete_by(&(i32::from(k) * 2), |n| *n.value(), false);
                    prop_assert_eq!(out.is_empty(), !model.contains_key(&k));
                    match model.get(&k).copied() {
                        Some(1) => {
                            model.remove(&k);
                        }
                        Some(c) => {
                            model.insert(k, c - 1);
                        }
                        None => {}
                    }
                }
                Op::AddGreater(k, d) => {
                    let touched = sut.all_greater_nodes_add_count(&k, d);
                    let mut any = false;
                    for (_, c) in model.range_mut(k + 1..) {
                        *c = c.saturating_add_signed(d).max(1);
                        any = true;
                    }
                    prop_assert_eq!(touched, any);
                }
                Op::Rebalance(it) => {
                    let was_empty = model.is_empty();
                    prop_assert_eq!(sut.perfectly_balance(Some(it)), !was_empty);
                    prop_assert!(sut.is_perfectly_balanced());
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }

            let got: Vec<(i16, usize)> = sut.iter().map(|n| (*n.key(), n.count())).collect();
            let want: Vec<(i16, usize)> = model.iter().map(|(k, c)| (*k, *c)).collect();
            prop_assert_eq!(got, want);
            prop_assert_eq!(sut.size(), model.len());
            prop_assert_eq!(sut.count(), model_total(&model));
            prop_assert!(sut.check_invariants().is_ok(), "{:?}", sut.check_invariants());
            for it in [IterationType::Recursive, IterationType::Iterative] {
                sut.set_iteration_type(it);
                prop_assert!(sut.is_avl_balanced());
            }
        }
    }
}

// Property: every traversal yields the same sequence under both iteration
// types, and the balance scan never changes size, total or shape.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_traversal_variants_agree(keys in proptest::collection::vec(any::<i16>(), 0..200)) {
        let mut t: TreeMultimap<i16, ()> = TreeMultimap::new();
        for k in keys {
            t.add(k, ());
        }
        for order in [DfsOrder::Pre, DfsOrder::In, DfsOrder::Post] {
            t.set_iteration_type(IterationType::Recursive);
            let rec = t.dfs(order);
            let rec_height = t.get_height(None);
            t.set_iteration_type(IterationType::Iterative);
            prop_assert_eq!(rec, t.dfs(order));
            prop_assert_eq!(rec_height, t.get_height(None));
        }
        let shape = t.bfs();
        let (size, total) = (t.size(), t.count());
        prop_assert!(t.is_avl_balanced());
        prop_assert_eq!(shape, t.bfs());
        prop_assert_eq!((size, total), (t.size(), t.count()));
    }
}

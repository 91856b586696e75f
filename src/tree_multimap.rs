//! TreeMultimap: occurrence counts and aggregate totals atop BalancedTree.

use crate::balanced_tree::BalancedTree;
use crate::comparator::{Comparator, FnComparator, NaturalOrder};
use crate::config::{IterationType, TreeOptions};
use crate::error::{InsertError, InvariantViolation};
use crate::node::{Node, NodeField, NodeId, NodeRef, NodeStore};
use crate::ordered_tree::{Iter, OrderedTree};
use crate::traversal::DfsOrder;
use core::cmp::Ordering;
use slotmap::SecondaryMap;

/// An ordered multimap: one node per distinct key, each carrying how many
/// times the key was added.
pub struct TreeMultimap<K, V, C = NaturalOrder> {
    inner: BalancedTree<K, V, C>,
    total: usize,
}

/// Input accepted by `add_many`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
    pub count: usize,
}

impl<K, V> From<(K, V)> for Entry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Entry {
            key,
            value,
            count: 1,
        }
    }
}

impl<K, V> From<(K, V, usize)> for Entry<K, V> {
    fn from((key, value, count): (K, V, usize)) -> Self {
        Entry { key, value, count }
    }
}

impl<K: Clone, V: Clone> From<NodeRef<'_, K, V>> for Entry<K, V> {
    fn from(node: NodeRef<'_, K, V>) -> Self {
        Entry {
            key: node.key().clone(),
            value: node.value().clone(),
            count: node.count(),
        }
    }
}

/// What a deletion did to its target.
#[derive(Debug, PartialEq, Eq)]
pub enum Deleted<K, V> {
    /// One occurrence removed; the node is still live.
    Decremented(NodeId),
    /// The node left the tree; `count` is its count before deletion.
    Removed { key: K, value: V, count: usize },
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeleteOutcome<K, V> {
    pub deleted: Deleted<K, V>,
    /// Ancestor the rebalance pass started from, if any.
    pub need_balanced: Option<NodeId>,
}

impl<K: Ord, V> TreeMultimap<K, V> {
    pub fn new() -> Self {
        Self::with_options(TreeOptions::default())
    }
}

impl<K: Ord, V> Default for TreeMultimap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, F> TreeMultimap<K, V, FnComparator<F>>
where
    F: Fn(&K, &K) -> Ordering,
{
    /// Tree ordered by a closure.
    pub fn with_compare_fn(f: F) -> Self {
        Self::with_options(TreeOptions::new(FnComparator(f)))
    }
}

impl<K, V, C> NodeStore<K, V> for TreeMultimap<K, V, C> {
    fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.inner.node(id)
    }
}

impl<K, V, C> TreeMultimap<K, V, C>
where
    C: Comparator<K>,
{
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_options(TreeOptions::new(comparator))
    }

    pub fn with_options(options: TreeOptions<C>) -> Self {
        Self {
            inner: BalancedTree::with_options(options),
            total: 0,
        }
    }

    fn tree(&self) -> &OrderedTree<K, V, C> {
        self.inner.tree()
    }

    /// Number of distinct keys.
    pub fn size(&self) -> usize {
        self.inner.len()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    /// Sum of all occurrence counts.
    pub fn count(&self) -> usize {
        self.total
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn root(&self) -> Option<NodeId> {
        self.tree().root()
    }
    pub fn iteration_type(&self) -> IterationType {
        self.tree().iteration_type()
    }
    pub fn set_iteration_type(&mut self, iteration_type: IterationType) {
        self.inner.inner.set_iteration_type(iteration_type);
    }

    /// Add one occurrence of `key`.
    pub fn add(&mut self, key: K, value: V) -> Option<NodeId> {
        self.add_with_count(key, value, 1)
    }

    /// Add `count` occurrences of `key`. An existing key keeps its value and
    /// only has its count raised. A zero `count`, or one that would overflow
    /// the node's count or the total, is a no-op returning `None`.
    pub fn add_with_count(&mut self, key: K, value: V, count: usize) -> Option<NodeId> {
        if count == 0 {
            return None;
        }
        // Every node count is bounded by the total, so this also covers them.
        let total = self.total.checked_add(count)?;
        let id = match self.inner.insert(key, value, count) {
            Ok(id) => id,
            Err(InsertError::DuplicateKey(id)) => {
                self.inner.inner.live_mut(id).payload.count += count;
                log::trace!("raised count of existing key by {count}");
                id
            }
        };
        self.total = total;
        Some(id)
    }

    /// Add each entry in turn; results line up with the input.
    pub fn add_many<I>(&mut self, entries: I) -> Vec<Option<NodeId>>
    where
        I: IntoIterator,
        I::Item: Into<Entry<K, V>>,
    {
        entries
            .into_iter()
            .map(|e| {
                let Entry { key, value, count } = e.into();
                self.add_with_count(key, value, count)
            })
            .collect()
    }

    pub fn get(&self, key: &K) -> Option<NodeId> {
        self.inner.get(key)
    }

    /// First node, in key order, whose projection equals `identifier`. O(n).
    pub fn get_by<I, F>(&self, identifier: &I, callback: F) -> Option<NodeId>
    where
        I: PartialEq,
        F: FnMut(NodeRef<'_, K, V>) -> I,
    {
        self.tree().get_by(identifier, callback)
    }

    pub fn has(&self, key: &K) -> bool {
        self.tree().has(key)
    }

    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut V> {
        self.inner.inner.value_mut(id)
    }

    /// Remove one occurrence of `key`, or the whole node when `ignore_count`
    /// is set or only one occurrence is left. Empty when `key` is absent.
    ///
    /// Removing a node that has a left child relocates its in-order
    /// predecessor into its slot: the predecessor's old `NodeId` goes stale
    /// and the removed key's `NodeId` names the predecessor afterwards.
    pub fn delete(&mut self, key: &K, ignore_count: bool) -> Vec<DeleteOutcome<K, V>> {
        match self.get(key) {
            Some(id) => self.delete_node(id, ignore_count),
            None => Vec::new(),
        }
    }

    /// Like `delete`, locating the target by a full traversal that compares
    /// `callback(node)` with `identifier`.
    pub fn delete_by<I, F>(
        &mut self,
        identifier: &I,
        callback: F,
        ignore_count: bool,
    ) -> Vec<DeleteOutcome<K, V>>
    where
        I: PartialEq,
        F: FnMut(NodeRef<'_, K, V>) -> I,
    {
        match self.get_by(identifier, callback) {
            Some(id) => self.delete_node(id, ignore_count),
            None => Vec::new(),
        }
    }

    fn delete_node(&mut self, id: NodeId, ignore_count: bool) -> Vec<DeleteOutcome<K, V>> {
        let Some(node) = self.inner.inner.node_mut(id) else {
            return Vec::new();
        };
        if node.payload.count > 1 && !ignore_count {
            node.payload.count -= 1;
            self.total -= 1;
            log::trace!("decremented count, node kept");
            return vec![DeleteOutcome {
                deleted: Deleted::Decremented(id),
                need_balanced: None,
            }];
        }
        let Some(removal) = self.inner.remove(id) else {
            return Vec::new();
        };
        self.total -= removal.count;
        log::trace!("removed node holding {} occurrences", removal.count);
        vec![DeleteOutcome {
            deleted: Deleted::Removed {
                key: removal.key,
                value: removal.value,
                count: removal.count,
            },
            need_balanced: removal.need_balanced,
        }]
    }

    /// Discard every node; size and count drop to zero.
    pub fn clear(&mut self) {
        log::debug!("clearing tree of {} nodes", self.size());
        self.inner.clear();
        self.total = 0;
    }

    /// Rebuild from scratch by inserting range medians first, which yields a
    /// minimal-height tree without rotations. `None` uses the configured
    /// iteration type. Returns false only when the tree was empty.
    pub fn perfectly_balance(&mut self, iteration_type: Option<IterationType>) -> bool {
        if self.is_empty() {
            return false;
        }
        let iteration_type = iteration_type.unwrap_or(self.iteration_type());
        let mut sorted: Vec<Option<(K, V, usize)>> = self
            .inner
            .inner
            .drain_in_order()
            .into_iter()
            .map(Some)
            .collect();
        self.total = 0;
        let n = sorted.len();
        match iteration_type {
            IterationType::Recursive => self.build_recursive(&mut sorted, 0, n),
            IterationType::Iterative => {
                // Half-open [low, high) ranges; the left half is popped first.
                let mut ranges = vec![(0, n)];
                while let Some((low, high)) = ranges.pop() {
                    if low >= high {
                        continue;
                    }
                    let mid = low + (high - low) / 2;
                    self.insert_rebuilt(sorted[mid].take());
                    ranges.push((mid + 1, high));
                    ranges.push((low, mid));
                }
            }
        }
        log::debug!(
            "rebuilt {} nodes ({:?}), height {}",
            self.size(),
            iteration_type,
            self.get_height(None)
        );
        true
    }

    /// Alias for `perfectly_balance`.
    pub fn balance(&mut self, iteration_type: Option<IterationType>) -> bool {
        self.perfectly_balance(iteration_type)
    }

    fn build_recursive(&mut self, sorted: &mut [Option<(K, V, usize)>], low: usize, high: usize) {
        if low >= high {
            return;
        }
        let mid = low + (high - low) / 2;
        self.insert_rebuilt(sorted[mid].take());
        self.build_recursive(sorted, low, mid);
        self.build_recursive(sorted, mid + 1, high);
    }

    fn insert_rebuilt(&mut self, entry: Option<(K, V, usize)>) {
        let Some((key, value, count)) = entry else {
            return;
        };
        if self.inner.insert_unrotated(key, value, count).is_ok() {
            self.total += count;
        }
    }

    pub fn get_height(&self, start: Option<NodeId>) -> isize {
        self.tree().get_height(start)
    }
    pub fn get_min_height(&self, start: Option<NodeId>) -> isize {
        self.tree().get_min_height(start)
    }
    pub fn get_depth(&self, start: Option<NodeId>) -> Option<usize> {
        self.tree().get_depth(start)
    }
    pub fn get_left_most(&self, start: Option<NodeId>) -> Option<NodeId> {
        self.tree().get_left_most(start)
    }
    pub fn get_right_most(&self, start: Option<NodeId>) -> Option<NodeId> {
        self.tree().get_right_most(start)
    }
    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        self.tree().successor(id)
    }
    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        self.tree().predecessor(id)
    }

    pub fn is_avl_balanced(&self) -> bool {
        self.inner.is_avl_balanced()
    }
    pub fn is_perfectly_balanced(&self) -> bool {
        self.tree().is_perfectly_balanced()
    }

    pub fn dfs(&self, order: DfsOrder) -> Vec<NodeId> {
        self.tree().dfs(order)
    }
    pub fn dfs_from(&self, start: Option<NodeId>, order: DfsOrder) -> Vec<NodeId> {
        self.tree().dfs_from(start, order)
    }
    pub fn dfs_with<R, F>(&self, order: DfsOrder, f: F) -> Vec<R>
    where
        F: FnMut(NodeRef<'_, K, V>) -> R,
    {
        self.tree().dfs_with(order, f)
    }
    pub fn bfs(&self) -> Vec<NodeId> {
        self.tree().bfs()
    }
    pub fn bfs_with<R, F>(&self, f: F) -> Vec<R>
    where
        F: FnMut(NodeRef<'_, K, V>) -> R,
    {
        self.tree().bfs_with(f)
    }

    pub fn iter(&self) -> Iter<'_, K, V, C> {
        self.tree().iter()
    }
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|n| n.key())
    }
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|n| n.value())
    }

    /// Snapshot of `(key, value, count)` in key order.
    pub fn entries(&self) -> Vec<(K, V, usize)>
    where
        K: Clone,
        V: Clone,
    {
        self.iter()
            .map(|n| (n.key().clone(), n.value().clone(), n.count()))
            .collect()
    }

    pub fn subtree_sum(&self, start: Option<NodeId>, field: NodeField) -> usize {
        self.tree().subtree_sum(start, field)
    }

    pub fn subtree_sum_by<F>(&self, start: Option<NodeId>, f: F) -> i64
    where
        F: FnMut(NodeRef<'_, K, V>) -> i64,
    {
        self.tree().subtree_sum_by(start, f)
    }

    /// Shift the count of every node under `start` (default root) by
    /// `delta`, never below 1 and never past what the total can hold. The
    /// total follows in the same step.
    pub fn subtree_add_count(&mut self, start: Option<NodeId>, delta: isize) -> bool {
        let ids = self.tree().dfs_from(start, DfsOrder::Pre);
        self.shift_counts(&ids, delta)
    }

    /// Shift the count of every node whose key is greater than `key`.
    pub fn all_greater_nodes_add_count(&mut self, key: &K, delta: isize) -> bool {
        let ids = self.tree().greater_nodes(key);
        self.shift_counts(&ids, delta)
    }

    fn shift_counts(&mut self, ids: &[NodeId], delta: isize) -> bool {
        for &id in ids {
            let payload = &mut self.inner.inner.live_mut(id).payload;
            let old = payload.count;
            let rest = self.total - old;
            let new = old.saturating_add_signed(delta).clamp(1, usize::MAX - rest);
            payload.count = new;
            self.total = rest + new;
        }
        !ids.is_empty()
    }

    pub fn subtree_update<F>(&mut self, start: Option<NodeId>, f: F) -> bool
    where
        F: FnMut(&mut V),
    {
        self.inner.inner.subtree_update(start, f)
    }

    pub fn all_greater_nodes_update<F>(&mut self, key: &K, f: F) -> bool
    where
        F: FnMut(&mut V),
    {
        self.inner.inner.all_greater_nodes_update(key, f)
    }

    /// Independent scan of every structural and bookkeeping invariant.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let tree = self.tree();
        if let Some(root) = tree.root() {
            if tree.live(root).parent.is_some() {
                return Err(InvariantViolation::Link(root));
            }
        }
        let in_order = tree.dfs(DfsOrder::In);
        for pair in in_order.windows(2) {
            let (a, b) = (tree.live(pair[0]), tree.live(pair[1]));
            if tree.comparator().compare(&a.payload.key, &b.payload.key) != Ordering::Less {
                return Err(InvariantViolation::Order(pair[1]));
            }
        }

        let mut heights: SecondaryMap<_, isize> = SecondaryMap::with_capacity(in_order.len());
        let mut total = 0usize;
        for id in tree.dfs(DfsOrder::Post) {
            let n = tree.live(id);
            if n.payload.count == 0 {
                return Err(InvariantViolation::ZeroCount(id));
            }
            total += n.payload.count;
            for child in [n.left, n.right].into_iter().flatten() {
                if tree.live(child).parent != Some(id) {
                    return Err(InvariantViolation::Link(child));
                }
            }
            let h = |c: Option<NodeId>| c.map_or(-1, |c| heights[c.raw_handle()]);
            let (l, r) = (h(n.left), h(n.right));
            let actual = 1 + l.max(r);
            if actual != n.payload.height as isize {
                return Err(InvariantViolation::Height {
                    node: id,
                    stored: n.payload.height,
                    actual: actual as usize,
                });
            }
            if (l - r).abs() > 1 {
                return Err(InvariantViolation::Unbalanced {
                    node: id,
                    factor: l - r,
                });
            }
            heights.insert(id.raw_handle(), actual);
        }

        if in_order.len() != self.size() {
            return Err(InvariantViolation::Size {
                stored: self.size(),
                actual: in_order.len(),
            });
        }
        if total != self.total {
            return Err(InvariantViolation::Total {
                stored: self.total,
                actual: total,
            });
        }
        Ok(())
    }
}

impl<K, V, C> core::fmt::Debug for TreeMultimap<K, V, C>
where
    K: core::fmt::Debug,
    V: core::fmt::Debug,
    C: Comparator<K>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|n| (n.key(), (n.value(), n.count()))))
            .finish()
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for TreeMultimap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.add(k, v);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for TreeMultimap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = TreeMultimap::new();
        tree.extend(iter);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Reversed;

    fn keyed(keys: &[i32]) -> TreeMultimap<i32, i32> {
        let mut t = TreeMultimap::new();
        for &k in keys {
            t.add(k, k);
        }
        t
    }

    fn key_counts(t: &TreeMultimap<i32, i32>) -> Vec<(i32, usize)> {
        t.iter().map(|n| (*n.key(), n.count())).collect()
    }

    #[test]
    fn repeated_add_bumps_count_not_size() {
        let mut t = keyed(&[1, 2, 3]);
        let first = t.add(5, 50).unwrap();
        let second = t.add(5, 99).unwrap();
        assert_eq!(first, second);
        assert_eq!(t.size(), 4);
        assert_eq!(t.count(), 5);
        assert_eq!(first.count(&t), Some(2));
        assert_eq!(first.value(&t), Some(&50), "existing value is kept");
        t.check_invariants().unwrap();
    }

    #[test]
    fn zero_count_add_is_a_no_op() {
        let mut t = keyed(&[1]);
        assert!(t.add_with_count(2, 2, 0).is_none());
        assert_eq!((t.size(), t.count()), (1, 1));
        assert!(!t.has(&2));
    }

    #[test]
    fn add_many_aligns_results_with_input() {
        let mut t: TreeMultimap<i32, &str> = TreeMultimap::new();
        let res = t.add_many([
            Entry::from((3, "c")),
            Entry::from((1, "a", 4)),
            Entry::from((2, "b", 0)),
            Entry::from((3, "c")),
        ]);
        assert_eq!(res.len(), 4);
        assert!(res[2].is_none());
        assert_eq!(res[0], res[3]);
        assert_eq!(t.count(), 6);
        assert_eq!(t.size(), 2);
    }

    #[test]
    fn add_many_copies_nodes_from_another_tree() {
        let mut src = keyed(&[4, 2, 6]);
        src.add_with_count(2, 2, 2);
        let mut dst: TreeMultimap<i32, i32> = TreeMultimap::new();
        let copied: Vec<Entry<i32, i32>> = src.iter().map(Entry::from).collect();
        dst.add_many(copied);
        assert_eq!(key_counts(&dst), key_counts(&src));
        assert_eq!(dst.count(), src.count());
    }

    #[test]
    fn delete_decrements_before_removing() {
        let mut t = keyed(&[1, 5, 9]);
        t.add(5, 5);
        let out = t.delete(&5, false);
        assert!(matches!(out[0].deleted, Deleted::Decremented(_)));
        assert_eq!((t.size(), t.count()), (3, 3));
        let out = t.delete(&5, false);
        assert_eq!(
            out[0].deleted,
            Deleted::Removed {
                key: 5,
                value: 5,
                count: 1
            }
        );
        assert_eq!((t.size(), t.count()), (2, 2));
        t.check_invariants().unwrap();
    }

    #[test]
    fn ignore_count_removes_all_occurrences() {
        let mut t = keyed(&[1, 2]);
        t.add_with_count(7, 7, 5);
        let out = t.delete(&7, true);
        assert!(matches!(out[0].deleted, Deleted::Removed { count: 5, .. }));
        assert_eq!((t.size(), t.count()), (2, 2));
    }

    #[test]
    fn delete_by_uses_projection() {
        let mut t: TreeMultimap<i32, String> = TreeMultimap::new();
        t.add(1, "one".to_string());
        t.add(2, "two".to_string());
        let out = t.delete_by(&"two".to_string(), |n| n.value().clone(), false);
        assert_eq!(out.len(), 1);
        assert!(!t.has(&2));
        assert!(t.delete_by(&"zzz".to_string(), |n| n.value().clone(), false).is_empty());
    }

    #[test]
    fn rebuild_preserves_content_and_balances() {
        for it in [IterationType::Recursive, IterationType::Iterative] {
            let mut t = TreeMultimap::new();
            for k in 0..100 {
                t.add_with_count(k, k, (k % 3 + 1) as usize);
            }
            let before = key_counts(&t);
            let total = t.count();
            assert!(t.perfectly_balance(Some(it)));
            assert_eq!(key_counts(&t), before);
            assert_eq!(t.count(), total);
            assert!(t.is_avl_balanced());
            assert!(t.is_perfectly_balanced());
            assert_eq!(t.get_height(None), 6);
            t.check_invariants().unwrap();
        }
    }

    #[test]
    fn rebuild_variants_produce_the_same_shape() {
        let mut a = keyed(&(0..37).collect::<Vec<_>>());
        let mut b = keyed(&(0..37).collect::<Vec<_>>());
        a.perfectly_balance(Some(IterationType::Recursive));
        b.balance(Some(IterationType::Iterative));
        let shape = |t: &TreeMultimap<i32, i32>| t.bfs_with(|n| *n.key());
        assert_eq!(shape(&a), shape(&b));
    }

    #[test]
    fn rebuild_of_empty_tree_reports_false() {
        let mut t: TreeMultimap<i32, ()> = TreeMultimap::new();
        assert!(!t.perfectly_balance(None));
        assert!(t.is_empty());
    }

    #[test]
    fn count_deltas_keep_total_in_sync() {
        let mut t = keyed(&[1, 2, 3, 4, 5]);
        assert!(t.all_greater_nodes_add_count(&3, 2));
        assert_eq!(key_counts(&t), vec![(1, 1), (2, 1), (3, 1), (4, 3), (5, 3)]);
        assert_eq!(t.count(), 9);
        assert!(t.subtree_add_count(None, -5));
        assert!(t.iter().all(|n| n.count() == 1));
        assert_eq!(t.count(), 5);
        assert_eq!(t.subtree_sum(None, NodeField::Count), t.count());
        t.check_invariants().unwrap();
    }

    #[test]
    fn value_updates_leave_counts_alone() {
        let mut t = keyed(&[1, 2, 3]);
        assert!(t.subtree_update(None, |v| *v *= 10));
        assert!(t.all_greater_nodes_update(&2, |v| *v += 1));
        assert_eq!(t.values().copied().collect::<Vec<_>>(), vec![10, 20, 31]);
        assert_eq!(t.subtree_sum_by(None, |n| i64::from(*n.value())), 61);
    }

    #[test]
    fn custom_comparators_order_keys() {
        let mut rev = TreeMultimap::with_comparator(Reversed(NaturalOrder));
        let mut by_len = TreeMultimap::with_compare_fn(|a: &&str, b: &&str| a.len().cmp(&b.len()));
        for k in [3, 1, 2] {
            rev.add(k, ());
        }
        for k in ["ccc", "a", "bb", "zz"] {
            by_len.add(k, ());
        }
        assert_eq!(rev.keys().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(by_len.keys().copied().collect::<Vec<_>>(), vec!["a", "bb", "ccc"]);
        assert_eq!(by_len.count(), 4, "\"zz\" compares equal to \"bb\"");
        rev.check_invariants().unwrap();
    }

    #[test]
    fn clear_resets_everything() {
        let mut t = keyed(&[1, 2, 3]);
        t.add(2, 2);
        t.clear();
        assert_eq!((t.size(), t.count()), (0, 0));
        assert!(t.root().is_none());
        assert!(t.is_avl_balanced());
        t.check_invariants().unwrap();
    }

    #[test]
    fn debug_and_collect() {
        let t: TreeMultimap<i32, char> = [(2, 'b'), (1, 'a'), (2, 'x')].into_iter().collect();
        assert_eq!(format!("{t:?}"), "{1: ('a', 1), 2: ('b', 2)}");
    }

    #[test]
    fn invariant_check_detects_drifted_total() {
        let mut t = keyed(&[1, 2, 3]);
        t.total += 1;
        assert_eq!(
            t.check_invariants(),
            Err(InvariantViolation::Total {
                stored: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn invariant_check_detects_wrong_stored_height() {
        let mut t = keyed(&[1, 2, 3]);
        let root = t.root().unwrap();
        t.inner.inner.live_mut(root).payload.height = 5;
        assert_eq!(
            t.check_invariants(),
            Err(InvariantViolation::Height {
                node: root,
                stored: 5,
                actual: 1
            })
        );
    }

    #[test]
    fn overflowing_add_is_a_no_op() {
        let mut t = keyed(&[1, 2]);
        let huge = usize::MAX - 2;
        let one = t.add_with_count(1, 1, huge).unwrap();
        assert_eq!(t.count(), usize::MAX);
        assert!(t.add(1, 1).is_none());
        assert!(t.add(9, 9).is_none());
        assert!(!t.has(&9));
        assert_eq!(one.count(&t), Some(huge + 1));
        assert_eq!((t.size(), t.count()), (2, usize::MAX));

        // Count deltas stop where the total would overflow.
        assert!(t.all_greater_nodes_add_count(&1, 5));
        assert_eq!(t.count(), usize::MAX);
        t.check_invariants().unwrap();
    }

    #[test]
    fn lookup_callbacks_may_read_the_same_tree() {
        let t = keyed(&[1, 2, 3, 4, 5]);
        let found = t.get_by(&true, |n| t.has(&(*n.key() + 1)) && *n.key() == 2);
        assert_eq!(found.and_then(|id| id.key(&t).copied()), Some(2));
        let via_dfs = t.dfs_with(DfsOrder::In, |n| t.has(&(*n.key() + 1)));
        assert_eq!(via_dfs, vec![true, true, true, true, false]);
        let last = t.get_by(&None, |n| t.successor(n.id()));
        assert_eq!(last.and_then(|id| id.key(&t).copied()), Some(5));
    }
}

//! OrderedTree: BST layer over an arena of nodes with stable handles.
//!
//! Owns node storage, key order and the traversal primitives. It never
//! rebalances and never touches stored heights; `BalancedTree` does both
//! after every structural edit made here.

use crate::comparator::{Comparator, NaturalOrder};
use crate::config::{IterationType, TreeOptions};
use crate::error::InsertError;
use crate::node::{Arena, Node, NodeField, NodeId, NodeRef, NodeStore};
use crate::traversal::{self, DfsOrder};
use core::cmp::Ordering;
use core::marker::PhantomData;
use core::mem;

pub struct OrderedTree<K, V, C = NaturalOrder> {
    arena: Arena<K, V>,
    root: Option<NodeId>,
    comparator: C,
    iteration_type: IterationType,
    // Single-threaded: keep trees !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

/// Where a key lives, or where it would be linked.
enum Probe {
    Found(NodeId),
    Vacant {
        parent: Option<NodeId>,
        side: Ordering,
    },
}

fn probe<K, V, C: Comparator<K>>(
    arena: &Arena<K, V>,
    root: Option<NodeId>,
    comparator: &C,
    key: &K,
) -> Probe {
    let mut parent = None;
    let mut side = Ordering::Equal;
    let mut cur = root;
    while let Some(id) = cur {
        let node = &arena[id.raw_handle()];
        side = comparator.compare(key, &node.payload.key);
        match side {
            Ordering::Equal => return Probe::Found(id),
            Ordering::Less => cur = node.left,
            Ordering::Greater => cur = node.right,
        }
        parent = Some(id);
    }
    Probe::Vacant { parent, side }
}

impl<K: Ord, V> OrderedTree<K, V> {
    pub fn new() -> Self {
        Self::with_options(TreeOptions::default())
    }
}

impl<K: Ord, V> Default for OrderedTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> NodeStore<K, V> for OrderedTree<K, V, C> {
    fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.arena.get(id.raw_handle())
    }
}

impl<K, V, C> OrderedTree<K, V, C>
where
    C: Comparator<K>,
{
    pub fn with_options(options: TreeOptions<C>) -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            comparator: options.comparator,
            iteration_type: options.iteration_type,
            _nosend: PhantomData,
        }
    }

    /// Number of nodes (distinct keys).
    pub fn len(&self) -> usize {
        self.arena.len()
    }
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }
    pub fn comparator(&self) -> &C {
        &self.comparator
    }
    pub fn iteration_type(&self) -> IterationType {
        self.iteration_type
    }
    pub fn set_iteration_type(&mut self, iteration_type: IterationType) {
        self.iteration_type = iteration_type;
    }

    pub(crate) fn arena(&self) -> &Arena<K, V> {
        &self.arena
    }

    /// Keyed descent.
    pub fn get(&self, key: &K) -> Option<NodeId> {
        match probe(&self.arena, self.root, &self.comparator, key) {
            Probe::Found(id) => Some(id),
            Probe::Vacant { .. } => None,
        }
    }

    pub fn has(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Full traversal for the first node (in the configured in-order walk)
    /// whose projection equals `identifier`.
    pub fn get_by<I, F>(&self, identifier: &I, mut callback: F) -> Option<NodeId>
    where
        I: PartialEq,
        F: FnMut(NodeRef<'_, K, V>) -> I,
    {
        traversal::dfs(&self.arena, self.root, DfsOrder::In, self.iteration_type)
            .into_iter()
            .find(|&id| callback(NodeRef::new(id, &self.arena[id.raw_handle()])) == *identifier)
    }

    /// Link a new leaf holding `key`. Leaves heights and balance untouched.
    pub fn insert(&mut self, key: K, value: V, count: usize) -> Result<NodeId, InsertError> {
        let (parent, side) = match probe(&self.arena, self.root, &self.comparator, &key) {
            Probe::Found(id) => return Err(InsertError::DuplicateKey(id)),
            Probe::Vacant { parent, side } => (parent, side),
        };
        let mut node = Node::leaf(key, value, count);
        node.parent = parent;
        let id = NodeId::new(self.arena.insert(node));
        match parent {
            None => self.root = Some(id),
            Some(p) => {
                let p = &mut self.arena[p.raw_handle()];
                if side == Ordering::Less {
                    p.left = Some(id);
                } else {
                    p.right = Some(id);
                }
            }
        }
        Ok(id)
    }

    /// Structural removal by predecessor substitution. Returns the removed
    /// node and the lowest ancestor whose subtree lost a node.
    ///
    /// With a left child, the in-order predecessor's payload is relocated
    /// into `id`'s slot and the predecessor's slot is freed, so the returned
    /// node carries `id`'s original payload while `id` now names the
    /// predecessor's key.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<(Node<K, V>, Option<NodeId>)> {
        let node = self.arena.get(id.raw_handle())?;
        let (parent, left, right) = (node.parent, node.left, node.right);
        let Some(left) = left else {
            self.replace_child(parent, id, right);
            let removed = self.arena.remove(id.raw_handle())?;
            log::trace!("spliced out node without left child");
            return Some((removed, parent));
        };

        let pred = self.right_most_from(left);
        let pred_node = &self.arena[pred.raw_handle()];
        let (pred_parent, pred_left) = (pred_node.parent, pred_node.left);
        let pred_parent = pred_parent.unwrap_or(id);
        if pred_parent == id {
            self.arena[id.raw_handle()].left = pred_left;
        } else {
            self.arena[pred_parent.raw_handle()].right = pred_left;
        }
        if let Some(c) = pred_left {
            self.arena[c.raw_handle()].parent = Some(pred_parent);
        }

        let [target, source] = self
            .arena
            .get_disjoint_mut([id.raw_handle(), pred.raw_handle()])?;
        mem::swap(&mut target.payload, &mut source.payload);
        let removed = self.arena.remove(pred.raw_handle())?;
        log::trace!("removed node via predecessor substitution");
        Some((removed, Some(pred_parent)))
    }

    /// Point `parent`'s link that currently names `old` at `new` (or the root
    /// link when `parent` is `None`), and fix `new`'s back-reference.
    pub(crate) fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let p = &mut self.arena[p.raw_handle()];
                if p.left == Some(old) {
                    p.left = new;
                } else {
                    p.right = new;
                }
            }
        }
        if let Some(n) = new {
            self.arena[n.raw_handle()].parent = parent;
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        self.arena.get_mut(id.raw_handle())
    }

    pub(crate) fn live(&self, id: NodeId) -> &Node<K, V> {
        &self.arena[id.raw_handle()]
    }

    pub(crate) fn live_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.arena[id.raw_handle()]
    }

    /// Mutable access to a value; keys are immutable once linked.
    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut V> {
        self.node_mut(id).map(|n| &mut n.payload.value)
    }

    /// Discard every node.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }

    /// Drain all nodes as `(key, value, count)` in key order.
    pub(crate) fn drain_in_order(&mut self) -> Vec<(K, V, usize)> {
        let order = traversal::dfs(&self.arena, self.root, DfsOrder::In, self.iteration_type);
        let entries = order
            .into_iter()
            .filter_map(|id| self.arena.remove(id.raw_handle()))
            .map(Node::into_parts)
            .collect();
        self.clear();
        entries
    }

    fn left_most_from(&self, mut id: NodeId) -> NodeId {
        while let Some(l) = self.arena[id.raw_handle()].left {
            id = l;
        }
        id
    }

    fn right_most_from(&self, mut id: NodeId) -> NodeId {
        while let Some(r) = self.arena[id.raw_handle()].right {
            id = r;
        }
        id
    }

    /// Resolve an optional start handle: `None` means the root, a stale
    /// handle means an empty subtree.
    fn start(&self, start: Option<NodeId>) -> Option<NodeId> {
        match start {
            Some(id) => self.arena.contains_key(id.raw_handle()).then_some(id),
            None => self.root,
        }
    }

    /// Minimum of the subtree under `start` (default root).
    pub fn get_left_most(&self, start: Option<NodeId>) -> Option<NodeId> {
        self.start(start).map(|s| self.left_most_from(s))
    }

    /// Maximum of the subtree under `start` (default root).
    pub fn get_right_most(&self, start: Option<NodeId>) -> Option<NodeId> {
        self.start(start).map(|s| self.right_most_from(s))
    }

    /// In-order successor.
    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        let node = self.arena.get(id.raw_handle())?;
        if let Some(r) = node.right {
            return Some(self.left_most_from(r));
        }
        let (mut child, mut up) = (id, node.parent);
        while let Some(p) = up {
            let pn = &self.arena[p.raw_handle()];
            if pn.left == Some(child) {
                return Some(p);
            }
            child = p;
            up = pn.parent;
        }
        None
    }

    /// In-order predecessor.
    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        let node = self.arena.get(id.raw_handle())?;
        if let Some(l) = node.left {
            return Some(self.right_most_from(l));
        }
        let (mut child, mut up) = (id, node.parent);
        while let Some(p) = up {
            let pn = &self.arena[p.raw_handle()];
            if pn.right == Some(child) {
                return Some(p);
            }
            child = p;
            up = pn.parent;
        }
        None
    }

    /// Smallest node whose key compares greater than `key`.
    pub fn first_greater(&self, key: &K) -> Option<NodeId> {
        let mut best = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.arena[id.raw_handle()];
            if self.comparator.compare(key, &node.payload.key) == Ordering::Less {
                best = Some(id);
                cur = node.left;
            } else {
                cur = node.right;
            }
        }
        best
    }

    /// Every node greater than `key`, ascending, by successor steps.
    pub(crate) fn greater_nodes(&self, key: &K) -> Vec<NodeId> {
        core::iter::successors(self.first_greater(key), |&id| self.successor(id)).collect()
    }

    /// Height of the subtree under `start` (default root), recomputed from
    /// links. Empty is -1, a single node is 0.
    pub fn get_height(&self, start: Option<NodeId>) -> isize {
        traversal::subtree_height(&self.arena, self.start(start), self.iteration_type)
    }

    /// Shortest root-to-leaf path under `start` (default root).
    pub fn get_min_height(&self, start: Option<NodeId>) -> isize {
        traversal::subtree_min_height(&self.arena, self.start(start), self.iteration_type)
    }

    /// Edges between `start` (default root) and the root; `None` for a stale
    /// handle or an empty tree.
    pub fn get_depth(&self, start: Option<NodeId>) -> Option<usize> {
        let mut node = self.arena.get(self.start(start)?.raw_handle())?;
        let mut depth = 0;
        while let Some(p) = node.parent {
            node = &self.arena[p.raw_handle()];
            depth += 1;
        }
        Some(depth)
    }

    pub fn is_perfectly_balanced(&self) -> bool {
        self.get_min_height(None) + 1 >= self.get_height(None)
    }

    pub fn dfs(&self, order: DfsOrder) -> Vec<NodeId> {
        self.dfs_from(None, order)
    }

    /// Depth-first walk of the subtree under `start` (default root).
    pub fn dfs_from(&self, start: Option<NodeId>, order: DfsOrder) -> Vec<NodeId> {
        traversal::dfs(&self.arena, self.start(start), order, self.iteration_type)
    }

    pub fn dfs_with<R, F>(&self, order: DfsOrder, mut f: F) -> Vec<R>
    where
        F: FnMut(NodeRef<'_, K, V>) -> R,
    {
        self.dfs(order)
            .into_iter()
            .map(|id| f(NodeRef::new(id, self.live(id))))
            .collect()
    }

    pub fn bfs(&self) -> Vec<NodeId> {
        traversal::bfs(&self.arena, self.root)
    }

    pub fn bfs_with<R, F>(&self, mut f: F) -> Vec<R>
    where
        F: FnMut(NodeRef<'_, K, V>) -> R,
    {
        self.bfs()
            .into_iter()
            .map(|id| f(NodeRef::new(id, self.live(id))))
            .collect()
    }

    /// Sum of a numeric field over the subtree under `start` (default root).
    pub fn subtree_sum(&self, start: Option<NodeId>, field: NodeField) -> usize {
        self.dfs_from(start, DfsOrder::Pre)
            .into_iter()
            .map(|id| field.read(self.live(id)))
            .sum()
    }

    pub fn subtree_sum_by<F>(&self, start: Option<NodeId>, mut f: F) -> i64
    where
        F: FnMut(NodeRef<'_, K, V>) -> i64,
    {
        self.dfs_from(start, DfsOrder::Pre)
            .into_iter()
            .map(|id| f(NodeRef::new(id, self.live(id))))
            .sum()
    }

    /// Apply `f` to every value under `start` (default root). Returns false
    /// when there is nothing to update.
    pub fn subtree_update<F>(&mut self, start: Option<NodeId>, mut f: F) -> bool
    where
        F: FnMut(&mut V),
    {
        let ids = self.dfs_from(start, DfsOrder::Pre);
        for &id in &ids {
            f(&mut self.live_mut(id).payload.value);
        }
        !ids.is_empty()
    }

    /// Apply `f` to the value of every node greater than `key`.
    pub fn all_greater_nodes_update<F>(&mut self, key: &K, mut f: F) -> bool
    where
        F: FnMut(&mut V),
    {
        let ids = self.greater_nodes(key);
        for &id in &ids {
            f(&mut self.live_mut(id).payload.value);
        }
        !ids.is_empty()
    }

    /// Borrowing in-order iterator.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter {
            tree: self,
            next: self.get_left_most(None),
        }
    }
}

/// In-order iterator driven by successor steps.
pub struct Iter<'a, K, V, C> {
    tree: &'a OrderedTree<K, V, C>,
    next: Option<NodeId>,
}

impl<'a, K, V, C: Comparator<K>> Iterator for Iter<'a, K, V, C> {
    type Item = NodeRef<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.successor(id);
        Some(NodeRef::new(id, self.tree.live(id)))
    }
}

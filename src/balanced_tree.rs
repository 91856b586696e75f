//! BalancedTree: AVL height bookkeeping and rotations atop OrderedTree.
//!
//! Every structural edit goes through this layer, which walks from the point
//! of change to the root recomputing stored heights and rotating wherever
//! the balance factor leaves [-1, 1].

use crate::comparator::{Comparator, NaturalOrder};
use crate::config::TreeOptions;
use crate::error::InsertError;
use crate::node::{Node, NodeId, NodeStore};
use crate::ordered_tree::OrderedTree;
use crate::traversal;

pub struct BalancedTree<K, V, C = NaturalOrder> {
    pub(crate) inner: OrderedTree<K, V, C>,
}

/// Payload of a structurally removed node plus the ancestor the rebalance
/// pass started from.
pub(crate) struct Removal<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) count: usize,
    pub(crate) need_balanced: Option<NodeId>,
}

impl<K: Ord, V> BalancedTree<K, V> {
    pub fn new() -> Self {
        Self {
            inner: OrderedTree::new(),
        }
    }
}

impl<K: Ord, V> Default for BalancedTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> NodeStore<K, V> for BalancedTree<K, V, C> {
    fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.inner.node(id)
    }
}

impl<K, V, C> BalancedTree<K, V, C>
where
    C: Comparator<K>,
{
    pub fn with_options(options: TreeOptions<C>) -> Self {
        Self {
            inner: OrderedTree::with_options(options),
        }
    }

    /// Read-only view of the underlying BST.
    pub fn tree(&self) -> &OrderedTree<K, V, C> {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<NodeId> {
        self.inner.get(key)
    }

    pub fn insert(&mut self, key: K, value: V, count: usize) -> Result<NodeId, InsertError> {
        let id = self.inner.insert(key, value, count)?;
        self.balance_path(self.inner.live(id).parent);
        Ok(id)
    }

    /// Insert without rotations, only refreshing ancestor heights. Callers
    /// guarantee the final shape is balanced.
    pub(crate) fn insert_unrotated(
        &mut self,
        key: K,
        value: V,
        count: usize,
    ) -> Result<NodeId, InsertError> {
        let id = self.inner.insert(key, value, count)?;
        let mut cur = self.inner.live(id).parent;
        while let Some(c) = cur {
            self.update_height(c);
            cur = self.inner.live(c).parent;
        }
        Ok(id)
    }

    /// Structurally remove `id` and rebalance from the affected ancestor.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Removal<K, V>> {
        let (node, need_balanced) = self.inner.remove_node(id)?;
        self.balance_path(need_balanced);
        let (key, value, count) = node.into_parts();
        Some(Removal {
            key,
            value,
            count,
            need_balanced,
        })
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    fn height(&self, id: Option<NodeId>) -> isize {
        id.map_or(-1, |id| self.inner.live(id).payload.height as isize)
    }

    fn update_height(&mut self, id: NodeId) {
        let n = self.inner.live(id);
        let h = 1 + self.height(n.left).max(self.height(n.right));
        self.inner.live_mut(id).payload.height = h as usize;
    }

    /// Stored height(left) - height(right); 0 for a stale handle.
    pub fn balance_factor(&self, id: NodeId) -> isize {
        match self.inner.node(id) {
            Some(n) => self.height(n.left) - self.height(n.right),
            None => 0,
        }
    }

    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let Some(y) = self.inner.live(x).right else {
            return x;
        };
        let parent = self.inner.live(x).parent;
        let inner_child = self.inner.live(y).left;
        self.inner.live_mut(x).right = inner_child;
        if let Some(b) = inner_child {
            self.inner.live_mut(b).parent = Some(x);
        }
        self.inner.replace_child(parent, x, Some(y));
        self.inner.live_mut(y).left = Some(x);
        self.inner.live_mut(x).parent = Some(y);
        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_right(&mut self, x: NodeId) -> NodeId {
        let Some(y) = self.inner.live(x).left else {
            return x;
        };
        let parent = self.inner.live(x).parent;
        let inner_child = self.inner.live(y).right;
        self.inner.live_mut(x).left = inner_child;
        if let Some(b) = inner_child {
            self.inner.live_mut(b).parent = Some(x);
        }
        self.inner.replace_child(parent, x, Some(y));
        self.inner.live_mut(y).right = Some(x);
        self.inner.live_mut(x).parent = Some(y);
        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Restore balance at `id`; returns the root of the resulting subtree.
    fn rebalance_at(&mut self, id: NodeId) -> NodeId {
        let bf = self.balance_factor(id);
        let n = self.inner.live(id);
        match (bf, n.left, n.right) {
            (2.., Some(l), _) => {
                if self.balance_factor(l) < 0 {
                    log::trace!("left-right rotation");
                    self.rotate_left(l);
                } else {
                    log::trace!("right rotation");
                }
                self.rotate_right(id)
            }
            (..=-2, _, Some(r)) => {
                if self.balance_factor(r) > 0 {
                    log::trace!("right-left rotation");
                    self.rotate_right(r);
                } else {
                    log::trace!("left rotation");
                }
                self.rotate_left(id)
            }
            _ => id,
        }
    }

    /// Walk from `from` to the root, refreshing heights and rotating.
    pub(crate) fn balance_path(&mut self, from: Option<NodeId>) {
        let mut cur = from;
        while let Some(c) = cur {
            self.update_height(c);
            let top = self.rebalance_at(c);
            cur = self.inner.live(top).parent;
        }
    }

    /// Full scan recomputing heights from links; ignores stored heights and
    /// never mutates.
    pub fn is_avl_balanced(&self) -> bool {
        traversal::balanced_height(
            self.inner.arena(),
            self.inner.root(),
            self.inner.iteration_type(),
        )
        .is_some()
    }
}

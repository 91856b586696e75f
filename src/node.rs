//! Arena node storage: handles, payloads and read-only views.

use slotmap::{DefaultKey, SlotMap};

/// Stable, generational handle to a node slot. A handle to a removed node
/// never resolves again, even when its slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(DefaultKey);

impl NodeId {
    pub(crate) fn new(k: DefaultKey) -> Self {
        NodeId(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }

    pub fn key<'a, K: 'a, V: 'a, T>(&self, tree: &'a T) -> Option<&'a K>
    where
        T: NodeStore<K, V>,
    {
        tree.node(*self).map(|n| &n.payload.key)
    }

    pub fn value<'a, K: 'a, V: 'a, T>(&self, tree: &'a T) -> Option<&'a V>
    where
        T: NodeStore<K, V>,
    {
        tree.node(*self).map(|n| &n.payload.value)
    }

    pub fn count<K, V, T>(&self, tree: &T) -> Option<usize>
    where
        T: NodeStore<K, V>,
    {
        tree.node(*self).map(|n| n.payload.count)
    }

    pub fn height<K, V, T>(&self, tree: &T) -> Option<usize>
    where
        T: NodeStore<K, V>,
    {
        tree.node(*self).map(|n| n.payload.height)
    }
}

/// The relocatable part of a node. Predecessor substitution during deletion
/// swaps whole payloads between slots and edits links separately.
#[derive(Debug)]
pub(crate) struct Payload<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) count: usize,
    pub(crate) height: usize,
}

#[derive(Debug)]
pub struct Node<K, V> {
    pub(crate) payload: Payload<K, V>,
    pub(crate) parent: Option<NodeId>, // navigation only, never ownership
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn leaf(key: K, value: V, count: usize) -> Self {
        Self {
            payload: Payload {
                key,
                value,
                count,
                height: 0,
            },
            parent: None,
            left: None,
            right: None,
        }
    }

    pub(crate) fn into_parts(self) -> (K, V, usize) {
        (self.payload.key, self.payload.value, self.payload.count)
    }
}

pub(crate) type Arena<K, V> = SlotMap<DefaultKey, Node<K, V>>;

/// Read access to node storage, shared by every tree layer.
pub trait NodeStore<K, V> {
    #[doc(hidden)]
    fn node(&self, id: NodeId) -> Option<&Node<K, V>>;

    /// Borrowed view of a live node; `None` for stale handles.
    fn node_ref(&self, id: NodeId) -> Option<NodeRef<'_, K, V>> {
        self.node(id).map(|node| NodeRef { id, node })
    }
}

impl<K, V> NodeStore<K, V> for Arena<K, V> {
    fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.get(id.raw_handle())
    }
}

/// Read-only view of one node, handed to traversal projections and
/// identifier callbacks.
pub struct NodeRef<'a, K, V> {
    id: NodeId,
    node: &'a Node<K, V>,
}

impl<'a, K, V> Clone for NodeRef<'a, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, K, V> Copy for NodeRef<'a, K, V> {}

impl<'a, K, V> NodeRef<'a, K, V> {
    pub(crate) fn new(id: NodeId, node: &'a Node<K, V>) -> Self {
        Self { id, node }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
    pub fn key(&self) -> &'a K {
        &self.node.payload.key
    }
    pub fn value(&self) -> &'a V {
        &self.node.payload.value
    }
    pub fn count(&self) -> usize {
        self.node.payload.count
    }
    /// Stored height; a leaf has height 0.
    pub fn height(&self) -> usize {
        self.node.payload.height
    }
    pub fn parent(&self) -> Option<NodeId> {
        self.node.parent
    }
    pub fn left(&self) -> Option<NodeId> {
        self.node.left
    }
    pub fn right(&self) -> Option<NodeId> {
        self.node.right
    }
}

impl<'a, K: core::fmt::Debug, V: core::fmt::Debug> core::fmt::Debug for NodeRef<'a, K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("value", self.value())
            .field("count", &self.count())
            .field("height", &self.height())
            .finish()
    }
}

/// Numeric node fields that can be aggregated over a subtree.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NodeField {
    Count,
    Height,
}

impl NodeField {
    pub(crate) fn read<K, V>(self, node: &Node<K, V>) -> usize {
        match self {
            NodeField::Count => node.payload.count,
            NodeField::Height => node.payload.height,
        }
    }
}

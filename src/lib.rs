//! tree-multimap: an AVL-balanced ordered multimap that tracks how many
//! times each key was added.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build TreeMultimap in layers so balancing and multiplicity can
//!   each be reasoned about on their own.
//! - Layers:
//!   - OrderedTree<K, V, C>: BST over a slot arena; keyed descent,
//!     traversals, structural insert and predecessor-substitution removal.
//!     Never rotates.
//!   - BalancedTree<K, V, C>: wraps OrderedTree and restores AVL balance
//!     after every structural edit by walking to the root.
//!   - TreeMultimap<K, V, C>: wraps BalancedTree; per-key occurrence counts,
//!     the aggregate total, count-aware deletion and median rebuilds.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync`, no internal locking.
//! - Nodes live in a `slotmap` arena. Parent/left/right are generational
//!   `NodeId`s, so parent links are navigation only and never keep a node
//!   alive.
//! - Key order comes from an injected `Comparator` strategy instead of
//!   overridable methods.
//! - Heights: empty subtree is -1, a leaf is 0.
//!
//! Bookkeeping
//! - `size` is the arena length and cannot drift.
//! - `total` is adjusted in the same call as every count or structural
//!   change; `check_invariants` recomputes it by traversal.
//!
//! Callbacks
//! - Comparators and identifier callbacks only ever see `&` access, so they
//!   may read the tree they run inside; mutation needs `&mut` and is ruled
//!   out by the borrow checker.
//!
//! Absence
//! - Missing keys, stale handles and zero-count adds are ordinary outcomes
//!   (`None`, empty `Vec`, `false`), not errors.

pub mod balanced_tree;
pub mod comparator;
pub mod config;
pub mod error;
pub mod node;
pub mod ordered_tree;
pub mod traversal;
mod tree_multimap;
mod tree_multimap_proptest;

// Public surface
pub use comparator::{Comparator, FnComparator, NaturalOrder, Reversed};
pub use config::{IterationType, TreeOptions};
pub use error::{InsertError, InvariantViolation};
pub use node::{NodeField, NodeId, NodeRef, NodeStore};
pub use ordered_tree::Iter;
pub use traversal::DfsOrder;
pub use tree_multimap::{DeleteOutcome, Deleted, Entry, TreeMultimap};

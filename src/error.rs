//! Error types. Absence (missing keys, stale handles) is reported through
//! `Option` and empty results, never through these.

use crate::node::NodeId;
use thiserror::Error;

/// Structural insert refused by the BST layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// The key is already stored at the given node.
    #[error("key already present")]
    DuplicateKey(NodeId),
}

/// A broken tree invariant found by `check_invariants`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("in-order keys are not strictly increasing at {0:?}")]
    Order(NodeId),
    #[error("node {node:?} has balance factor {factor}")]
    Unbalanced { node: NodeId, factor: isize },
    #[error("node {node:?} stores height {stored}, actual {actual}")]
    Height {
        node: NodeId,
        stored: usize,
        actual: usize,
    },
    #[error("node {0:?} has a zero count")]
    ZeroCount(NodeId),
    #[error("node {0:?} is not linked back to its parent")]
    Link(NodeId),
    #[error("size is {stored}, but {actual} nodes are reachable")]
    Size { stored: usize, actual: usize },
    #[error("total is {stored}, but counts sum to {actual}")]
    Total { stored: usize, actual: usize },
}

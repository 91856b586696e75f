//! Traversal engine: depth-first walks in three orders, breadth-first walk,
//! and height scans. Every walk has a recursive and an explicit-stack variant
//! that yield identical sequences; `IterationType` picks one at runtime.

use crate::config::IterationType;
use crate::node::{Arena, NodeId};
use slotmap::SecondaryMap;
use std::collections::VecDeque;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DfsOrder {
    Pre,
    In,
    Post,
}

#[inline]
fn children<K, V>(arena: &Arena<K, V>, id: NodeId) -> (Option<NodeId>, Option<NodeId>) {
    let n = &arena[id.raw_handle()];
    (n.left, n.right)
}

/// Node handles of the subtree under `start` in the requested order.
/// A stale or absent `start` yields an empty sequence.
pub(crate) fn dfs<K, V>(
    arena: &Arena<K, V>,
    start: Option<NodeId>,
    order: DfsOrder,
    iteration: IterationType,
) -> Vec<NodeId> {
    let mut out = Vec::new();
    let Some(start) = start.filter(|s| arena.contains_key(s.raw_handle())) else {
        return out;
    };
    match iteration {
        IterationType::Recursive => dfs_recursive(arena, Some(start), order, &mut out),
        IterationType::Iterative => dfs_iterative(arena, start, order, &mut out),
    }
    out
}

fn dfs_recursive<K, V>(
    arena: &Arena<K, V>,
    cur: Option<NodeId>,
    order: DfsOrder,
    out: &mut Vec<NodeId>,
) {
    let Some(id) = cur else { return };
    let (left, right) = children(arena, id);
    match order {
        DfsOrder::Pre => {
            out.push(id);
            dfs_recursive(arena, left, order, out);
            dfs_recursive(arena, right, order, out);
        }
        DfsOrder::In => {
            dfs_recursive(arena, left, order, out);
            out.push(id);
            dfs_recursive(arena, right, order, out);
        }
        DfsOrder::Post => {
            dfs_recursive(arena, left, order, out);
            dfs_recursive(arena, right, order, out);
            out.push(id);
        }
    }
}

enum Step {
    Expand(NodeId),
    Emit(NodeId),
}

fn dfs_iterative<K, V>(arena: &Arena<K, V>, start: NodeId, order: DfsOrder, out: &mut Vec<NodeId>) {
    let mut stack = vec![Step::Expand(start)];
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Emit(id) => {
                out.push(id);
                continue;
            }
            Step::Expand(id) => id,
        };
        let (left, right) = children(arena, id);
        // Pushed in reverse of emission order.
        let push_child = |c: Option<NodeId>, stack: &mut Vec<Step>| {
            if let Some(c) = c {
                stack.push(Step::Expand(c));
            }
        };
        match order {
            DfsOrder::Pre => {
                push_child(right, &mut stack);
                push_child(left, &mut stack);
                stack.push(Step::Emit(id));
            }
            DfsOrder::In => {
                push_child(right, &mut stack);
                stack.push(Step::Emit(id));
                push_child(left, &mut stack);
            }
            DfsOrder::Post => {
                stack.push(Step::Emit(id));
                push_child(right, &mut stack);
                push_child(left, &mut stack);
            }
        }
    }
}

/// Level-order walk via an explicit queue.
pub(crate) fn bfs<K, V>(arena: &Arena<K, V>, start: Option<NodeId>) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut queue: VecDeque<NodeId> = start
        .filter(|s| arena.contains_key(s.raw_handle()))
        .into_iter()
        .collect();
    while let Some(id) = queue.pop_front() {
        out.push(id);
        let (left, right) = children(arena, id);
        queue.extend(left);
        queue.extend(right);
    }
    out
}

/// Height of the subtree under `start`, recomputed from links only.
/// Empty subtree is -1, a leaf is 0.
pub(crate) fn subtree_height<K, V>(
    arena: &Arena<K, V>,
    start: Option<NodeId>,
    iteration: IterationType,
) -> isize {
    fold_heights(arena, start, iteration, |l, r| l.max(r))
}

/// Length of the shortest root-to-leaf path, with the same conventions.
pub(crate) fn subtree_min_height<K, V>(
    arena: &Arena<K, V>,
    start: Option<NodeId>,
    iteration: IterationType,
) -> isize {
    fold_heights(arena, start, iteration, |l, r| match (l, r) {
        (-1, x) | (x, -1) => x,
        (l, r) => l.min(r),
    })
}

fn fold_heights<K, V, F>(
    arena: &Arena<K, V>,
    start: Option<NodeId>,
    iteration: IterationType,
    combine: F,
) -> isize
where
    F: Fn(isize, isize) -> isize + Copy,
{
    let Some(start) = start.filter(|s| arena.contains_key(s.raw_handle())) else {
        return -1;
    };
    match iteration {
        IterationType::Recursive => fold_recursive(arena, Some(start), combine),
        IterationType::Iterative => {
            let mut heights: SecondaryMap<_, isize> = SecondaryMap::new();
            let of = |h: &SecondaryMap<_, isize>, c: Option<NodeId>| {
                c.and_then(|c| h.get(c.raw_handle()).copied()).unwrap_or(-1)
            };
            for id in dfs(arena, Some(start), DfsOrder::Post, IterationType::Iterative) {
                let (left, right) = children(arena, id);
                let h = 1 + combine(of(&heights, left), of(&heights, right));
                heights.insert(id.raw_handle(), h);
            }
            heights[start.raw_handle()]
        }
    }
}

fn fold_recursive<K, V, F>(arena: &Arena<K, V>, cur: Option<NodeId>, combine: F) -> isize
where
    F: Fn(isize, isize) -> isize + Copy,
{
    let Some(id) = cur else { return -1 };
    let (left, right) = children(arena, id);
    1 + combine(
        fold_recursive(arena, left, combine),
        fold_recursive(arena, right, combine),
    )
}

/// Height of the subtree under `start` when every node in it satisfies the
/// AVL bound, `None` otherwise. Computed from links, never stored heights.
pub(crate) fn balanced_height<K, V>(
    arena: &Arena<K, V>,
    start: Option<NodeId>,
    iteration: IterationType,
) -> Option<isize> {
    let Some(start) = start.filter(|s| arena.contains_key(s.raw_handle())) else {
        return Some(-1);
    };
    match iteration {
        IterationType::Recursive => balanced_recursive(arena, Some(start)),
        IterationType::Iterative => {
            let mut heights: SecondaryMap<_, isize> = SecondaryMap::new();
            for id in dfs(arena, Some(start), DfsOrder::Post, IterationType::Iterative) {
                let (left, right) = children(arena, id);
                let l = left.map_or(-1, |c| heights[c.raw_handle()]);
                let r = right.map_or(-1, |c| heights[c.raw_handle()]);
                if (l - r).abs() > 1 {
                    return None;
                }
                heights.insert(id.raw_handle(), 1 + l.max(r));
            }
            heights.get(start.raw_handle()).copied()
        }
    }
}

fn balanced_recursive<K, V>(arena: &Arena<K, V>, cur: Option<NodeId>) -> Option<isize> {
    let Some(id) = cur else { return Some(-1) };
    let (left, right) = children(arena, id);
    let l = balanced_recursive(arena, left)?;
    let r = balanced_recursive(arena, right)?;
    ((l - r).abs() <= 1).then_some(1 + l.max(r))
}

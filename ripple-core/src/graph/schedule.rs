//! Schedule Construction
//!
//! A schedule is the ordered list of nodes one pass will update. Building it
//! takes two steps:
//!
//! 1. Collect the root and every descendant reachable through active nodes.
//!    An inactive node prunes itself and everything reachable only through
//!    it. A node reached through several paths is collected once.
//! 2. Sort the collected nodes by level. Since every edge goes from a lower
//!    level to a higher one, this puts each node after all of its ancestors.
//!
//! Collection uses an explicit work-list rather than recursion, so graph
//! depth is bounded by memory and not by the call stack.

use indexmap::IndexMap;
use tracing::trace;

use super::node::{NodeId, NodeRef};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;

/// Ordered, duplicate-free list of nodes to update in one pass.
#[derive(Debug, Default)]
pub struct Schedule {
    nodes: Vec<NodeRef>,
}

impl Schedule {
    /// Collect and order the nodes affected by a change of `root`.
    pub fn build(root: &NodeRef, config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        let mut nodes = collect_descendants(root, config)?;
        sort_by_level(&mut nodes);
        Ok(Self { nodes })
    }

    /// Number of scheduled nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Scheduled node IDs, in update order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|node| node.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeRef> {
        self.nodes.iter()
    }

    pub fn into_nodes(self) -> Vec<NodeRef> {
        self.nodes
    }
}

/// Collect `root` and its active descendants, each exactly once.
///
/// The result is in discovery order, which carries no meaning.
pub fn collect_descendants(
    root: &NodeRef,
    config: &SchedulerConfig,
) -> Result<Vec<NodeRef>, SchedulerError> {
    if !root.is_active() {
        trace!(node = %root.id(), "root is inactive, nothing to schedule");
        return Ok(Vec::new());
    }

    let mut visited: IndexMap<NodeId, NodeRef> = IndexMap::with_capacity(config.capacity_hint);
    let mut stack = vec![root.clone()];

    while let Some(node) = stack.pop() {
        let id = node.id();
        if visited.contains_key(&id) {
            continue;
        }

        let children = node.children();
        // Reverse so children are popped in declaration order.
        for child in children.iter().rev() {
            if !child.is_active() {
                trace!(parent = %id, child = %child.id(), "pruning inactive child");
                continue;
            }
            if config.verify_levels && child.level() <= node.level() {
                return Err(SchedulerError::LevelInversion {
                    parent: id,
                    parent_level: node.level(),
                    child: child.id(),
                    child_level: child.level(),
                });
            }
            if !visited.contains_key(&child.id()) {
                stack.push(child.clone());
            }
        }

        visited.insert(id, node);
    }

    Ok(visited.into_values().collect())
}

/// Order nodes by ascending level.
///
/// The sort is stable, so nodes of equal level keep their relative order.
pub fn sort_by_level(nodes: &mut [NodeRef]) {
    nodes.sort_by_key(|node| node.level());
}

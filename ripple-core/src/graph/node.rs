//! Graph Nodes
//!
//! This module defines the interface the scheduler needs from the nodes of a
//! dependency graph. The graph itself (values, recomputation, subscriptions)
//! belongs to the caller; the scheduler only reads a node's identity, level,
//! activity and children, and calls its update.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use super::pass::Continuation;

/// Unique identifier for a node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of one scheduling pass.
///
/// Ids are handed out by a [`Scheduler`](super::Scheduler) in strictly
/// increasing order, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx{}", self.0)
    }
}

/// Position of a node in topological order. Smaller is further upstream.
///
/// For every edge parent -> child the graph must guarantee
/// `parent.level() < child.level()`.
pub type Level = i64;

/// Shared handle to a node.
pub type NodeRef = Arc<dyn Node>;

/// Direct dependents of a node, in notification order.
pub type Children = SmallVec<[NodeRef; 4]>;

/// Error returned by a failing [`Node::update_state`].
pub type UpdateError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A node of the dependency graph as seen by the scheduler.
pub trait Node: Send + Sync {
    /// Identity used to deduplicate nodes reached through several paths.
    fn id(&self) -> NodeId;

    /// Topological level of this node.
    fn level(&self) -> Level;

    /// Whether this node, and through it its subtree, takes part in updates.
    fn is_active(&self) -> bool;

    /// Nodes that depend on this one.
    fn children(&self) -> Children;

    /// Recompute this node.
    ///
    /// The implementation must call [`Continuation::resume`] exactly once,
    /// after its new value is visible to its children. It may do so before
    /// returning, or later from any thread. Dropping `next` without resuming
    /// fails the pass.
    fn update_state(&self, next: Continuation) -> Result<(), UpdateError>;
}

impl fmt::Debug for dyn Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id())
            .field("level", &self.level())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn node_id_round_trips_raw_value() {
        let id = NodeId::from(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.to_string(), "#42");
    }

    #[test]
    fn transaction_ids_order_by_raw_value() {
        let earlier = TransactionId::new(3);
        let later = TransactionId::new(4);
        assert!(earlier < later);
        assert_eq!(later.to_string(), "tx4");
    }
}

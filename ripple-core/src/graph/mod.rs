//! Dependency Graph Scheduling
//!
//! This module implements the scheduling of updates across a dependency graph
//! owned by the caller.
//!
//! # Overview
//!
//! The dependency graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes represent reactive values or computations
//! - Edges point from a node to the nodes that depend on it (its children)
//! - Every node carries a level, strictly greater than the level of any of
//!   its parents
//!
//! When a node changes, the scheduler collects it and every active node
//! downstream of it, sorts them by level, and updates them one at a time.
//!
//! # Design Decisions
//!
//! 1. Nodes are reached through the [`Node`] trait, so the scheduler never
//!    owns or mutates topology.
//!
//! 2. Duplicates are removed with a visited set keyed by [`NodeId`]. The
//!    per-pass [`TransactionId`] is passed on to nodes but not used for
//!    deduplication.
//!
//! 3. Updates hand control back through a [`Continuation`], which lets a node
//!    finish its work asynchronously while the pass stays exclusive.

#[cfg(test)]
pub(crate) mod mock;
mod node;
mod pass;
mod schedule;
mod scheduler;

pub use node::{Children, Level, Node, NodeId, NodeRef, TransactionId, UpdateError};
pub use pass::{Continuation, PassHandle, PassOutcome, PassReport};
pub use schedule::{collect_descendants, sort_by_level, Schedule};
pub use scheduler::{Scheduler, SchedulerStatus};

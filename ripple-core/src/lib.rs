//! Ripple Core
//!
//! This crate provides the update scheduler of a reactive dependency graph.
//! Given a node whose value changed, it:
//!
//! - Collects every affected node, skipping inactive branches
//! - Orders them so no node updates before anything it depends on
//! - Updates each of them exactly once
//! - Refuses to start an overlapping pass while one is running
//!
//! The graph itself (values, recomputation, subscriptions) stays with the
//! caller, which exposes its nodes through the [`Node`] trait.
//!
//! # Architecture
//!
//! - `graph`: node interface, schedule construction and pass execution
//! - `config`: scheduler settings
//! - `error`: error types
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::{Scheduler, NodeRef};
//!
//! let scheduler = Scheduler::new();
//!
//! // `changed` is a node of your graph that was just written to.
//! let report = scheduler.schedule_and_run(&changed)?.wait()?;
//! println!("updated {} nodes", report.order.len());
//! ```

pub mod config;
pub mod error;
pub mod graph;

pub use config::SchedulerConfig;
pub use error::{ConfigError, SchedulerError};
pub use graph::{
    Children, Continuation, Level, Node, NodeId, NodeRef, PassHandle, PassOutcome, PassReport,
    Schedule, Scheduler, SchedulerStatus, TransactionId, UpdateError,
};

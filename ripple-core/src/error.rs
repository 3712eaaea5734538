//! Error types.

use thiserror::Error;

use crate::graph::{Level, NodeId, UpdateError};

/// Errors raised while scheduling or running a pass.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A pass was requested while another one is still running.
    #[error("Scheduler is running, avoid cascading updates")]
    Reentrant,

    /// A node's update failed. The rest of the pass was abandoned.
    #[error("update of node {node} (level {level}) failed")]
    NodeUpdate {
        node: NodeId,
        level: Level,
        #[source]
        source: UpdateError,
    },

    /// A node dropped its continuation without resuming the pass.
    #[error("node {node} dropped its continuation without resuming")]
    ContinuationDropped { node: NodeId },

    /// An edge does not go strictly downstream in level order.
    #[error(
        "level inversion: child {child} (level {child_level}) is not below \
         parent {parent} (level {parent_level})"
    )]
    LevelInversion {
        parent: NodeId,
        parent_level: Level,
        child: NodeId,
        child_level: Level,
    },

    /// The pass went away without reporting an outcome.
    #[error("pass was abandoned before reporting an outcome")]
    PassAbandoned,
}

impl SchedulerError {
    /// True for [`SchedulerError::Reentrant`].
    pub fn is_reentrant(&self) -> bool {
        matches!(self, Self::Reentrant)
    }
}

/// Errors raised while loading a [`SchedulerConfig`](crate::SchedulerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid scheduler config: {0}")]
    Json(#[from] serde_json::Error),
}

//! Update Scheduler
//!
//! The scheduler turns "this node changed" into an ordered run of updates
//! over every affected node.
//!
//! # Algorithm
//!
//! 1. Refuse to start if a pass is already running on this scheduler
//! 2. Mark the scheduler running and allocate a transaction id
//! 3. Collect the root and its active descendants, once each
//! 4. Sort them by level (dependencies before dependents)
//! 5. Update each node in order, waiting for its continuation before
//!    moving on
//! 6. Mark the scheduler idle again, whatever the outcome
//!
//! The running flag lives in the scheduler rather than in a global, so an
//! application holds one scheduler per graph and passes clones of it to
//! whatever needs to trigger updates.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug_span, info, warn};

use super::node::{NodeRef, TransactionId};
use super::pass::{Pass, PassHandle};
use super::schedule::Schedule;
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;

/// Lifecycle of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// No pass is running; a new one may start.
    Idle,

    /// A pass is running, possibly suspended on a node's continuation.
    Running,
}

struct SchedulerInner {
    config: SchedulerConfig,
    running: AtomicBool,
    last_transaction: AtomicU64,
}

/// Marks its scheduler as running for as long as it is alive.
pub(crate) struct RunningGuard {
    inner: Arc<SchedulerInner>,
}

impl RunningGuard {
    fn acquire(inner: &Arc<SchedulerInner>) -> Result<Self, SchedulerError> {
        inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SchedulerError::Reentrant)?;
        Ok(Self {
            inner: Arc::clone(inner),
        })
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.inner.running.store(false, Ordering::Release);
    }
}

/// Schedules and runs update passes over a dependency graph.
///
/// Cloning is cheap and every clone shares the same running flag and
/// transaction counter.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// Create a scheduler with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a scheduler with the given configuration.
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                config,
                running: AtomicBool::new(false),
                last_transaction: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Current lifecycle state.
    pub fn status(&self) -> SchedulerStatus {
        if self.is_running() {
            SchedulerStatus::Running
        } else {
            SchedulerStatus::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Id of the most recently started pass, if any.
    pub fn last_transaction_id(&self) -> Option<TransactionId> {
        match self.inner.last_transaction.load(Ordering::Acquire) {
            0 => None,
            raw => Some(TransactionId::new(raw)),
        }
    }

    /// Compute the schedule a change of `root` would run, without running it.
    pub fn schedule(&self, root: &NodeRef) -> Result<Schedule, SchedulerError> {
        Schedule::build(root, &self.inner.config)
    }

    /// Update `root` and every active node downstream of it, in level order.
    ///
    /// Fails with [`SchedulerError::Reentrant`] without doing any work if a
    /// pass is already running, including one suspended on an asynchronous
    /// node. Failures that happen before the first suspension are returned
    /// here; later ones are reported through the returned handle.
    pub fn schedule_and_run(&self, root: &NodeRef) -> Result<PassHandle, SchedulerError> {
        let guard = RunningGuard::acquire(&self.inner).inspect_err(|_| {
            warn!(root = %root.id(), "rejected cascading update while a pass is running");
        })?;

        let transaction_id =
            TransactionId::new(self.inner.last_transaction.fetch_add(1, Ordering::AcqRel) + 1);
        let span = debug_span!("pass", transaction = %transaction_id, root = %root.id());
        let _entered = span.enter();

        let schedule = Schedule::build(root, &self.inner.config)?;
        info!(nodes = schedule.len(), "pass started");

        Pass::start(transaction_id, schedule.into_nodes(), guard)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("status", &self.status())
            .field("last_transaction_id", &self.last_transaction_id())
            .field("config", &self.inner.config)
            .finish()
    }
}

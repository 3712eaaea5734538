//! Pass Execution
//!
//! A pass walks its schedule one node at a time. Each node receives a
//! [`Continuation`] and hands control back by calling
//! [`Continuation::resume`].
//!
//! # Dispatch Loop
//!
//! The driver is a plain loop, not a chain of nested callbacks:
//!
//! - If a node resumes before `update_state` returns, the driver notices
//!   after the call and moves on to the next node.
//! - If `update_state` returns first, the pass is suspended. It still holds
//!   the scheduler's running guard. The eventual `resume()` call picks the
//!   loop up again on whatever thread it happens on.
//!
//! The pass state lock is never held while a node runs, so a node may resume
//! from inside its own update or from another thread without deadlocking.
//!
//! # Contract Violations
//!
//! `resume` takes the continuation by value, so it cannot run twice. A
//! continuation dropped without resuming ends the pass with
//! [`SchedulerError::ContinuationDropped`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::node::{NodeId, NodeRef, TransactionId};
use super::scheduler::RunningGuard;
use crate::error::SchedulerError;

/// Outcome of a pass, delivered through its [`PassHandle`].
pub type PassOutcome = Result<PassReport, SchedulerError>;

/// Summary of a completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Id of the pass.
    pub transaction_id: TransactionId,
    /// Nodes that were updated, in update order.
    pub order: Vec<NodeId>,
}

/// Where the dispatch loop stands with respect to the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Between nodes.
    Idle,
    /// `update_state` is on the stack and has not resumed yet.
    Dispatching,
    /// The node resumed while `update_state` was still on the stack.
    Resumed,
    /// The node dropped its continuation while `update_state` was on the stack.
    Dropped,
    /// `update_state` returned without resuming; waiting for `resume()`.
    Suspended,
    /// Outcome delivered, guard released.
    Finished,
}

struct PassState {
    schedule: Vec<NodeRef>,
    cursor: usize,
    step: Step,
    guard: Option<RunningGuard>,
    completion: Option<oneshot::Sender<PassOutcome>>,
}

impl PassState {
    fn finish(&mut self, transaction_id: TransactionId, outcome: PassOutcome) {
        self.step = Step::Finished;
        match &outcome {
            Ok(report) => info!(
                transaction = %transaction_id,
                updated = report.order.len(),
                "pass completed"
            ),
            Err(err) => warn!(
                transaction = %transaction_id,
                updated = self.cursor,
                remaining = self.schedule.len().saturating_sub(self.cursor),
                error = %err,
                "pass abandoned"
            ),
        }

        // Release before reporting so whoever waits on the outcome already
        // sees an idle scheduler.
        drop(self.guard.take());
        if let Some(completion) = self.completion.take() {
            let _ = completion.send(outcome);
        }
    }
}

/// Shared state of one running pass.
pub(crate) struct Pass {
    transaction_id: TransactionId,
    state: Mutex<PassState>,
}

impl Pass {
    /// Start a pass over `schedule`.
    ///
    /// Runs nodes until the schedule is exhausted, a node fails, or a node
    /// suspends. A failure before the first suspension is returned here;
    /// anything later is reported through the handle.
    pub(crate) fn start(
        transaction_id: TransactionId,
        schedule: Vec<NodeRef>,
        guard: RunningGuard,
    ) -> Result<PassHandle, SchedulerError> {
        let (sender, receiver) = oneshot::channel();
        let pass = Arc::new(Self {
            transaction_id,
            state: Mutex::new(PassState {
                schedule,
                cursor: 0,
                step: Step::Idle,
                guard: Some(guard),
                completion: Some(sender),
            }),
        });

        let progress = drive(&pass);

        let mut handle = PassHandle {
            transaction_id,
            ready: None,
            receiver,
        };
        if progress == Progress::Finished {
            if let Some(err) = handle.take_error() {
                return Err(err);
            }
        }
        Ok(handle)
    }

    fn report(&self, state: &PassState) -> PassReport {
        PassReport {
            transaction_id: self.transaction_id,
            order: state.schedule.iter().map(|node| node.id()).collect(),
        }
    }
}

/// How far one call to [`drive`] got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Finished,
    Suspended,
}

/// Run nodes from the cursor until the pass finishes or suspends.
fn drive(pass: &Arc<Pass>) -> Progress {
    loop {
        let (node, next) = {
            let mut state = pass.state.lock();
            if state.step == Step::Finished {
                return Progress::Finished;
            }
            let Some(node) = state.schedule.get(state.cursor).cloned() else {
                let report = pass.report(&state);
                state.finish(pass.transaction_id, Ok(report));
                return Progress::Finished;
            };
            state.step = Step::Dispatching;
            let next = Continuation {
                pass: Arc::clone(pass),
                index: state.cursor,
                node: node.id(),
                resumed: false,
            };
            (node, next)
        };

        debug!(
            transaction = %pass.transaction_id,
            node = %node.id(),
            level = node.level(),
            "updating node"
        );
        let result = node.update_state(next);

        let mut state = pass.state.lock();
        match (result, state.step) {
            (_, Step::Finished) => return Progress::Finished,
            (Err(source), _) => {
                let err = SchedulerError::NodeUpdate {
                    node: node.id(),
                    level: node.level(),
                    source,
                };
                state.finish(pass.transaction_id, Err(err));
                return Progress::Finished;
            }
            (Ok(()), Step::Resumed) => {
                state.cursor += 1;
                state.step = Step::Idle;
            }
            (Ok(()), Step::Dropped) => {
                let err = SchedulerError::ContinuationDropped { node: node.id() };
                state.finish(pass.transaction_id, Err(err));
                return Progress::Finished;
            }
            (Ok(()), Step::Dispatching | Step::Idle | Step::Suspended) => {
                debug!(
                    transaction = %pass.transaction_id,
                    node = %node.id(),
                    "pass suspended until node resumes"
                );
                state.step = Step::Suspended;
                return Progress::Suspended;
            }
        }
    }
}

/// One-shot handle a node uses to hand control back to its pass.
pub struct Continuation {
    pass: Arc<Pass>,
    index: usize,
    node: NodeId,
    resumed: bool,
}

impl Continuation {
    /// Id of the pass this continuation belongs to.
    pub fn transaction_id(&self) -> TransactionId {
        self.pass.transaction_id
    }

    /// The node being updated.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Signal that the node's update is complete.
    ///
    /// Called from inside `update_state`, this only marks the node as done
    /// and the driver continues once `update_state` returns. Called later,
    /// it runs the rest of the pass on the calling thread.
    pub fn resume(mut self) {
        self.resumed = true;

        let drive_now = {
            let mut state = self.pass.state.lock();
            if state.cursor != self.index || state.step == Step::Finished {
                warn!(
                    transaction = %self.pass.transaction_id,
                    node = %self.node,
                    "ignoring resume of a pass that has moved on"
                );
                false
            } else {
                match state.step {
                    Step::Dispatching => {
                        state.step = Step::Resumed;
                        false
                    }
                    Step::Suspended => {
                        state.cursor += 1;
                        state.step = Step::Idle;
                        true
                    }
                    _ => false,
                }
            }
        };

        if drive_now {
            debug!(
                transaction = %self.pass.transaction_id,
                node = %self.node,
                "pass resumed"
            );
            drive(&self.pass);
        }
    }
}

impl Drop for Continuation {
    fn drop(&mut self) {
        if self.resumed {
            return;
        }

        let mut state = self.pass.state.lock();
        if state.cursor != self.index {
            return;
        }
        match state.step {
            // `update_state` is still on the stack, possibly on another
            // thread, so the pass must stay exclusive. The driver decides
            // between this and an error returned by the node; if the
            // dispatching thread unwinds instead, dropping the pass releases
            // the guard.
            Step::Dispatching => state.step = Step::Dropped,
            Step::Suspended => {
                let err = SchedulerError::ContinuationDropped { node: self.node };
                state.finish(self.pass.transaction_id, Err(err));
            }
            _ => {}
        }
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("transaction_id", &self.pass.transaction_id)
            .field("node", &self.node)
            .field("index", &self.index)
            .finish()
    }
}

/// Handle to the outcome of a pass.
///
/// A pass whose nodes all resume synchronously is finished by the time the
/// handle is returned. Otherwise the outcome arrives once the last node
/// resumes.
#[derive(Debug)]
pub struct PassHandle {
    transaction_id: TransactionId,
    ready: Option<PassOutcome>,
    receiver: oneshot::Receiver<PassOutcome>,
}

impl PassHandle {
    /// Id of the pass.
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// Whether the outcome is available.
    pub fn is_finished(&mut self) -> bool {
        self.poll_ready();
        self.ready.is_some()
    }

    /// Take the outcome if the pass has finished.
    pub fn try_outcome(&mut self) -> Option<PassOutcome> {
        self.poll_ready();
        self.ready.take()
    }

    /// Wait for the outcome asynchronously.
    pub async fn finished(self) -> PassOutcome {
        match self.ready {
            Some(outcome) => outcome,
            None => self
                .receiver
                .await
                .unwrap_or(Err(SchedulerError::PassAbandoned)),
        }
    }

    /// Block the current thread until the outcome is available.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context; use
    /// [`PassHandle::finished`] there.
    pub fn wait(self) -> PassOutcome {
        match self.ready {
            Some(outcome) => outcome,
            None => self
                .receiver
                .blocking_recv()
                .unwrap_or(Err(SchedulerError::PassAbandoned)),
        }
    }

    /// Take the outcome only if it is a failure.
    pub(crate) fn take_error(&mut self) -> Option<SchedulerError> {
        self.poll_ready();
        match self.ready.take() {
            Some(Err(err)) => Some(err),
            other => {
                self.ready = other;
                None
            }
        }
    }

    fn poll_ready(&mut self) {
        if self.ready.is_some() {
            return;
        }
        match self.receiver.try_recv() {
            Ok(outcome) => self.ready = Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.ready = Some(Err(SchedulerError::PassAbandoned));
            }
        }
    }
}

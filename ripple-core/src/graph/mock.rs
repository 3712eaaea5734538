//! In-memory nodes for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::node::{Children, Level, Node, NodeId, NodeRef, UpdateError};
use super::pass::Continuation;

type UpdateHook = Box<dyn FnMut(Continuation) -> Result<(), UpdateError> + Send>;

/// Owns every node it creates so that long chains are dropped iteratively.
pub(crate) struct MockGraph {
    nodes: Mutex<Vec<Arc<MockNode>>>,
    log: Arc<Mutex<Vec<NodeId>>>,
}

impl MockGraph {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Mutex::new(Vec::new()),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn node(&self, level: Level) -> Arc<MockNode> {
        let node = Arc::new(MockNode {
            id: NodeId::new(),
            level,
            active: AtomicBool::new(true),
            children: Mutex::new(Vec::new()),
            updates: AtomicUsize::new(0),
            log: Arc::clone(&self.log),
            on_update: Mutex::new(None),
        });
        self.nodes.lock().push(Arc::clone(&node));
        node
    }

    /// IDs of updated nodes, in update order.
    pub(crate) fn log(&self) -> Vec<NodeId> {
        self.log.lock().clone()
    }
}

pub(crate) struct MockNode {
    id: NodeId,
    level: Level,
    active: AtomicBool,
    children: Mutex<Vec<NodeRef>>,
    updates: AtomicUsize,
    log: Arc<Mutex<Vec<NodeId>>>,
    on_update: Mutex<Option<UpdateHook>>,
}

impl MockNode {
    pub(crate) fn node_ref(self: &Arc<Self>) -> NodeRef {
        Arc::clone(self) as NodeRef
    }

    pub(crate) fn link(&self, child: &Arc<MockNode>) {
        self.children.lock().push(child.node_ref());
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub(crate) fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Replace the default "resume immediately" behaviour.
    pub(crate) fn on_update<F>(&self, hook: F)
    where
        F: FnMut(Continuation) -> Result<(), UpdateError> + Send + 'static,
    {
        *self.on_update.lock() = Some(Box::new(hook));
    }
}

impl Node for MockNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn level(&self) -> Level {
        self.level
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn children(&self) -> Children {
        self.children.lock().iter().cloned().collect()
    }

    fn update_state(&self, next: Continuation) -> Result<(), UpdateError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(self.id);

        let mut hook = self.on_update.lock();
        match hook.as_mut() {
            Some(hook) => hook(next),
            None => {
                next.resume();
                Ok(())
            }
        }
    }
}

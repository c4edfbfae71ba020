//! Headless host document
//!
//! [`MemoryHost`] implements [`Host`] without a real document. It keeps the
//! installed dispatchers per (node, event name), counts attach and detach
//! calls, and delivers payloads the way a browser event loop would. Useful
//! for tests and for driving the core outside a browser.

use std::cell::{Cell, RefCell};

use rustc_hash::FxHashSet;

use crate::host::{Dispatcher, Host, HostError};
use crate::raw::RawEvent;

/// Node identity inside a [`MemoryHost`]
pub type NodeId = u64;

/// Token for one installed listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryListener(u64);

struct Installed {
    token: MemoryListener,
    node: NodeId,
    event_name: String,
    dispatcher: Dispatcher,
}

#[derive(Default)]
pub struct MemoryHost {
    next_token: Cell<u64>,
    installed: RefCell<Vec<Installed>>,
    rejected: RefCell<FxHashSet<String>>,
    removed_nodes: RefCell<FxHashSet<NodeId>>,
    attaches: Cell<usize>,
    detaches: Cell<usize>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every future attachment for `event_name`
    pub fn reject(&self, event_name: impl Into<String>) {
        self.rejected.borrow_mut().insert(event_name.into());
    }

    /// Mark a node as removed from the document; attaching to it fails
    pub fn remove_node(&self, node: NodeId) {
        self.removed_nodes.borrow_mut().insert(node);
    }

    /// Number of live listeners for (node, event name)
    pub fn live_listeners(&self, node: &NodeId, event_name: &str) -> usize {
        self.installed
            .borrow()
            .iter()
            .filter(|l| l.node == *node && l.event_name == event_name)
            .count()
    }

    /// Number of live listeners across every node and event name
    pub fn total_live_listeners(&self) -> usize {
        self.installed.borrow().len()
    }

    pub fn attach_count(&self) -> usize {
        self.attaches.get()
    }

    pub fn detach_count(&self) -> usize {
        self.detaches.get()
    }

    /// Deliver a native event to every listener installed for (node, event name)
    ///
    /// Returns the number of native listeners invoked. Listeners installed or
    /// removed while delivering do not affect this delivery.
    pub fn deliver(&self, node: NodeId, event_name: &str, raw: Option<&RawEvent>) -> usize {
        let dispatchers: Vec<Dispatcher> = self
            .installed
            .borrow()
            .iter()
            .filter(|l| l.node == node && l.event_name == event_name)
            .map(|l| l.dispatcher.clone())
            .collect();

        tracing::trace!(node, event = event_name, listeners = dispatchers.len(), "delivering");
        for dispatcher in &dispatchers {
            dispatcher(raw);
        }
        dispatchers.len()
    }
}

impl Host for MemoryHost {
    type Target = NodeId;
    type Listener = MemoryListener;

    fn attach(
        &self,
        target: &NodeId,
        event_name: &str,
        dispatcher: Dispatcher,
    ) -> Result<MemoryListener, HostError> {
        if self.removed_nodes.borrow().contains(target) {
            return Err(HostError::TargetGone);
        }
        if self.rejected.borrow().contains(event_name) {
            return Err(HostError::Rejected(format!("`{event_name}` is blocked")));
        }

        let token = MemoryListener(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.attaches.set(self.attaches.get() + 1);
        self.installed.borrow_mut().push(Installed {
            token,
            node: *target,
            event_name: event_name.to_string(),
            dispatcher,
        });
        Ok(token)
    }

    fn detach(&self, target: &NodeId, event_name: &str, listener: MemoryListener) {
        let mut installed = self.installed.borrow_mut();
        let before = installed.len();
        installed.retain(|l| l.token != listener);
        if installed.len() == before {
            tracing::warn!(node = *target, event = event_name, "detach of unknown listener");
            return;
        }
        self.detaches.set(self.detaches.get() + 1);
    }
}

//! Event registry
//!
//! Every event-capable target owns one [`EventRegistry`]. For each event name
//! it keeps a handler chain: the ordered handlers plus the single native
//! subscription they share. The subscription is attached when the chain gains
//! its first handler and released when it loses its last one, or when the
//! registry shuts down.
//!
//! ```ignore
//! let registry = EventRegistry::new(host.clone(), node);
//! let id = registry.register_handler("click", |event| {
//!     if let Some(mouse) = event.mouse() {
//!         println!("clicked at {}, {}", mouse.client_x, mouse.client_y);
//!     }
//! })?;
//! registry.unregister_handler("click", id);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::catalog::EventCatalog;
use crate::decode::decode;
use crate::error::{EventError, Result};
use crate::events::{EventKind, TypedEvent};
use crate::host::{Dispatcher, Host, HostError};
use crate::raw::RawEvent;
use crate::subscription::NativeSubscription;

new_key_type! {
    struct HandlerKey;
}

static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(1);

/// Identifies one registered handler
///
/// Only the registry that issued an id will accept it back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId {
    registry: u64,
    key: HandlerKey,
}

/// Application-level event handler
pub type Handler = Rc<dyn Fn(&TypedEvent)>;

struct HandlerEntry {
    key: HandlerKey,
    handler: Handler,
}

type SharedHandlers = Rc<RefCell<SmallVec<[HandlerEntry; 2]>>>;

/// Ordered handlers for one event name and their shared native subscription
///
/// Invariant: `subscription` is `Some` exactly when `handlers` is non-empty.
pub(crate) struct HandlerChain<H: Host> {
    event_name: String,
    kind: EventKind,
    handlers: SharedHandlers,
    subscription: Option<NativeSubscription<H>>,
}

impl<H: Host> HandlerChain<H> {
    fn new(event_name: &str, kind: EventKind) -> Self {
        Self {
            event_name: event_name.to_string(),
            kind,
            handlers: Rc::new(RefCell::new(SmallVec::new())),
            subscription: None,
        }
    }

    fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    fn is_attached(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|sub| !sub.is_released())
    }

    /// The closure installed in the host. It holds the handler list weakly so
    /// a host that keeps it past release cannot keep handlers alive.
    fn dispatcher(&self) -> Dispatcher {
        let handlers = Rc::downgrade(&self.handlers);
        let kind = self.kind;
        let event_name = self.event_name.clone();
        Rc::new(move |raw: Option<&RawEvent>| {
            dispatch(&handlers, kind, &event_name, raw);
        })
    }

    fn push(
        &mut self,
        key: HandlerKey,
        handler: Handler,
        host: &Rc<H>,
        target: &H::Target,
    ) -> std::result::Result<(), HostError> {
        if self.subscription.is_none() {
            let subscription = NativeSubscription::attach(
                host.clone(),
                target.clone(),
                self.event_name.as_str(),
                self.dispatcher(),
            )?;
            self.subscription = Some(subscription);
        }
        self.handlers.borrow_mut().push(HandlerEntry { key, handler });
        Ok(())
    }

    /// Remove a handler and hand it back, releasing the subscription when
    /// the chain runs empty
    fn remove(&mut self, key: HandlerKey) -> Option<Handler> {
        let removed = {
            let mut handlers = self.handlers.borrow_mut();
            let index = handlers.iter().position(|entry| entry.key == key)?;
            handlers.remove(index).handler
        };
        if self.is_empty() {
            self.release();
        }
        Some(removed)
    }

    fn release(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.release();
        }
    }
}

impl<H: Host> fmt::Debug for HandlerChain<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("event_name", &self.event_name)
            .field("kind", &self.kind)
            .field("handlers", &self.len())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Decode once, then run every handler in registration order
///
/// Handlers run from a snapshot, so they may register or unregister handlers
/// (including themselves) without disturbing the current delivery.
fn dispatch(
    handlers: &Weak<RefCell<SmallVec<[HandlerEntry; 2]>>>,
    kind: EventKind,
    event_name: &str,
    raw: Option<&RawEvent>,
) -> usize {
    let Some(handlers) = handlers.upgrade() else {
        tracing::warn!(event = event_name, "delivery to a dropped handler chain");
        return 0;
    };

    let snapshot: SmallVec<[Handler; 4]> = handlers
        .borrow()
        .iter()
        .map(|entry| entry.handler.clone())
        .collect();
    if snapshot.is_empty() {
        return 0;
    }

    let event = decode(kind, raw);
    tracing::trace!(
        event = event_name,
        handlers = snapshot.len(),
        synthetic = raw.is_none(),
        "dispatching"
    );
    for handler in &snapshot {
        handler(&event);
    }
    snapshot.len()
}

/// Per-target map from event name to its handler chain
pub struct EventRegistry<H: Host> {
    id: u64,
    host: Rc<H>,
    target: H::Target,
    catalog: Rc<EventCatalog>,
    chains: RefCell<FxHashMap<String, HandlerChain<H>>>,
    /// Handler key -> event name it was registered under
    handlers: RefCell<SlotMap<HandlerKey, String>>,
}

impl<H: Host> EventRegistry<H> {
    /// Registry for `target` resolving names through the built-in catalog
    pub fn new(host: Rc<H>, target: H::Target) -> Self {
        Self::with_catalog(host, target, Rc::new(EventCatalog::builtin()))
    }

    pub fn with_catalog(host: Rc<H>, target: H::Target, catalog: Rc<EventCatalog>) -> Self {
        Self {
            id: NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed),
            host,
            target,
            catalog,
            chains: RefCell::new(FxHashMap::default()),
            handlers: RefCell::new(SlotMap::with_key()),
        }
    }

    pub fn target(&self) -> &H::Target {
        &self.target
    }

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// Append a handler to the chain for `event_name`
    ///
    /// The first handler of a chain installs the native dispatcher; later
    /// ones share it. Fails if the name has no event kind or the host refuses
    /// the listener, in which case nothing is registered.
    pub fn register_handler<F>(&self, event_name: &str, handler: F) -> Result<HandlerId>
    where
        F: Fn(&TypedEvent) + 'static,
    {
        self.register_shared(event_name, Rc::new(handler))
    }

    /// Like [`register_handler`](Self::register_handler) for an already shared handler
    pub fn register_shared(&self, event_name: &str, handler: Handler) -> Result<HandlerId> {
        let kind = self.catalog.resolve(event_name)?;
        let key = self.handlers.borrow_mut().insert(event_name.to_string());

        let pushed = {
            let mut chains = self.chains.borrow_mut();
            let chain = chains
                .entry(event_name.to_string())
                .or_insert_with(|| HandlerChain::new(event_name, kind));
            let pushed = chain.push(key, handler, &self.host, &self.target);
            if pushed.is_err() && chain.is_empty() {
                chains.remove(event_name);
            }
            pushed
        };

        if let Err(source) = pushed {
            self.handlers.borrow_mut().remove(key);
            return Err(EventError::Attach {
                event_name: event_name.to_string(),
                source,
            });
        }
        Ok(HandlerId {
            registry: self.id,
            key,
        })
    }

    /// Remove a handler; returns whether this registry issued `id` under
    /// `event_name`
    ///
    /// Removing the last handler of a chain releases its native subscription.
    pub fn unregister_handler(&self, event_name: &str, id: HandlerId) -> bool {
        if id.registry != self.id {
            tracing::trace!(event = event_name, "handler id from another registry ignored");
            return false;
        }
        let registered = self
            .handlers
            .borrow()
            .get(id.key)
            .is_some_and(|name| name == event_name);
        if !registered {
            return false;
        }
        self.handlers.borrow_mut().remove(id.key);

        // Handlers may own values whose destructors reach back into this
        // registry, so they are dropped after the borrow ends.
        let (handler, emptied) = {
            let mut chains = self.chains.borrow_mut();
            let Some(chain) = chains.get_mut(event_name) else {
                return false;
            };
            let Some(handler) = chain.remove(id.key) else {
                return false;
            };
            let emptied = if chain.is_empty() {
                chains.remove(event_name)
            } else {
                None
            };
            (handler, emptied)
        };
        drop(emptied);
        drop(handler);
        true
    }

    /// Release every native subscription and drop every handler
    ///
    /// Safe to call more than once. The registry stays usable; a later
    /// registration attaches again.
    pub fn shutdown(&self) {
        let chains = std::mem::take(&mut *self.chains.borrow_mut());
        self.handlers.borrow_mut().clear();
        if chains.is_empty() {
            return;
        }

        tracing::debug!(
            node = ?self.target,
            chains = chains.len(),
            "shutting down event registry"
        );
        for (_, mut chain) in chains {
            chain.release();
        }
    }

    /// Run the handlers for `event_name` as if the host had delivered it
    ///
    /// A `None` payload decodes to a default-filled event. Returns the
    /// number of handlers invoked.
    pub fn fire(&self, event_name: &str, raw: Option<&RawEvent>) -> usize {
        let chain = {
            let chains = self.chains.borrow();
            chains
                .get(event_name)
                .map(|chain| (Rc::downgrade(&chain.handlers), chain.kind))
        };
        match chain {
            Some((handlers, kind)) => dispatch(&handlers, kind, event_name, raw),
            None => 0,
        }
    }

    /// Number of handlers registered for `event_name`
    pub fn handler_count(&self, event_name: &str) -> usize {
        self.chains
            .borrow()
            .get(event_name)
            .map_or(0, HandlerChain::len)
    }

    /// Whether a native subscription is live for `event_name`
    pub fn is_attached(&self, event_name: &str) -> bool {
        self.chains
            .borrow()
            .get(event_name)
            .is_some_and(HandlerChain::is_attached)
    }

    /// Event names that currently hold a native subscription, sorted
    pub fn attached_events(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .chains
            .borrow()
            .values()
            .filter(|chain| chain.is_attached())
            .map(|chain| chain.event_name.clone())
            .collect();
        names.sort();
        names
    }
}

impl<H: Host> Drop for EventRegistry<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<H: Host> fmt::Debug for EventRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("target", &self.target)
            .field("chains", &self.chains.borrow().values().collect::<Vec<_>>())
            .finish()
    }
}

/// Capability of anything that owns an [`EventRegistry`]
///
/// Widget wrappers implement `event_registry` and get the convenience
/// entry points for free.
pub trait EventTarget {
    type Host: Host;

    fn event_registry(&self) -> &EventRegistry<Self::Host>;

    fn on<F>(&self, event_name: &str, handler: F) -> Result<HandlerId>
    where
        F: Fn(&TypedEvent) + 'static,
    {
        self.event_registry().register_handler(event_name, handler)
    }

    fn off(&self, event_name: &str, id: HandlerId) -> bool {
        self.event_registry().unregister_handler(event_name, id)
    }

    fn emit(&self, event_name: &str, raw: Option<&RawEvent>) -> usize {
        self.event_registry().fire(event_name, raw)
    }
}

impl<H: Host> EventTarget for EventRegistry<H> {
    type Host = H;

    fn event_registry(&self) -> &EventRegistry<H> {
        self
    }
}

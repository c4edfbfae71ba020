//! Tether Core
//!
//! Binds an application's data model to a live host document:
//!
//! - **Observable cells**: value slots with ordered listeners and two-way
//!   merge links that never feed back into themselves
//! - **Event registries**: many application handlers per event name sharing
//!   one native listener, attached and released with the handler chain
//! - **Event decoding**: raw host payloads turned into typed events, with
//!   defaults for anything the host left out
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use tether_core::memory_host::MemoryHost;
//! use tether_core::{EventRegistry, ObservableCell, RawEvent};
//!
//! let host = Rc::new(MemoryHost::new());
//! let registry = EventRegistry::new(host.clone(), 1);
//! let clicks = ObservableCell::new(0u32);
//!
//! let counter = clicks.clone();
//! registry
//!     .register_handler("click", move |_event| counter.update(|n| *n += 1))
//!     .unwrap();
//!
//! host.deliver(1, "click", Some(&RawEvent::new().with("clientX", 4.0)));
//! assert_eq!(clicks.get(), 1);
//!
//! registry.shutdown();
//! assert_eq!(host.total_live_listeners(), 0);
//! ```

pub mod catalog;
pub mod cell;
pub mod config;
pub mod decode;
pub mod error;
pub mod events;
pub mod host;
pub mod memory_host;
pub mod raw;
pub mod registry;
pub mod subscription;

pub use catalog::EventCatalog;
pub use cell::{ListenerId, ObservableCell};
pub use config::TetherConfig;
pub use error::{ConfigError, EventError, Result};
pub use events::{EventKind, Modifiers, TypedEvent};
pub use host::{Dispatcher, Host, HostError};
pub use raw::RawEvent;
pub use registry::{EventRegistry, EventTarget, Handler, HandlerId};
pub use subscription::NativeSubscription;

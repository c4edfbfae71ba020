//! Host document boundary
//!
//! The core never touches the document directly. A [`Host`] installs one
//! native listener per (target, event name) and removes it again; the
//! marshalling of payloads into [`RawEvent`] is the host's business.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::raw::RawEvent;

/// The closure handed across the boundary for one native subscription
///
/// `None` means the event was fired without a payload.
pub type Dispatcher = Rc<dyn Fn(Option<&RawEvent>)>;

/// Errors reported by a host while installing a listener
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The target is no longer part of the document
    #[error("target is detached from the document")]
    TargetGone,

    /// The host refused the listener
    #[error("listener rejected: {0}")]
    Rejected(String),
}

/// Capability to install and remove native listeners
pub trait Host {
    /// Identity of a node in the host document
    type Target: Clone + fmt::Debug;

    /// Token returned by `attach`, given back to `detach`
    type Listener;

    /// Install one native listener for `event_name` on `target`
    fn attach(
        &self,
        target: &Self::Target,
        event_name: &str,
        dispatcher: Dispatcher,
    ) -> Result<Self::Listener, HostError>;

    /// Remove a listener installed by `attach`
    ///
    /// Consuming the token makes a second detach of the same listener
    /// impossible to express.
    fn detach(&self, target: &Self::Target, event_name: &str, listener: Self::Listener);
}

//! Native subscriptions
//!
//! A [`NativeSubscription`] owns the single dispatcher installed for one
//! (target, event name) pair. Release is idempotent and also happens on
//! drop, so every `attach` is matched by exactly one `detach`.

use std::fmt;
use std::rc::Rc;

use crate::host::{Dispatcher, Host, HostError};

pub struct NativeSubscription<H: Host> {
    host: Rc<H>,
    target: H::Target,
    event_name: String,
    listener: Option<H::Listener>,
}

impl<H: Host> NativeSubscription<H> {
    /// Install `dispatcher` through the host
    pub fn attach(
        host: Rc<H>,
        target: H::Target,
        event_name: impl Into<String>,
        dispatcher: Dispatcher,
    ) -> Result<Self, HostError> {
        let event_name = event_name.into();
        let listener = host.attach(&target, &event_name, dispatcher)?;
        tracing::debug!(node = ?target, event = %event_name, "attached native listener");
        Ok(Self {
            host,
            target,
            event_name,
            listener: Some(listener),
        })
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn target(&self) -> &H::Target {
        &self.target
    }

    pub fn is_released(&self) -> bool {
        self.listener.is_none()
    }

    /// Detach the native listener; later calls do nothing
    pub fn release(&mut self) {
        match self.listener.take() {
            Some(listener) => {
                self.host.detach(&self.target, &self.event_name, listener);
                tracing::debug!(
                    node = ?self.target,
                    event = %self.event_name,
                    "released native listener"
                );
            }
            None => {
                tracing::trace!(event = %self.event_name, "native listener already released");
            }
        }
    }
}

impl<H: Host> Drop for NativeSubscription<H> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<H: Host> fmt::Debug for NativeSubscription<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeSubscription")
            .field("target", &self.target)
            .field("event_name", &self.event_name)
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_host::MemoryHost;

    fn noop() -> Dispatcher {
        Rc::new(|_| {})
    }

    #[test]
    fn test_release_is_idempotent() {
        let host = Rc::new(MemoryHost::new());
        let mut sub = NativeSubscription::attach(host.clone(), 1, "click", noop()).unwrap();
        assert!(!sub.is_released());
        assert_eq!(host.live_listeners(&1, "click"), 1);

        sub.release();
        sub.release();
        assert!(sub.is_released());
        assert_eq!(host.live_listeners(&1, "click"), 0);
        assert_eq!(host.detach_count(), 1);

        drop(sub);
        assert_eq!(host.detach_count(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let host = Rc::new(MemoryHost::new());
        {
            let _sub = NativeSubscription::attach(host.clone(), 4, "keydown", noop()).unwrap();
            assert_eq!(host.live_listeners(&4, "keydown"), 1);
        }
        assert_eq!(host.live_listeners(&4, "keydown"), 0);
        assert_eq!(host.attach_count(), 1);
        assert_eq!(host.detach_count(), 1);
    }

    #[test]
    fn test_rejected_attach_leaves_nothing_behind() {
        let host = Rc::new(MemoryHost::new());
        host.reject("wheel");
        let err = NativeSubscription::attach(host.clone(), 1, "wheel", noop()).unwrap_err();
        assert!(matches!(err, HostError::Rejected(_)));
        assert_eq!(host.live_listeners(&1, "wheel"), 0);
        assert_eq!(host.detach_count(), 0);
    }
}

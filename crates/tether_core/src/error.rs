//! Error types

use thiserror::Error;

use crate::host::HostError;

/// Errors surfaced by event registration
///
/// Missing payload fields, double releases and suppressed merge propagations
/// are absorbed where they happen and never show up here.
#[derive(Error, Debug)]
pub enum EventError {
    /// No decode routine is mapped to this event name
    #[error("unknown event kind for `{event_name}`")]
    UnknownEventKind { event_name: String },

    /// The host refused to install the native listener
    #[error("failed to attach native listener for `{event_name}`")]
    Attach {
        event_name: String,
        #[source]
        source: HostError,
    },
}

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] toml::de::Error),

    /// A custom entry tried to remap a built-in event name
    #[error("`{event_name}` is a built-in event and cannot be remapped")]
    ReservedEventName { event_name: String },
}

/// Result type for event registration
pub type Result<T> = std::result::Result<T, EventError>;

//! Configuration (tether.toml)
//!
//! ```toml
//! [events]
//! custom = { "long-press" = "touch", "swipe" = "pointer" }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::EventCatalog;
use crate::error::ConfigError;
use crate::events::EventKind;

/// Top-level configuration
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct TetherConfig {
    #[serde(default)]
    pub events: EventsConfig,
}

/// Event catalog extensions
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventsConfig {
    /// Extra event names mapped onto existing kinds
    #[serde(default)]
    pub custom: BTreeMap<String, EventKind>,
}

impl TetherConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(
            path = %path.display(),
            custom_events = config.events.custom.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Built-in catalog extended with the custom entries
    pub fn catalog(&self) -> Result<EventCatalog, ConfigError> {
        let mut catalog = EventCatalog::builtin();
        for (name, kind) in &self.events.custom {
            catalog.insert(name.as_str(), *kind)?;
        }
        Ok(catalog)
    }
}

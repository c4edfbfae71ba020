//! Event name catalog
//!
//! Maps host event names (`"click"`, `"keydown"`, ...) to the [`EventKind`]
//! whose decode routine applies. Registering a handler for a name that is
//! not in the catalog fails fast with [`EventError::UnknownEventKind`].

use rustc_hash::FxHashMap;

use crate::error::{ConfigError, EventError};
use crate::events::EventKind;

const BUILTIN: &[(EventKind, &[&str])] = &[
    (
        EventKind::Base,
        &["change", "submit", "reset", "invalid", "toggle", "cancel", "close"],
    ),
    (
        EventKind::Ui,
        &["load", "unload", "abort", "error", "resize", "scroll", "select"],
    ),
    (
        EventKind::Mouse,
        &[
            "click",
            "dblclick",
            "auxclick",
            "contextmenu",
            "mousedown",
            "mouseup",
            "mousemove",
            "mouseenter",
            "mouseleave",
            "mouseover",
            "mouseout",
        ],
    ),
    (EventKind::Keyboard, &["keydown", "keyup", "keypress"]),
    (
        EventKind::Touch,
        &["touchstart", "touchend", "touchmove", "touchcancel"],
    ),
    (
        EventKind::Drag,
        &[
            "drag",
            "dragstart",
            "dragend",
            "dragenter",
            "dragleave",
            "dragover",
            "drop",
        ],
    ),
    (EventKind::Focus, &["focus", "blur", "focusin", "focusout"]),
    (EventKind::Wheel, &["wheel"]),
    (EventKind::Clipboard, &["copy", "cut", "paste"]),
    (
        EventKind::Transition,
        &[
            "transitionstart",
            "transitionrun",
            "transitionend",
            "transitioncancel",
        ],
    ),
    (
        EventKind::Animation,
        &[
            "animationstart",
            "animationend",
            "animationiteration",
            "animationcancel",
        ],
    ),
    (
        EventKind::Pointer,
        &[
            "pointerdown",
            "pointerup",
            "pointermove",
            "pointerover",
            "pointerout",
            "pointerenter",
            "pointerleave",
            "pointercancel",
            "gotpointercapture",
            "lostpointercapture",
        ],
    ),
    (EventKind::Input, &["input", "beforeinput"]),
];

/// Event name -> event kind table
#[derive(Clone, Debug)]
pub struct EventCatalog {
    kinds: FxHashMap<String, EventKind>,
}

impl EventCatalog {
    /// Catalog of the standard DOM event names
    pub fn builtin() -> Self {
        let kinds = BUILTIN
            .iter()
            .flat_map(|(kind, names)| names.iter().map(move |name| (name.to_string(), *kind)))
            .collect();
        Self { kinds }
    }

    /// A catalog with no entries
    pub fn empty() -> Self {
        Self {
            kinds: FxHashMap::default(),
        }
    }

    pub fn is_builtin(name: &str) -> bool {
        BUILTIN.iter().any(|(_, names)| names.contains(&name))
    }

    /// Map an additional event name onto an existing kind
    ///
    /// Re-adding a built-in name with its own kind is accepted; remapping it
    /// to a different kind is rejected.
    pub fn insert(&mut self, name: impl Into<String>, kind: EventKind) -> Result<(), ConfigError> {
        let name = name.into();
        if let Some(existing) = self.kinds.get(&name) {
            if *existing != kind && Self::is_builtin(&name) {
                return Err(ConfigError::ReservedEventName { event_name: name });
            }
        }
        self.kinds.insert(name, kind);
        Ok(())
    }

    pub fn kind_of(&self, name: &str) -> Option<EventKind> {
        self.kinds.get(name).copied()
    }

    /// Like [`kind_of`](Self::kind_of), but a missing mapping is an error
    pub fn resolve(&self, name: &str) -> Result<EventKind, EventError> {
        self.kind_of(name)
            .ok_or_else(|| EventError::UnknownEventKind {
                event_name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

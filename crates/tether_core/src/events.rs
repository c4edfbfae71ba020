//! Typed events
//!
//! Native events are decoded into [`TypedEvent`], a tagged union of plain
//! records. Wider kinds embed the record they extend instead of re-declaring
//! its fields: a [`WheelEvent`] embeds a [`MouseEvent`], which embeds a
//! [`UiEvent`], which embeds the [`BaseEvent`] every variant carries.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Classification tag selecting the decode routine for a payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Base,
    Ui,
    Mouse,
    Keyboard,
    Touch,
    Drag,
    Focus,
    Wheel,
    Clipboard,
    Transition,
    Animation,
    Pointer,
    Input,
}

impl EventKind {
    pub const ALL: [EventKind; 13] = [
        EventKind::Base,
        EventKind::Ui,
        EventKind::Mouse,
        EventKind::Keyboard,
        EventKind::Touch,
        EventKind::Drag,
        EventKind::Focus,
        EventKind::Wheel,
        EventKind::Clipboard,
        EventKind::Transition,
        EventKind::Animation,
        EventKind::Pointer,
        EventKind::Input,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            EventKind::Base => "base",
            EventKind::Ui => "ui",
            EventKind::Mouse => "mouse",
            EventKind::Keyboard => "keyboard",
            EventKind::Touch => "touch",
            EventKind::Drag => "drag",
            EventKind::Focus => "focus",
            EventKind::Wheel => "wheel",
            EventKind::Clipboard => "clipboard",
            EventKind::Transition => "transition",
            EventKind::Animation => "animation",
            EventKind::Pointer => "pointer",
            EventKind::Input => "input",
        }
    }
}

/// Modifier key state carried by keyboard, mouse and touch events
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
}

impl Modifiers {
    /// Look a modifier up by its DOM key name (`"Shift"`, `"Control"`,
    /// `"Alt"`, `"Meta"`); any other name reads as released
    pub fn is_active(&self, key: &str) -> bool {
        match key {
            "Alt" => self.alt_key,
            "Control" => self.ctrl_key,
            "Meta" => self.meta_key,
            "Shift" => self.shift_key,
            _ => false,
        }
    }

    pub fn any(&self) -> bool {
        self.alt_key || self.ctrl_key || self.meta_key || self.shift_key
    }
}

/// Fields shared by every event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BaseEvent {
    pub event_type: String,
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
    pub default_prevented: bool,
    pub is_trusted: bool,
    /// Milliseconds relative to the host's time origin
    pub time_stamp: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiEvent {
    pub base: BaseEvent,
    pub detail: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MouseEvent {
    pub ui: UiEvent,
    pub screen_x: f64,
    pub screen_y: f64,
    pub client_x: f64,
    pub client_y: f64,
    pub page_x: f64,
    pub page_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub movement_x: f64,
    pub movement_y: f64,
    /// Button that changed state (0 = main, 1 = auxiliary, 2 = secondary)
    pub button: i16,
    /// Bitmask of buttons held during the event
    pub buttons: u16,
    pub modifiers: Modifiers,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyboardEvent {
    pub ui: UiEvent,
    pub key: String,
    pub code: String,
    pub location: u32,
    pub repeat: bool,
    pub is_composing: bool,
    pub modifiers: Modifiers,
}

/// A single contact point of a touch event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TouchPoint {
    pub identifier: i64,
    pub screen_x: f64,
    pub screen_y: f64,
    pub client_x: f64,
    pub client_y: f64,
    pub page_x: f64,
    pub page_y: f64,
    pub radius_x: f64,
    pub radius_y: f64,
    pub rotation_angle: f64,
    pub force: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TouchEvent {
    pub ui: UiEvent,
    pub touches: Vec<TouchPoint>,
    pub target_touches: Vec<TouchPoint>,
    pub changed_touches: Vec<TouchPoint>,
    pub modifiers: Modifiers,
}

/// Data carried by drag and clipboard events
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTransfer {
    pub drop_effect: String,
    pub effect_allowed: String,
    pub types: Vec<String>,
    /// Names of the files being transferred
    pub files: Vec<String>,
    /// Format -> serialized data
    pub data: FxHashMap<String, String>,
}

impl DataTransfer {
    pub fn get_data(&self, format: &str) -> Option<&str> {
        self.data.get(format).map(String::as_str)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DragEvent {
    pub mouse: MouseEvent,
    pub data_transfer: DataTransfer,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FocusEvent {
    pub ui: UiEvent,
    /// Id of the element losing or gaining focus, empty when there is none
    pub related_target: String,
}

/// Unit of wheel deltas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl DeltaMode {
    /// Unknown codes fall back to pixels
    pub const fn from_code(code: u64) -> Self {
        match code {
            1 => DeltaMode::Line,
            2 => DeltaMode::Page,
            _ => DeltaMode::Pixel,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WheelEvent {
    pub mouse: MouseEvent,
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_z: f64,
    pub delta_mode: DeltaMode,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipboardEvent {
    pub base: BaseEvent,
    pub clipboard_data: DataTransfer,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionEvent {
    pub base: BaseEvent,
    pub property_name: String,
    /// Seconds
    pub elapsed_time: f64,
    pub pseudo_element: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationEvent {
    pub base: BaseEvent,
    pub animation_name: String,
    /// Seconds
    pub elapsed_time: f64,
    pub pseudo_element: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerEvent {
    pub mouse: MouseEvent,
    pub pointer_id: i64,
    pub width: f64,
    pub height: f64,
    pub pressure: f64,
    pub tangential_pressure: f64,
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub twist: f64,
    pub pointer_type: String,
    pub is_primary: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputEvent {
    pub ui: UiEvent,
    pub data: String,
    pub input_type: String,
    pub is_composing: bool,
}

/// A decoded native event
#[derive(Clone, Debug, PartialEq)]
pub enum TypedEvent {
    Base(BaseEvent),
    Ui(UiEvent),
    Mouse(MouseEvent),
    Keyboard(KeyboardEvent),
    Touch(TouchEvent),
    Drag(DragEvent),
    Focus(FocusEvent),
    Wheel(WheelEvent),
    Clipboard(ClipboardEvent),
    Transition(TransitionEvent),
    Animation(AnimationEvent),
    Pointer(PointerEvent),
    Input(InputEvent),
}

impl TypedEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TypedEvent::Base(_) => EventKind::Base,
            TypedEvent::Ui(_) => EventKind::Ui,
            TypedEvent::Mouse(_) => EventKind::Mouse,
            TypedEvent::Keyboard(_) => EventKind::Keyboard,
            TypedEvent::Touch(_) => EventKind::Touch,
            TypedEvent::Drag(_) => EventKind::Drag,
            TypedEvent::Focus(_) => EventKind::Focus,
            TypedEvent::Wheel(_) => EventKind::Wheel,
            TypedEvent::Clipboard(_) => EventKind::Clipboard,
            TypedEvent::Transition(_) => EventKind::Transition,
            TypedEvent::Animation(_) => EventKind::Animation,
            TypedEvent::Pointer(_) => EventKind::Pointer,
            TypedEvent::Input(_) => EventKind::Input,
        }
    }

    /// Base fields, present on every variant
    pub fn base(&self) -> &BaseEvent {
        match self {
            TypedEvent::Base(e) => e,
            TypedEvent::Ui(e) => &e.base,
            TypedEvent::Mouse(e) => &e.ui.base,
            TypedEvent::Keyboard(e) => &e.ui.base,
            TypedEvent::Touch(e) => &e.ui.base,
            TypedEvent::Drag(e) => &e.mouse.ui.base,
            TypedEvent::Focus(e) => &e.ui.base,
            TypedEvent::Wheel(e) => &e.mouse.ui.base,
            TypedEvent::Clipboard(e) => &e.base,
            TypedEvent::Transition(e) => &e.base,
            TypedEvent::Animation(e) => &e.base,
            TypedEvent::Pointer(e) => &e.mouse.ui.base,
            TypedEvent::Input(e) => &e.ui.base,
        }
    }

    /// UI fields, for every variant that widens the UI record
    pub fn ui(&self) -> Option<&UiEvent> {
        match self {
            TypedEvent::Ui(e) => Some(e),
            TypedEvent::Keyboard(e) => Some(&e.ui),
            TypedEvent::Touch(e) => Some(&e.ui),
            TypedEvent::Focus(e) => Some(&e.ui),
            TypedEvent::Input(e) => Some(&e.ui),
            _ => self.mouse().map(|m| &m.ui),
        }
    }

    /// Mouse fields, for mouse events and the kinds that widen them
    pub fn mouse(&self) -> Option<&MouseEvent> {
        match self {
            TypedEvent::Mouse(e) => Some(e),
            TypedEvent::Drag(e) => Some(&e.mouse),
            TypedEvent::Wheel(e) => Some(&e.mouse),
            TypedEvent::Pointer(e) => Some(&e.mouse),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Option<Modifiers> {
        match self {
            TypedEvent::Keyboard(e) => Some(e.modifiers),
            TypedEvent::Touch(e) => Some(e.modifiers),
            _ => self.mouse().map(|m| m.modifiers),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.base().event_type
    }
}

//! Event decoding
//!
//! One decode routine per [`EventKind`], selected through [`decoder_for`].
//! Routines never fail: absent or mistyped fields resolve to defaults
//! (`false`, `0`, empty strings, default-filled nested records).
//!
//! Kinds that widen another kind reuse its routine for the shared fields and
//! only extract their own extension, e.g. wheel = mouse + deltas.

use rustc_hash::FxHashMap;

use crate::events::{
    AnimationEvent, BaseEvent, ClipboardEvent, DataTransfer, DeltaMode, DragEvent, EventKind,
    FocusEvent, InputEvent, KeyboardEvent, Modifiers, MouseEvent, PointerEvent, TouchEvent,
    TouchPoint, TransitionEvent, TypedEvent, UiEvent, WheelEvent,
};
use crate::raw::RawEvent;

/// Decode routine for one event kind
pub type DecodeFn = fn(&RawEvent) -> TypedEvent;

/// Look up the decode routine for a kind
pub fn decoder_for(kind: EventKind) -> DecodeFn {
    match kind {
        EventKind::Base => |raw: &RawEvent| TypedEvent::Base(decode_base(raw)),
        EventKind::Ui => |raw: &RawEvent| TypedEvent::Ui(decode_ui(raw)),
        EventKind::Mouse => |raw: &RawEvent| TypedEvent::Mouse(decode_mouse(raw)),
        EventKind::Keyboard => |raw: &RawEvent| TypedEvent::Keyboard(decode_keyboard(raw)),
        EventKind::Touch => |raw: &RawEvent| TypedEvent::Touch(decode_touch(raw)),
        EventKind::Drag => |raw: &RawEvent| TypedEvent::Drag(decode_drag(raw)),
        EventKind::Focus => |raw: &RawEvent| TypedEvent::Focus(decode_focus(raw)),
        EventKind::Wheel => |raw: &RawEvent| TypedEvent::Wheel(decode_wheel(raw)),
        EventKind::Clipboard => |raw: &RawEvent| TypedEvent::Clipboard(decode_clipboard(raw)),
        EventKind::Transition => |raw: &RawEvent| TypedEvent::Transition(decode_transition(raw)),
        EventKind::Animation => |raw: &RawEvent| TypedEvent::Animation(decode_animation(raw)),
        EventKind::Pointer => |raw: &RawEvent| TypedEvent::Pointer(decode_pointer(raw)),
        EventKind::Input => |raw: &RawEvent| TypedEvent::Input(decode_input(raw)),
    }
}

/// Decode a payload; a missing payload decodes as an empty record
pub fn decode(kind: EventKind, raw: Option<&RawEvent>) -> TypedEvent {
    let decode_fn = decoder_for(kind);
    match raw {
        Some(raw) => decode_fn(raw),
        None => decode_fn(&RawEvent::new()),
    }
}

pub fn decode_base(raw: &RawEvent) -> BaseEvent {
    BaseEvent {
        event_type: raw.string_or_default("type"),
        bubbles: raw.bool_or_default("bubbles"),
        cancelable: raw.bool_or_default("cancelable"),
        composed: raw.bool_or_default("composed"),
        default_prevented: raw.bool_or_default("defaultPrevented"),
        is_trusted: raw.bool_or_default("isTrusted"),
        time_stamp: raw.f64_or_default("timeStamp"),
    }
}

pub fn decode_ui(raw: &RawEvent) -> UiEvent {
    UiEvent {
        base: decode_base(raw),
        detail: raw.i64_or_default("detail"),
    }
}

pub fn decode_modifiers(raw: &RawEvent) -> Modifiers {
    Modifiers {
        alt_key: raw.bool_or_default("altKey"),
        ctrl_key: raw.bool_or_default("ctrlKey"),
        meta_key: raw.bool_or_default("metaKey"),
        shift_key: raw.bool_or_default("shiftKey"),
    }
}

pub fn decode_mouse(raw: &RawEvent) -> MouseEvent {
    MouseEvent {
        ui: decode_ui(raw),
        screen_x: raw.f64_or_default("screenX"),
        screen_y: raw.f64_or_default("screenY"),
        client_x: raw.f64_or_default("clientX"),
        client_y: raw.f64_or_default("clientY"),
        page_x: raw.f64_or_default("pageX"),
        page_y: raw.f64_or_default("pageY"),
        offset_x: raw.f64_or_default("offsetX"),
        offset_y: raw.f64_or_default("offsetY"),
        movement_x: raw.f64_or_default("movementX"),
        movement_y: raw.f64_or_default("movementY"),
        button: raw.i64_or_default("button").clamp(i16::MIN as i64, i16::MAX as i64) as i16,
        buttons: raw.u64_or_default("buttons").min(u16::MAX as u64) as u16,
        modifiers: decode_modifiers(raw),
    }
}

pub fn decode_keyboard(raw: &RawEvent) -> KeyboardEvent {
    KeyboardEvent {
        ui: decode_ui(raw),
        key: raw.string_or_default("key"),
        code: raw.string_or_default("code"),
        location: raw.u64_or_default("location").min(u32::MAX as u64) as u32,
        repeat: raw.bool_or_default("repeat"),
        is_composing: raw.bool_or_default("isComposing"),
        modifiers: decode_modifiers(raw),
    }
}

pub fn decode_touch_point(raw: &RawEvent) -> TouchPoint {
    TouchPoint {
        identifier: raw.i64_or_default("identifier"),
        screen_x: raw.f64_or_default("screenX"),
        screen_y: raw.f64_or_default("screenY"),
        client_x: raw.f64_or_default("clientX"),
        client_y: raw.f64_or_default("clientY"),
        page_x: raw.f64_or_default("pageX"),
        page_y: raw.f64_or_default("pageY"),
        radius_x: raw.f64_or_default("radiusX"),
        radius_y: raw.f64_or_default("radiusY"),
        rotation_angle: raw.f64_or_default("rotationAngle"),
        force: raw.f64_or_default("force"),
    }
}

fn decode_touch_list(raw: &RawEvent, name: &str) -> Vec<TouchPoint> {
    raw.objects_or_default(name)
        .iter()
        .map(decode_touch_point)
        .collect()
}

pub fn decode_touch(raw: &RawEvent) -> TouchEvent {
    TouchEvent {
        ui: decode_ui(raw),
        touches: decode_touch_list(raw, "touches"),
        target_touches: decode_touch_list(raw, "targetTouches"),
        changed_touches: decode_touch_list(raw, "changedTouches"),
        modifiers: decode_modifiers(raw),
    }
}

pub fn decode_data_transfer(raw: &RawEvent) -> DataTransfer {
    let data: FxHashMap<String, String> = raw
        .object_or_default("data")
        .entries()
        .filter_map(|(format, value)| value.as_str().map(|s| (format.to_owned(), s.to_owned())))
        .collect();

    DataTransfer {
        drop_effect: raw.string_or_default("dropEffect"),
        effect_allowed: raw.string_or_default("effectAllowed"),
        types: raw.strings_or_default("types"),
        files: raw.strings_or_default("files"),
        data,
    }
}

pub fn decode_drag(raw: &RawEvent) -> DragEvent {
    DragEvent {
        mouse: decode_mouse(raw),
        data_transfer: decode_data_transfer(&raw.object_or_default("dataTransfer")),
    }
}

pub fn decode_focus(raw: &RawEvent) -> FocusEvent {
    FocusEvent {
        ui: decode_ui(raw),
        related_target: raw.object_or_default("relatedTarget").string_or_default("id"),
    }
}

pub fn decode_wheel(raw: &RawEvent) -> WheelEvent {
    WheelEvent {
        mouse: decode_mouse(raw),
        delta_x: raw.f64_or_default("deltaX"),
        delta_y: raw.f64_or_default("deltaY"),
        delta_z: raw.f64_or_default("deltaZ"),
        delta_mode: DeltaMode::from_code(raw.u64_or_default("deltaMode")),
    }
}

pub fn decode_clipboard(raw: &RawEvent) -> ClipboardEvent {
    ClipboardEvent {
        base: decode_base(raw),
        clipboard_data: decode_data_transfer(&raw.object_or_default("clipboardData")),
    }
}

pub fn decode_transition(raw: &RawEvent) -> TransitionEvent {
    TransitionEvent {
        base: decode_base(raw),
        property_name: raw.string_or_default("propertyName"),
        elapsed_time: raw.f64_or_default("elapsedTime"),
        pseudo_element: raw.string_or_default("pseudoElement"),
    }
}

pub fn decode_animation(raw: &RawEvent) -> AnimationEvent {
    AnimationEvent {
        base: decode_base(raw),
        animation_name: raw.string_or_default("animationName"),
        elapsed_time: raw.f64_or_default("elapsedTime"),
        pseudo_element: raw.string_or_default("pseudoElement"),
    }
}

pub fn decode_pointer(raw: &RawEvent) -> PointerEvent {
    PointerEvent {
        mouse: decode_mouse(raw),
        pointer_id: raw.i64_or_default("pointerId"),
        width: raw.f64_or_default("width"),
        height: raw.f64_or_default("height"),
        pressure: raw.f64_or_default("pressure"),
        tangential_pressure: raw.f64_or_default("tangentialPressure"),
        tilt_x: raw.f64_or_default("tiltX"),
        tilt_y: raw.f64_or_default("tiltY"),
        twist: raw.f64_or_default("twist"),
        pointer_type: raw.string_or_default("pointerType"),
        is_primary: raw.bool_or_default("isPrimary"),
    }
}

pub fn decode_input(raw: &RawEvent) -> InputEvent {
    InputEvent {
        ui: decode_ui(raw),
        data: raw.string_or_default("data"),
        input_type: raw.string_or_default("inputType"),
        is_composing: raw.bool_or_default("isComposing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_kind_decodes_an_empty_payload() {
        for kind in EventKind::ALL {
            let event = decode(kind, None);
            assert_eq!(event.kind(), kind);
            assert_eq!(event.base(), &BaseEvent::default());
        }
    }

    #[test]
    fn test_mouse_fixture_round_trip() {
        let raw = RawEvent::from(json!({
            "type": "click",
            "bubbles": true,
            "cancelable": true,
            "isTrusted": true,
            "timeStamp": 1234.5,
            "detail": 1,
            "clientX": 40.0,
            "clientY": 60.0,
            "button": 0,
            "buttons": 1,
            "shiftKey": true,
        }));

        let TypedEvent::Mouse(mouse) = decode(EventKind::Mouse, Some(&raw)) else {
            panic!("expected a mouse event");
        };

        assert_eq!(mouse.ui.base.event_type, "click");
        assert!(mouse.ui.base.bubbles);
        assert!(mouse.ui.base.cancelable);
        assert!(mouse.ui.base.is_trusted);
        assert_eq!(mouse.ui.base.time_stamp, 1234.5);
        assert_eq!(mouse.ui.detail, 1);
        assert_eq!(mouse.client_x, 40.0);
        assert_eq!(mouse.client_y, 60.0);
        assert_eq!(mouse.buttons, 1);
        assert!(mouse.modifiers.shift_key);

        // omitted in the fixture
        assert!(!mouse.ui.base.composed);
        assert!(!mouse.ui.base.default_prevented);
        assert_eq!(mouse.screen_x, 0.0);
        assert_eq!(mouse.page_y, 0.0);
        assert!(!mouse.modifiers.ctrl_key);
    }

    #[test]
    fn test_wheel_reuses_mouse_fields() {
        let raw = RawEvent::from(json!({
            "type": "wheel",
            "clientX": 5.0,
            "ctrlKey": true,
            "deltaY": -120.0,
            "deltaMode": 1,
        }));

        let TypedEvent::Wheel(wheel) = decode(EventKind::Wheel, Some(&raw)) else {
            panic!("expected a wheel event");
        };
        assert_eq!(wheel.mouse, decode_mouse(&raw));
        assert_eq!(wheel.delta_y, -120.0);
        assert_eq!(wheel.delta_x, 0.0);
        assert_eq!(wheel.delta_mode, DeltaMode::Line);
        assert!(wheel.mouse.modifiers.ctrl_key);
    }

    #[test]
    fn test_drag_carries_data_transfer() {
        let raw = RawEvent::from(json!({
            "type": "drop",
            "clientX": 3.0,
            "dataTransfer": {
                "dropEffect": "copy",
                "types": ["text/plain"],
                "files": ["report.pdf"],
                "data": { "text/plain": "hello", "bogus": 1 },
            },
        }));

        let TypedEvent::Drag(drag) = decode(EventKind::Drag, Some(&raw)) else {
            panic!("expected a drag event");
        };
        assert_eq!(drag.mouse.client_x, 3.0);
        assert_eq!(drag.data_transfer.drop_effect, "copy");
        assert_eq!(drag.data_transfer.effect_allowed, "");
        assert_eq!(drag.data_transfer.types, vec!["text/plain"]);
        assert_eq!(drag.data_transfer.files, vec!["report.pdf"]);
        assert_eq!(drag.data_transfer.get_data("text/plain"), Some("hello"));
        assert_eq!(drag.data_transfer.get_data("bogus"), None);
    }

    #[test]
    fn test_drag_without_data_transfer_defaults_nested_record() {
        let raw = RawEvent::new().with("type", "dragstart").with("dataTransfer", "oops");
        let TypedEvent::Drag(drag) = decode(EventKind::Drag, Some(&raw)) else {
            panic!("expected a drag event");
        };
        assert_eq!(drag.data_transfer, DataTransfer::default());
    }

    #[test]
    fn test_touch_lists() {
        let raw = RawEvent::from(json!({
            "type": "touchstart",
            "touches": [
                { "identifier": 7, "clientX": 1.0, "force": 0.5 },
                { "identifier": 8 },
            ],
            "changedTouches": [{ "identifier": 7 }],
        }));

        let TypedEvent::Touch(touch) = decode(EventKind::Touch, Some(&raw)) else {
            panic!("expected a touch event");
        };
        assert_eq!(touch.touches.len(), 2);
        assert_eq!(touch.touches[0].identifier, 7);
        assert_eq!(touch.touches[0].force, 0.5);
        assert_eq!(touch.touches[1].client_x, 0.0);
        assert!(touch.target_touches.is_empty());
        assert_eq!(touch.changed_touches.len(), 1);
    }

    #[test]
    fn test_keyboard_and_focus() {
        let raw = RawEvent::from(json!({
            "type": "keydown",
            "key": "a",
            "code": "KeyA",
            "repeat": true,
            "metaKey": true,
        }));
        let TypedEvent::Keyboard(key) = decode(EventKind::Keyboard, Some(&raw)) else {
            panic!("expected a keyboard event");
        };
        assert_eq!(key.key, "a");
        assert_eq!(key.code, "KeyA");
        assert!(key.repeat);
        assert!(key.modifiers.meta_key);
        assert_eq!(key.location, 0);

        let raw = RawEvent::from(json!({
            "type": "focus",
            "relatedTarget": { "id": "name-field" },
        }));
        let TypedEvent::Focus(focus) = decode(EventKind::Focus, Some(&raw)) else {
            panic!("expected a focus event");
        };
        assert_eq!(focus.related_target, "name-field");
    }

    #[test]
    fn test_base_fixture_round_trip() {
        let raw = RawEvent::from(json!({
            "type": "submit",
            "bubbles": true,
            "composed": true,
            "defaultPrevented": true,
            "timeStamp": 88.0,
        }));
        let TypedEvent::Base(base) = decode(EventKind::Base, Some(&raw)) else {
            panic!("expected a base event");
        };
        assert_eq!(base.event_type, "submit");
        assert!(base.bubbles);
        assert!(base.composed);
        assert!(base.default_prevented);
        assert_eq!(base.time_stamp, 88.0);

        assert!(!base.cancelable);
        assert!(!base.is_trusted);
    }

    #[test]
    fn test_clipboard_fixture_round_trip() {
        let raw = RawEvent::from(json!({
            "type": "paste",
            "cancelable": true,
            "clipboardData": {
                "types": ["text/plain"],
                "data": { "text/plain": "x" },
            },
        }));
        let TypedEvent::Clipboard(clip) = decode(EventKind::Clipboard, Some(&raw)) else {
            panic!("expected a clipboard event");
        };
        assert_eq!(clip.base.event_type, "paste");
        assert!(clip.base.cancelable);
        assert_eq!(clip.clipboard_data.types, vec!["text/plain"]);
        assert_eq!(clip.clipboard_data.get_data("text/plain"), Some("x"));

        assert!(!clip.base.bubbles);
        assert_eq!(clip.clipboard_data.drop_effect, "");
        assert_eq!(clip.clipboard_data.effect_allowed, "");
        assert!(clip.clipboard_data.files.is_empty());
    }

    #[test]
    fn test_transition_fixture_round_trip() {
        let raw = RawEvent::from(json!({
            "type": "transitionend",
            "propertyName": "opacity",
            "elapsedTime": 0.5,
        }));
        let TypedEvent::Transition(transition) = decode(EventKind::Transition, Some(&raw)) else {
            panic!("expected a transition event");
        };
        assert_eq!(transition.base.event_type, "transitionend");
        assert_eq!(transition.property_name, "opacity");
        assert_eq!(transition.elapsed_time, 0.5);

        assert_eq!(transition.pseudo_element, "");
        assert_eq!(transition.base.time_stamp, 0.0);
    }

    #[test]
    fn test_animation_fixture_round_trip() {
        let raw = RawEvent::from(json!({
            "type": "animationiteration",
            "animationName": "pulse",
            "elapsedTime": 2.0,
            "pseudoElement": "::after",
        }));
        let TypedEvent::Animation(animation) = decode(EventKind::Animation, Some(&raw)) else {
            panic!("expected an animation event");
        };
        assert_eq!(animation.base.event_type, "animationiteration");
        assert_eq!(animation.animation_name, "pulse");
        assert_eq!(animation.elapsed_time, 2.0);
        assert_eq!(animation.pseudo_element, "::after");

        assert!(!animation.base.bubbles);
        assert!(!animation.base.is_trusted);
    }

    #[test]
    fn test_pointer_extends_mouse() {
        let raw = RawEvent::from(json!({
            "type": "pointerdown",
            "clientX": 9.0,
            "pointerId": 3,
            "pointerType": "pen",
            "pressure": 0.75,
            "isPrimary": true,
        }));
        let TypedEvent::Pointer(pointer) = decode(EventKind::Pointer, Some(&raw)) else {
            panic!("expected a pointer event");
        };
        assert_eq!(pointer.mouse.client_x, 9.0);
        assert_eq!(pointer.pointer_id, 3);
        assert_eq!(pointer.pointer_type, "pen");
        assert_eq!(pointer.pressure, 0.75);
        assert!(pointer.is_primary);
        assert_eq!(pointer.tilt_x, 0.0);
    }
}

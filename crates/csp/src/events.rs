//! Recognized inline event-handler attributes.
//!
//! Attribute names are matched ASCII case-insensitively as `on` + event name.

/// DOM event names, sorted for binary search.
pub const EVENT_NAMES: &[&str] = &[
    "abort", "auxclick", "beforeinput", "blur", "cancel", "canplay", "canplaythrough", "change",
    "click", "close", "contextmenu", "copy", "cuechange", "cut", "dblclick", "drag", "dragend",
    "dragenter", "dragleave", "dragover", "dragstart", "drop", "durationchange", "emptied",
    "ended", "error", "focus", "focusin", "focusout", "input", "invalid", "keydown", "keypress",
    "keyup", "load", "loadeddata", "loadedmetadata", "loadstart", "mousedown", "mouseenter",
    "mouseleave", "mousemove", "mouseout", "mouseover", "mouseup", "paste", "pause", "play",
    "playing", "pointercancel", "pointerdown", "pointerenter", "pointerleave", "pointermove",
    "pointerout", "pointerover", "pointerup", "progress", "ratechange", "reset", "resize",
    "scroll", "seeked", "seeking", "select", "stalled", "submit", "suspend", "timeupdate",
    "toggle", "touchcancel", "touchend", "touchmove", "touchstart", "volumechange", "waiting",
    "wheel",
];

const ATTR_PREFIX: &[u8] = b"on";
const MAX_EVENT_LEN: usize = 32;

/// The event an attribute name binds, if it is an inline handler attribute.
pub fn event_for_attribute(name: &str) -> Option<&'static str> {
    let bytes = name.as_bytes();
    if bytes.len() <= ATTR_PREFIX.len() || !bytes[..2].eq_ignore_ascii_case(ATTR_PREFIX) {
        return None;
    }
    let event = &bytes[2..];
    if event.len() > MAX_EVENT_LEN {
        return None;
    }
    let mut buf = [0u8; MAX_EVENT_LEN];
    let lowered = &mut buf[..event.len()];
    lowered.copy_from_slice(event);
    lowered.make_ascii_lowercase();
    let lowered: &[u8] = lowered;
    EVENT_NAMES
        .binary_search_by(|name| name.as_bytes().cmp(lowered))
        .ok()
        .map(|idx| EVENT_NAMES[idx])
}

pub fn is_event_attribute(name: &str) -> bool {
    event_for_attribute(name).is_some()
}

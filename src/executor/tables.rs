//! Static lookup tables: scroll direction glyphs and Android key codes.

use crate::step::params::Direction;

pub const KEYCODE_HOME: u32 = 3;
pub const KEYCODE_BACK: u32 = 4;
pub const KEYCODE_APP_SWITCH: u32 = 187;

/// Arrow glyph and label used in result messages.
pub fn direction_glyph(direction: Direction) -> (&'static str, &'static str) {
    match direction {
        Direction::Up => ("↑", "up"),
        Direction::Down => ("↓", "down"),
        Direction::Left => ("←", "left"),
        Direction::Right => ("→", "right"),
    }
}

const KEY_CODES: &[(&str, u32)] = &[
    ("home", KEYCODE_HOME),
    ("back", KEYCODE_BACK),
    ("call", 5),
    ("endcall", 6),
    ("dpad_up", 19),
    ("dpad_down", 20),
    ("dpad_left", 21),
    ("dpad_right", 22),
    ("dpad_center", 23),
    ("volume_up", 24),
    ("volume_down", 25),
    ("power", 26),
    ("camera", 27),
    ("tab", 61),
    ("space", 62),
    ("enter", 66),
    ("del", 67),
    ("delete", 67),
    ("backspace", 67),
    ("menu", 82),
    ("search", 84),
    ("media_play_pause", 85),
    ("page_up", 92),
    ("page_down", 93),
    ("escape", 111),
    ("forward_del", 112),
    ("volume_mute", 164),
    ("app_switch", KEYCODE_APP_SWITCH),
    ("recents", KEYCODE_APP_SWITCH),
    ("wakeup", 224),
    ("sleep", 223),
];

const GESTURE_KEYS: &[(&str, u32)] = &[
    ("back", KEYCODE_BACK),
    ("edge_back", KEYCODE_BACK),
    ("back_gesture", KEYCODE_BACK),
    ("swipe_back", KEYCODE_BACK),
    ("edge_left", KEYCODE_BACK),
    ("edge_right", KEYCODE_BACK),
    ("home", KEYCODE_HOME),
    ("home_gesture", KEYCODE_HOME),
    ("swipe_up_home", KEYCODE_HOME),
    ("recents", KEYCODE_APP_SWITCH),
    ("recents_gesture", KEYCODE_APP_SWITCH),
    ("app_switch", KEYCODE_APP_SWITCH),
];

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// Resolves `4`, `"4"`, `"KEYCODE_BACK"`, `"back"` alike.
pub fn key_code_for(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Ok(code) = trimmed.parse::<u32>() {
        return Some(code);
    }
    let name = normalize(trimmed);
    let name = name.strip_prefix("keycode_").unwrap_or(&name);
    KEY_CODES
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, code)| *code)
}

/// Key event equivalent to a system navigation gesture.
pub fn gesture_key_code(raw: &str) -> Option<u32> {
    let name = normalize(raw);
    GESTURE_KEYS
        .iter()
        .find(|(g, _)| *g == name)
        .map(|(_, code)| *code)
}

/// Symbolic name for a key code, for messages.
pub fn key_name(code: u32) -> Option<&'static str> {
    KEY_CODES.iter().find(|(_, c)| *c == code).map(|(k, _)| *k)
}

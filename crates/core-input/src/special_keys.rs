//! Static tables mapping host key identifiers and key codes to the editor's
//! special key names.

/// Host key identifier to editor key name.
pub const KEY_NAMES: &[(&str, &str)] = &[
    ("Escape", "Esc"),
    ("Backspace", "BS"),
    ("Tab", "Tab"),
    ("Enter", "CR"),
    ("PageUp", "PageUp"),
    ("PageDown", "PageDown"),
    ("End", "End"),
    ("Home", "Home"),
    ("ArrowLeft", "Left"),
    ("ArrowUp", "Up"),
    ("ArrowRight", "Right"),
    ("ArrowDown", "Down"),
    ("Insert", "Insert"),
    ("Delete", "Del"),
    ("Help", "Help"),
    ("<", "LT"),
    ("", "Nul"),
];

/// Numeric key code to editor key name, used when the host supplies no
/// key identifier. Code 188 is handled separately because it only names a
/// special key while Shift is held.
pub const KEY_CODES: &[(u32, &str)] = &[
    (0, "Nul"),
    (8, "BS"),
    (9, "Tab"),
    (10, "NL"),
    (13, "CR"),
    (27, "Esc"),
    (32, "Space"),
    (33, "PageUp"),
    (34, "PageDown"),
    (35, "End"),
    (36, "Home"),
    (37, "Left"),
    (38, "Up"),
    (39, "Right"),
    (40, "Down"),
    (45, "Insert"),
    (46, "Del"),
    (47, "Help"),
    (92, "Bslash"),
    (112, "F1"),
    (113, "F2"),
    (114, "F3"),
    (115, "F4"),
    (116, "F5"),
    (117, "F6"),
    (118, "F7"),
    (119, "F8"),
    (120, "F9"),
    (121, "F10"),
    (122, "F11"),
    (123, "F12"),
    (124, "Bar"),
    (127, "Del"),
];

const SHIFTED_LT_CODE: u32 = 188;

/// Editor name of a special key, or `None` when the key is ordinary text.
pub fn special_key_name(key: Option<&str>, code: u32, shift: bool) -> Option<String> {
    match key {
        Some(key) => by_identifier(key),
        None => by_code(code, shift).map(str::to_string),
    }
}

fn by_identifier(key: &str) -> Option<String> {
    let mut chars = key.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        return (first == '<').then(|| "LT".to_string());
    }
    if is_function_key(key) {
        return Some(key.to_string());
    }
    KEY_NAMES
        .iter()
        .find(|(id, _)| *id == key)
        .map(|(_, name)| (*name).to_string())
}

fn by_code(code: u32, shift: bool) -> Option<&'static str> {
    if code == SHIFTED_LT_CODE {
        return shift.then_some("LT");
    }
    KEY_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// `F` followed by at least one digit.
fn is_function_key(key: &str) -> bool {
    key.strip_prefix('F')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

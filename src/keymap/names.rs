//! Key names: printing and parsing of single keys and key combinations
//!
//! Keys print as `Mod+Mod+NAME`, combinations join keys with `-`:
//!
//! ```text
//! Ctrl+x          one key with a modifier
//! g-g             two-key chord
//! Ctrl++          Ctrl and the '+' key
//! a--             'a' followed by '-'
//! MBTN_LEFT_DBL   symbolic names are case-insensitive when parsed
//! ```

use super::binding::{Combo, MAX_COMBO_LEN};
use super::config::KeymapError;
use super::types::{KeyCode, Modifiers};

/// Symbolic key names. The first entry for a code is its canonical name,
/// later entries are accepted aliases.
static KEY_NAMES: &[(KeyCode, &str)] = &[
    (KeyCode::SPACE, "SPACE"),
    (KeyCode::char('#'), "SHARP"),
    (KeyCode::ENTER, "ENTER"),
    (KeyCode::TAB, "TAB"),
    (KeyCode::BACKSPACE, "BS"),
    (KeyCode::DELETE, "DEL"),
    (KeyCode::INSERT, "INS"),
    (KeyCode::HOME, "HOME"),
    (KeyCode::END, "END"),
    (KeyCode::PAGE_UP, "PGUP"),
    (KeyCode::PAGE_DOWN, "PGDWN"),
    (KeyCode::ESC, "ESC"),
    (KeyCode::PRINT, "PRINT"),
    (KeyCode::RIGHT, "RIGHT"),
    (KeyCode::LEFT, "LEFT"),
    (KeyCode::DOWN, "DOWN"),
    (KeyCode::UP, "UP"),
    (KeyCode::KP_DEC, "KP_DEC"),
    (KeyCode::KP_INS, "KP_INS"),
    (KeyCode::KP_DEL, "KP_DEL"),
    (KeyCode::KP_ENTER, "KP_ENTER"),
    (KeyCode::KP_ADD, "KP_ADD"),
    (KeyCode::KP_SUBTRACT, "KP_SUBTRACT"),
    (KeyCode::KP_MULTIPLY, "KP_MULTIPLY"),
    (KeyCode::KP_DIVIDE, "KP_DIVIDE"),
    (KeyCode::POWER, "POWER"),
    (KeyCode::MENU, "MENU"),
    (KeyCode::PLAY, "PLAY"),
    (KeyCode::PAUSE, "PAUSE"),
    (KeyCode::PLAYPAUSE, "PLAYPAUSE"),
    (KeyCode::STOP, "STOP"),
    (KeyCode::FORWARD, "FORWARD"),
    (KeyCode::REWIND, "REWIND"),
    (KeyCode::NEXT, "NEXT"),
    (KeyCode::PREV, "PREV"),
    (KeyCode::VOLUME_UP, "VOLUME_UP"),
    (KeyCode::VOLUME_DOWN, "VOLUME_DOWN"),
    (KeyCode::MUTE, "MUTE"),
    (KeyCode::RECORD, "RECORD"),
    (KeyCode::CHANNEL_UP, "CHANNEL_UP"),
    (KeyCode::CHANNEL_DOWN, "CHANNEL_DOWN"),
    (KeyCode::MBTN_LEFT, "MBTN_LEFT"),
    (KeyCode::MBTN_MID, "MBTN_MID"),
    (KeyCode::MBTN_RIGHT, "MBTN_RIGHT"),
    (KeyCode::MBTN_BACK, "MBTN_BACK"),
    (KeyCode::MBTN_FORWARD, "MBTN_FORWARD"),
    (KeyCode::WHEEL_UP, "WHEEL_UP"),
    (KeyCode::WHEEL_DOWN, "WHEEL_DOWN"),
    (KeyCode::WHEEL_LEFT, "WHEEL_LEFT"),
    (KeyCode::WHEEL_RIGHT, "WHEEL_RIGHT"),
    (KeyCode::MBTN_LEFT_DBL, "MBTN_LEFT_DBL"),
    (KeyCode::MBTN_MID_DBL, "MBTN_MID_DBL"),
    (KeyCode::MBTN_RIGHT_DBL, "MBTN_RIGHT_DBL"),
    (KeyCode::GAMEPAD_ACTION_DOWN, "GAMEPAD_ACTION_DOWN"),
    (KeyCode::GAMEPAD_ACTION_RIGHT, "GAMEPAD_ACTION_RIGHT"),
    (KeyCode::GAMEPAD_ACTION_LEFT, "GAMEPAD_ACTION_LEFT"),
    (KeyCode::GAMEPAD_ACTION_UP, "GAMEPAD_ACTION_UP"),
    (KeyCode::GAMEPAD_BACK, "GAMEPAD_BACK"),
    (KeyCode::GAMEPAD_MENU, "GAMEPAD_MENU"),
    (KeyCode::GAMEPAD_START, "GAMEPAD_START"),
    (KeyCode::GAMEPAD_LEFT_SHOULDER, "GAMEPAD_LEFT_SHOULDER"),
    (KeyCode::GAMEPAD_RIGHT_SHOULDER, "GAMEPAD_RIGHT_SHOULDER"),
    (KeyCode::GAMEPAD_LEFT_TRIGGER, "GAMEPAD_LEFT_TRIGGER"),
    (KeyCode::GAMEPAD_RIGHT_TRIGGER, "GAMEPAD_RIGHT_TRIGGER"),
    (KeyCode::GAMEPAD_LEFT_STICK, "GAMEPAD_LEFT_STICK"),
    (KeyCode::GAMEPAD_RIGHT_STICK, "GAMEPAD_RIGHT_STICK"),
    (KeyCode::GAMEPAD_DPAD_UP, "GAMEPAD_DPAD_UP"),
    (KeyCode::GAMEPAD_DPAD_DOWN, "GAMEPAD_DPAD_DOWN"),
    (KeyCode::GAMEPAD_DPAD_LEFT, "GAMEPAD_DPAD_LEFT"),
    (KeyCode::GAMEPAD_DPAD_RIGHT, "GAMEPAD_DPAD_RIGHT"),
    (KeyCode::CLOSE_WIN, "CLOSE_WIN"),
    (KeyCode::MOUSE_MOVE, "MOUSE_MOVE"),
    (KeyCode::MOUSE_LEAVE, "MOUSE_LEAVE"),
    (KeyCode::MOUSE_ENTER, "MOUSE_ENTER"),
    (KeyCode::UNMAPPED, "UNMAPPED"),
    // Aliases
    (KeyCode::BACKSPACE, "BACKSPACE"),
    (KeyCode::DELETE, "DELETE"),
    (KeyCode::INSERT, "INSERT"),
    (KeyCode::PAGE_UP, "PAGEUP"),
    (KeyCode::PAGE_DOWN, "PAGEDOWN"),
    (KeyCode::ENTER, "RETURN"),
    (KeyCode::ESC, "ESCAPE"),
    (KeyCode::WHEEL_UP, "AXIS_UP"),
    (KeyCode::WHEEL_DOWN, "AXIS_DOWN"),
    (KeyCode::WHEEL_LEFT, "AXIS_LEFT"),
    (KeyCode::WHEEL_RIGHT, "AXIS_RIGHT"),
    (KeyCode::MBTN_LEFT, "MOUSE_BTN0"),
    (KeyCode::MBTN_MID, "MOUSE_BTN1"),
    (KeyCode::MBTN_RIGHT, "MOUSE_BTN2"),
    (KeyCode::WHEEL_UP, "MOUSE_BTN3"),
    (KeyCode::WHEEL_DOWN, "MOUSE_BTN4"),
    (KeyCode::WHEEL_LEFT, "MOUSE_BTN5"),
    (KeyCode::WHEEL_RIGHT, "MOUSE_BTN6"),
    (KeyCode::MBTN_BACK, "MOUSE_BTN7"),
    (KeyCode::MBTN_FORWARD, "MOUSE_BTN8"),
    (KeyCode::MBTN_LEFT_DBL, "MOUSE_BTN0_DBL"),
    (KeyCode::MBTN_MID_DBL, "MOUSE_BTN1_DBL"),
    (KeyCode::MBTN_RIGHT_DBL, "MOUSE_BTN2_DBL"),
    (KeyCode::PLAY, "XF86_PLAY"),
    (KeyCode::PAUSE, "XF86_PAUSE"),
    (KeyCode::STOP, "XF86_STOP"),
    (KeyCode::PREV, "XF86_PREV"),
    (KeyCode::NEXT, "XF86_NEXT"),
    (KeyCode::POWER, "XF86_POWER"),
    (KeyCode::MENU, "XF86_MENU"),
];

/// Numbered key families such as `F1`..`F24`, named `<prefix><n><suffix>`
struct NumberedFamily {
    prefix: &'static str,
    suffix: &'static str,
    first: u32,
    last: u32,
    code: fn(u32) -> KeyCode,
}

static FAMILIES: &[NumberedFamily] = &[
    NumberedFamily {
        prefix: "F",
        suffix: "",
        first: 1,
        last: 24,
        code: KeyCode::function,
    },
    NumberedFamily {
        prefix: "KP",
        suffix: "",
        first: 0,
        last: 9,
        code: KeyCode::keypad,
    },
    NumberedFamily {
        prefix: "MBTN",
        suffix: "_DBL",
        first: 3,
        last: 19,
        code: KeyCode::mouse_button_dbl,
    },
    NumberedFamily {
        prefix: "MBTN",
        suffix: "",
        first: 3,
        last: 19,
        code: KeyCode::mouse_button,
    },
    NumberedFamily {
        prefix: "MOUSE_BTN",
        suffix: "_DBL",
        first: 3,
        last: 19,
        code: KeyCode::mouse_button_dbl,
    },
    NumberedFamily {
        prefix: "MOUSE_BTN",
        suffix: "",
        first: 9,
        last: 19,
        code: KeyCode::mouse_button,
    },
];

static MODIFIER_NAMES: &[(&str, Modifiers)] = &[
    ("shift", Modifiers::SHIFT),
    ("ctrl", Modifiers::CTRL),
    ("alt", Modifiers::ALT),
    ("meta", Modifiers::META),
];

fn modifier_from_name(name: &str) -> Option<Modifiers> {
    MODIFIER_NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, m)| *m)
}

fn base_name(base: KeyCode) -> Option<String> {
    if let Some((_, name)) = KEY_NAMES.iter().find(|(code, _)| *code == base) {
        return Some((*name).to_string());
    }
    FAMILIES.iter().find_map(|family| {
        (family.first..=family.last)
            .find(|n| (family.code)(*n) == base)
            .map(|n| format!("{}{}{}", family.prefix, n, family.suffix))
    })
}

fn base_from_name(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::char(c));
    }
    if let Some(hex) = name.strip_prefix("0x") {
        return u32::from_str_radix(hex, 16).ok().map(KeyCode::from_raw);
    }
    if let Some((code, _)) = KEY_NAMES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
    {
        return Some(*code);
    }
    let upper = name.to_ascii_uppercase();
    FAMILIES.iter().find_map(|family| {
        let digits = upper
            .strip_prefix(family.prefix)?
            .strip_suffix(family.suffix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u32 = digits.parse().ok()?;
        (family.first..=family.last)
            .contains(&n)
            .then(|| (family.code)(n))
    })
}

/// Human-readable name of a single key, e.g. `Ctrl+LEFT` or `Shift+F5`
pub fn key_name(code: KeyCode) -> String {
    let base = code.base();
    let name = base_name(base).unwrap_or_else(|| {
        match char::from_u32(base.raw()).filter(|_| base.is_unicode()) {
            Some(c) => c.to_string(),
            None => format!("0x{:x}", base.raw()),
        }
    });
    format!("{}{}", code.mods(), name)
}

/// Name of a key sequence, keys joined with `-`
pub fn combo_name(keys: &[KeyCode]) -> String {
    keys.iter()
        .map(|k| key_name(*k))
        .collect::<Vec<_>>()
        .join("-")
}

/// Parse a single key name with optional modifier prefixes.
///
/// The result is normalized, so `Shift+a` parses to `A`.
pub fn key_from_name(name: &str) -> Option<KeyCode> {
    let mut mods = Modifiers::NONE;
    let mut rest = name;
    while let Some(idx) = rest.find('+') {
        // A trailing '+' is the key itself
        if idx + 1 >= rest.len() {
            break;
        }
        match modifier_from_name(&rest[..idx]) {
            Some(m) => {
                mods = mods | m;
                rest = &rest[idx + 1..];
            }
            None => break,
        }
    }
    if rest.is_empty() {
        return None;
    }
    base_from_name(rest).map(|base| (base | mods).normalize())
}

/// Length in bytes of the modifier prefix (`Ctrl+Shift+`) at the start of `s`
fn modifier_prefix_len(s: &str) -> usize {
    let mut pos = 0;
    while let Some(idx) = s[pos..].find('+') {
        let end = pos + idx;
        if end + 1 >= s.len() || modifier_from_name(&s[pos..end]).is_none() {
            break;
        }
        pos = end + 1;
    }
    pos
}

/// Parse a `-`-separated key combination of at most four keys
pub fn combo_from_name(name: &str) -> Result<Combo, KeymapError> {
    if name.is_empty() {
        return Err(KeymapError::EmptyCombo);
    }

    let mut keys = Vec::with_capacity(MAX_COMBO_LEN);
    let mut rest = name;
    loop {
        let key_start = modifier_prefix_len(rest);
        let key_end = match rest[key_start..].chars().next() {
            None => return Err(KeymapError::InvalidKey(name.to_string())),
            // '-' and '+' in key position are data, never separators
            Some(c @ ('-' | '+')) => key_start + c.len_utf8(),
            Some(_) => rest[key_start..]
                .find('-')
                .map_or(rest.len(), |idx| key_start + idx),
        };

        let token = &rest[..key_end];
        let key =
            key_from_name(token).ok_or_else(|| KeymapError::InvalidKey(token.to_string()))?;
        keys.push(key);
        if keys.len() > MAX_COMBO_LEN {
            return Err(KeymapError::ComboTooLong(name.to_string()));
        }

        if key_end == rest.len() {
            break;
        }
        if !rest[key_end..].starts_with('-') || key_end + 1 == rest.len() {
            return Err(KeymapError::InvalidKey(name.to_string()));
        }
        rest = &rest[key_end + 1..];
    }

    Combo::new(keys)
}

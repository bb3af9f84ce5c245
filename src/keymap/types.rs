//! Core types for the keymap system: KeyCode, Modifiers, KeyState
//!
//! A [`KeyCode`] is a packed `u32`:
//!
//! ```text
//! bit  0..=20  Unicode codepoint, or KEY_BASE + n for symbolic keys
//! bit  21      KEY_BASE marker
//! bit  22..=25 Shift, Ctrl, Alt, Meta
//! bit  26      EMIT_ON_UP (part of the key identity, set on mouse buttons)
//! bit  27      NO_REPEAT  (part of the key identity)
//! bit  28..=30 DOWN, UP, SET_ONLY
//! ```

use std::fmt;

const KEY_BASE: u32 = 1 << 21;

const MOD_SHIFT: u32 = 1 << 22;
const MOD_CTRL: u32 = 1 << 23;
const MOD_ALT: u32 = 1 << 24;
const MOD_META: u32 = 1 << 25;
const MODIFIER_MASK: u32 = MOD_SHIFT | MOD_CTRL | MOD_ALT | MOD_META;

const EMIT_ON_UP: u32 = 1 << 26;
const NO_REPEAT: u32 = 1 << 27;

const STATE_DOWN: u32 = 1 << 28;
const STATE_UP: u32 = 1 << 29;
const STATE_SET_ONLY: u32 = 1 << 30;
const STATE_MASK: u32 = STATE_DOWN | STATE_UP | STATE_SET_ONLY;

const MBTN_BASE: u32 = (KEY_BASE + 0xA0) | NO_REPEAT | EMIT_ON_UP;
const WHEEL_BASE: u32 = (KEY_BASE + 0xC0) | NO_REPEAT;
const MBTN_DBL_BASE: u32 = (KEY_BASE + 0xE0) | NO_REPEAT;
const GAMEPAD_BASE: u32 = KEY_BASE + 0x200;
const INTERNAL_BASE: u32 = (KEY_BASE + 0x1000) | NO_REPEAT;

/// Number of mouse buttons with dedicated codes (and double-click variants)
pub const MOUSE_BUTTON_COUNT: u32 = 20;

/// Modifier keys as a bitfield, stored at their packed key-code positions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(MOD_SHIFT);
    pub const CTRL: Modifiers = Modifiers(MOD_CTRL);
    pub const ALT: Modifiers = Modifiers(MOD_ALT);
    pub const META: Modifiers = Modifiers(MOD_META);

    /// Create modifiers from individual flags
    pub const fn new(ctrl: bool, shift: bool, alt: bool, meta: bool) -> Self {
        let mut bits = 0u32;
        if ctrl {
            bits |= MOD_CTRL;
        }
        if shift {
            bits |= MOD_SHIFT;
        }
        if alt {
            bits |= MOD_ALT;
        }
        if meta {
            bits |= MOD_META;
        }
        Modifiers(bits)
    }

    /// Check if ctrl is held
    #[inline]
    pub const fn ctrl(self) -> bool {
        self.0 & MOD_CTRL != 0
    }

    /// Check if shift is held
    #[inline]
    pub const fn shift(self) -> bool {
        self.0 & MOD_SHIFT != 0
    }

    /// Check if alt is held
    #[inline]
    pub const fn alt(self) -> bool {
        self.0 & MOD_ALT != 0
    }

    /// Check if meta (cmd/win) is held
    #[inline]
    pub const fn meta(self) -> bool {
        self.0 & MOD_META != 0
    }

    /// Check if no modifiers are held
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Combine two modifier sets
    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// Check if this contains all modifiers in other
    #[inline]
    pub const fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for Modifiers {
    /// Prints the `+`-terminated prefix used in key names, e.g. `Shift+Ctrl+`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shift() {
            f.write_str("Shift+")?;
        }
        if self.ctrl() {
            f.write_str("Ctrl+")?;
        }
        if self.alt() {
            f.write_str("Alt+")?;
        }
        if self.meta() {
            f.write_str("Meta+")?;
        }
        Ok(())
    }
}

/// Edge information carried by a key event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyState {
    /// A complete press with no separate up/down events
    Press,
    Down,
    Up,
    /// Mark the key as held without dispatching anything
    SetOnly,
}

/// A packed key code: base key, modifiers and edge state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(u32);

impl KeyCode {
    /// Empty slot in key history
    pub const NONE: KeyCode = KeyCode(0);

    pub const TAB: KeyCode = KeyCode(9);
    pub const ENTER: KeyCode = KeyCode(13);
    pub const SPACE: KeyCode = KeyCode(' ' as u32);

    pub const BACKSPACE: KeyCode = KeyCode(KEY_BASE);
    pub const DELETE: KeyCode = KeyCode(KEY_BASE + 1);
    pub const INSERT: KeyCode = KeyCode(KEY_BASE + 2);
    pub const HOME: KeyCode = KeyCode(KEY_BASE + 3);
    pub const END: KeyCode = KeyCode(KEY_BASE + 4);
    pub const PAGE_UP: KeyCode = KeyCode(KEY_BASE + 5);
    pub const PAGE_DOWN: KeyCode = KeyCode(KEY_BASE + 6);
    pub const ESC: KeyCode = KeyCode(KEY_BASE + 7);
    pub const PRINT: KeyCode = KeyCode(KEY_BASE + 8);
    pub const RIGHT: KeyCode = KeyCode(KEY_BASE + 9);
    pub const LEFT: KeyCode = KeyCode(KEY_BASE + 10);
    pub const DOWN: KeyCode = KeyCode(KEY_BASE + 11);
    pub const UP: KeyCode = KeyCode(KEY_BASE + 12);

    // F1..F24 live at KEY_BASE + 0x40 + n, see `KeyCode::function`
    // KP0..KP9 live at KEY_BASE + 0x60 + n, see `KeyCode::keypad`
    pub const KP_DEC: KeyCode = KeyCode(KEY_BASE + 0x6A);
    pub const KP_INS: KeyCode = KeyCode(KEY_BASE + 0x6B);
    pub const KP_DEL: KeyCode = KeyCode(KEY_BASE + 0x6C);
    pub const KP_ENTER: KeyCode = KeyCode(KEY_BASE + 0x6D);
    pub const KP_ADD: KeyCode = KeyCode(KEY_BASE + 0x6E);
    pub const KP_SUBTRACT: KeyCode = KeyCode(KEY_BASE + 0x6F);
    pub const KP_MULTIPLY: KeyCode = KeyCode(KEY_BASE + 0x70);
    pub const KP_DIVIDE: KeyCode = KeyCode(KEY_BASE + 0x71);

    // Media and remote control keys
    pub const POWER: KeyCode = KeyCode(KEY_BASE + 0x80);
    pub const MENU: KeyCode = KeyCode(KEY_BASE + 0x81);
    pub const PLAY: KeyCode = KeyCode(KEY_BASE + 0x82);
    pub const PAUSE: KeyCode = KeyCode(KEY_BASE + 0x83);
    pub const PLAYPAUSE: KeyCode = KeyCode(KEY_BASE + 0x84);
    pub const STOP: KeyCode = KeyCode(KEY_BASE + 0x85);
    pub const FORWARD: KeyCode = KeyCode(KEY_BASE + 0x86);
    pub const REWIND: KeyCode = KeyCode(KEY_BASE + 0x87);
    pub const NEXT: KeyCode = KeyCode(KEY_BASE + 0x88);
    pub const PREV: KeyCode = KeyCode(KEY_BASE + 0x89);
    pub const VOLUME_UP: KeyCode = KeyCode(KEY_BASE + 0x8A);
    pub const VOLUME_DOWN: KeyCode = KeyCode(KEY_BASE + 0x8B);
    pub const MUTE: KeyCode = KeyCode(KEY_BASE + 0x8C);
    pub const RECORD: KeyCode = KeyCode(KEY_BASE + 0x8D);
    pub const CHANNEL_UP: KeyCode = KeyCode(KEY_BASE + 0x8E);
    pub const CHANNEL_DOWN: KeyCode = KeyCode(KEY_BASE + 0x8F);

    pub const MBTN_LEFT: KeyCode = KeyCode(MBTN_BASE);
    pub const MBTN_MID: KeyCode = KeyCode(MBTN_BASE + 1);
    pub const MBTN_RIGHT: KeyCode = KeyCode(MBTN_BASE + 2);
    pub const MBTN_BACK: KeyCode = KeyCode(MBTN_BASE + 7);
    pub const MBTN_FORWARD: KeyCode = KeyCode(MBTN_BASE + 8);

    pub const WHEEL_UP: KeyCode = KeyCode(WHEEL_BASE);
    pub const WHEEL_DOWN: KeyCode = KeyCode(WHEEL_BASE + 1);
    pub const WHEEL_LEFT: KeyCode = KeyCode(WHEEL_BASE + 2);
    pub const WHEEL_RIGHT: KeyCode = KeyCode(WHEEL_BASE + 3);

    pub const MBTN_LEFT_DBL: KeyCode = KeyCode(MBTN_DBL_BASE);
    pub const MBTN_MID_DBL: KeyCode = KeyCode(MBTN_DBL_BASE + 1);
    pub const MBTN_RIGHT_DBL: KeyCode = KeyCode(MBTN_DBL_BASE + 2);

    pub const GAMEPAD_ACTION_DOWN: KeyCode = KeyCode(GAMEPAD_BASE);
    pub const GAMEPAD_ACTION_RIGHT: KeyCode = KeyCode(GAMEPAD_BASE + 1);
    pub const GAMEPAD_ACTION_LEFT: KeyCode = KeyCode(GAMEPAD_BASE + 2);
    pub const GAMEPAD_ACTION_UP: KeyCode = KeyCode(GAMEPAD_BASE + 3);
    pub const GAMEPAD_BACK: KeyCode = KeyCode(GAMEPAD_BASE + 4);
    pub const GAMEPAD_MENU: KeyCode = KeyCode(GAMEPAD_BASE + 5);
    pub const GAMEPAD_START: KeyCode = KeyCode(GAMEPAD_BASE + 6);
    pub const GAMEPAD_LEFT_SHOULDER: KeyCode = KeyCode(GAMEPAD_BASE + 7);
    pub const GAMEPAD_RIGHT_SHOULDER: KeyCode = KeyCode(GAMEPAD_BASE + 8);
    pub const GAMEPAD_LEFT_TRIGGER: KeyCode = KeyCode(GAMEPAD_BASE + 9);
    pub const GAMEPAD_RIGHT_TRIGGER: KeyCode = KeyCode(GAMEPAD_BASE + 10);
    pub const GAMEPAD_LEFT_STICK: KeyCode = KeyCode(GAMEPAD_BASE + 11);
    pub const GAMEPAD_RIGHT_STICK: KeyCode = KeyCode(GAMEPAD_BASE + 12);
    pub const GAMEPAD_DPAD_UP: KeyCode = KeyCode(GAMEPAD_BASE + 13);
    pub const GAMEPAD_DPAD_DOWN: KeyCode = KeyCode(GAMEPAD_BASE + 14);
    pub const GAMEPAD_DPAD_LEFT: KeyCode = KeyCode(GAMEPAD_BASE + 15);
    pub const GAMEPAD_DPAD_RIGHT: KeyCode = KeyCode(GAMEPAD_BASE + 16);

    /// Window close request; resolves to `quit` when nothing is bound
    pub const CLOSE_WIN: KeyCode = KeyCode(INTERNAL_BASE);
    pub const MOUSE_MOVE: KeyCode = KeyCode(INTERNAL_BASE + 1);
    pub const MOUSE_LEAVE: KeyCode = KeyCode(INTERNAL_BASE + 2);
    pub const MOUSE_ENTER: KeyCode = KeyCode(INTERNAL_BASE + 3);
    /// Catch-all binding consulted when nothing else matched
    pub const UNMAPPED: KeyCode = KeyCode(INTERNAL_BASE + 4);
    /// Release whatever key is currently held
    pub const RELEASE_ALL: KeyCode = KeyCode(INTERNAL_BASE + 5);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        KeyCode(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Key code for a Unicode character
    #[inline]
    pub const fn char(c: char) -> Self {
        KeyCode(c as u32)
    }

    /// Function key `F<n>`, n in 1..=24
    pub const fn function(n: u32) -> Self {
        KeyCode(KEY_BASE + 0x40 + n)
    }

    /// Keypad digit `KP<n>`, n in 0..=9
    pub const fn keypad(n: u32) -> Self {
        KeyCode(KEY_BASE + 0x60 + n)
    }

    /// Mouse button `n` (0 = left, 1 = middle, 2 = right)
    pub const fn mouse_button(n: u32) -> Self {
        KeyCode(MBTN_BASE + n)
    }

    /// Double-click variant of mouse button `n`
    pub const fn mouse_button_dbl(n: u32) -> Self {
        KeyCode(MBTN_DBL_BASE + n)
    }

    /// The key without modifiers or state, identity flags included
    #[inline]
    pub const fn base(self) -> KeyCode {
        KeyCode(self.0 & !(MODIFIER_MASK | STATE_MASK))
    }

    #[inline]
    pub const fn mods(self) -> Modifiers {
        Modifiers(self.0 & MODIFIER_MASK)
    }

    #[inline]
    pub const fn with_mods(self, mods: Modifiers) -> KeyCode {
        KeyCode(self.0 | mods.0)
    }

    /// The key with modifiers but without edge state
    #[inline]
    pub const fn without_state(self) -> KeyCode {
        KeyCode(self.0 & !STATE_MASK)
    }

    pub const fn state(self) -> KeyState {
        if self.0 & STATE_DOWN != 0 {
            KeyState::Down
        } else if self.0 & STATE_UP != 0 {
            KeyState::Up
        } else if self.0 & STATE_SET_ONLY != 0 {
            KeyState::SetOnly
        } else {
            KeyState::Press
        }
    }

    /// Replace the edge state of this key
    pub const fn with_state(self, state: KeyState) -> KeyCode {
        let bits = match state {
            KeyState::Press => 0,
            KeyState::Down => STATE_DOWN,
            KeyState::Up => STATE_UP,
            KeyState::SetOnly => STATE_SET_ONLY,
        };
        KeyCode((self.0 & !STATE_MASK) | bits)
    }

    #[inline]
    pub const fn down(self) -> KeyCode {
        self.with_state(KeyState::Down)
    }

    #[inline]
    pub const fn up(self) -> KeyCode {
        self.with_state(KeyState::Up)
    }

    /// Fold Shift into the case of ASCII letters.
    ///
    /// `Shift+a` becomes `A`; every other key keeps its modifiers. Edge state
    /// is carried over unchanged, and the result is a fixed point.
    pub const fn normalize(self) -> KeyCode {
        let state = self.0 & STATE_MASK;
        let mut mods = self.0 & MODIFIER_MASK;
        let mut base = self.0 & !(MODIFIER_MASK | STATE_MASK);
        if base >= b'a' as u32 && base <= b'z' as u32 && mods & MOD_SHIFT != 0 {
            base -= 0x20;
            mods &= !MOD_SHIFT;
        }
        KeyCode(base | mods | state)
    }

    /// Printable Unicode codepoint (no modifiers considered)
    pub const fn is_unicode(self) -> bool {
        let base = self.base().0;
        base >= 32 && base <= 0x10FFFF
    }

    pub const fn is_mouse_button(self) -> bool {
        let base = self.base().0;
        base >= MBTN_BASE && base < MBTN_BASE + MOUSE_BUTTON_COUNT
    }

    pub const fn is_mouse_button_dbl(self) -> bool {
        let base = self.base().0;
        base >= MBTN_DBL_BASE && base < MBTN_DBL_BASE + MOUSE_BUTTON_COUNT
    }

    pub const fn is_wheel(self) -> bool {
        let base = self.base().0;
        base >= WHEEL_BASE && base <= WHEEL_BASE + 3
    }

    pub const fn is_mouse_move(self) -> bool {
        self.base().0 == Self::MOUSE_MOVE.0
    }

    /// Mouse buttons, double clicks, wheel and pointer movement
    pub const fn is_mouse(self) -> bool {
        let base = self.base();
        self.depends_on_mouse_pos()
            || base.0 == Self::MOUSE_ENTER.0
            || base.0 == Self::MOUSE_LEAVE.0
    }

    /// Keys whose binding is gated by the section's mouse area
    pub const fn depends_on_mouse_pos(self) -> bool {
        self.is_mouse_button() || self.is_mouse_button_dbl() || self.is_wheel() || self.is_mouse_move()
    }

    #[inline]
    pub const fn is_no_repeat(self) -> bool {
        self.0 & NO_REPEAT != 0
    }

    #[inline]
    pub const fn emits_on_up(self) -> bool {
        self.0 & EMIT_ON_UP != 0
    }

    /// Double-click variant for the left, middle and right buttons
    pub const fn double_click_variant(self) -> Option<KeyCode> {
        if self.0 >= Self::MBTN_LEFT.0 && self.0 <= Self::MBTN_RIGHT.0 {
            Some(KeyCode(self.0 - MBTN_BASE + MBTN_DBL_BASE))
        } else {
            None
        }
    }
}

impl std::ops::BitOr<Modifiers> for KeyCode {
    type Output = KeyCode;

    fn bitor(self, rhs: Modifiers) -> Self::Output {
        self.with_mods(rhs)
    }
}

impl From<char> for KeyCode {
    fn from(c: char) -> Self {
        KeyCode::char(c)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::names::key_name(*self))
    }
}

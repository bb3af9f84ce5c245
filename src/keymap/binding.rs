//! Binding struct mapping a key combination to command text

use std::fmt;

use super::config::KeymapError;
use super::names::combo_name;
use super::types::KeyCode;

/// Longest supported key combination
pub const MAX_COMBO_LEN: usize = 4;

/// An ordered sequence of 1..=4 keys, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combo(Vec<KeyCode>);

impl Combo {
    pub fn new(keys: Vec<KeyCode>) -> Result<Self, KeymapError> {
        if keys.is_empty() {
            return Err(KeymapError::EmptyCombo);
        }
        if keys.len() > MAX_COMBO_LEN {
            return Err(KeymapError::ComboTooLong(combo_name(&keys)));
        }
        Ok(Combo(keys))
    }

    /// Combo of a single key
    pub fn single(key: KeyCode) -> Self {
        Combo(vec![key])
    }

    pub fn keys(&self) -> &[KeyCode] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the combo against recent keys, newest first.
    ///
    /// The combo matches when it equals the tail of the key sequence ending
    /// at `recent[0]`.
    pub fn matches(&self, recent: &[KeyCode]) -> bool {
        let len = self.0.len();
        len <= recent.len() && (0..len).all(|i| self.0[i] == recent[len - 1 - i])
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&combo_name(&self.0))
    }
}

/// Recently pressed keys, newest first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyHistory([KeyCode; MAX_COMBO_LEN]);

impl KeyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a key, dropping the oldest
    pub fn push(&mut self, code: KeyCode) {
        self.0.copy_within(0..MAX_COMBO_LEN - 1, 1);
        self.0[0] = code;
    }

    /// Copy of the history with `code` pushed, as used for matching
    pub fn with(&self, code: KeyCode) -> KeyHistory {
        let mut next = *self;
        next.push(code);
        next
    }

    pub fn clear(&mut self) {
        self.0 = [KeyCode::NONE; MAX_COMBO_LEN];
    }

    pub fn keys(&self) -> &[KeyCode] {
        &self.0
    }
}

/// A single binding in a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub combo: Combo,
    /// Command text handed to the command parser
    pub command: String,
    /// Where the binding came from, `file:line` or a caller-supplied tag
    pub location: String,
    pub builtin: bool,
    /// Name of the owning section
    pub section: String,
}

impl Binding {
    pub fn new(
        section: impl Into<String>,
        combo: Combo,
        command: impl Into<String>,
        location: impl Into<String>,
        builtin: bool,
    ) -> Self {
        Self {
            combo,
            command: command.into(),
            location: location.into(),
            builtin,
            section: section.into(),
        }
    }

    /// Same replacement identity: equal combo and builtin flag
    pub fn same_slot(&self, combo: &Combo, builtin: bool) -> bool {
        self.builtin == builtin && self.combo == *combo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> KeyCode {
        KeyCode::char(c)
    }

    #[test]
    fn test_combo_limits() {
        assert!(matches!(Combo::new(vec![]), Err(KeymapError::EmptyCombo)));
        assert!(Combo::new(vec![key('a'); 4]).is_ok());
        assert!(matches!(
            Combo::new(vec![key('a'); 5]),
            Err(KeymapError::ComboTooLong(_))
        ));
    }

    #[test]
    fn test_history_is_newest_first() {
        let mut history = KeyHistory::new();
        for c in ['a', 'b', 'c', 'd', 'e'] {
            history.push(key(c));
        }
        assert_eq!(history.keys(), &[key('e'), key('d'), key('c'), key('b')]);
        history.clear();
        assert_eq!(history.keys(), &[KeyCode::NONE; MAX_COMBO_LEN]);
    }

    #[test]
    fn test_chord_matches_tail_in_order() {
        let mut history = KeyHistory::new();
        history.push(key('b'));
        let recent = history.with(key('a'));

        let chord = Combo::new(vec![key('b'), key('a')]).unwrap();
        let reversed = Combo::new(vec![key('a'), key('b')]).unwrap();
        assert!(chord.matches(recent.keys()));
        assert!(!reversed.matches(recent.keys()));
        assert!(Combo::single(key('a')).matches(recent.keys()));
        assert!(!Combo::single(key('b')).matches(recent.keys()));
    }

    #[test]
    fn test_same_slot() {
        let combo = Combo::single(key('x'));
        let binding = Binding::new("default", combo.clone(), "quit", "test:1", false);
        assert!(binding.same_slot(&combo, false));
        assert!(!binding.same_slot(&combo, true));
    }
}

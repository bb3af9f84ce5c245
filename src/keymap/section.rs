//! Named binding sections and the table that owns them

use std::collections::HashMap;

use super::binding::{Binding, Combo};
use super::types::KeyCode;

/// Name used when a caller passes an empty section name
pub const DEFAULT_SECTION: &str = "default";

/// Half-open rectangle in window coordinates: `x0 <= x < x1`, `y0 <= y < y1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub const WHOLE_PLANE: Rect = Rect {
        x0: i32::MIN,
        y0: i32::MIN,
        x1: i32::MAX,
        y1: i32::MAX,
    };

    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && y >= self.y0 && x < self.x1 && y < self.y1
    }

    pub fn is_degenerate(&self) -> bool {
        self.x0 == self.x1 || self.y0 == self.y1
    }
}

/// Region of the window a section's mouse bindings apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseArea {
    /// No area testing; mouse bindings match anywhere
    Unset,
    Rect(Rect),
}

impl MouseArea {
    /// Area from a rectangle; zero width or height means unset
    pub fn from_rect(rect: Rect) -> Self {
        if rect.is_degenerate() {
            MouseArea::Unset
        } else {
            MouseArea::Rect(rect)
        }
    }

    /// Gate for mouse-dependent bindings
    pub fn admits(&self, x: i32, y: i32) -> bool {
        match self {
            MouseArea::Unset => true,
            MouseArea::Rect(rect) => rect.contains(x, y),
        }
    }

    /// Hit test used for cursor-hiding and window-drag decisions; an unset
    /// area never claims the pointer.
    pub fn hit(&self, x: i32, y: i32) -> bool {
        match self {
            MouseArea::Unset => false,
            MouseArea::Rect(rect) => rect.contains(x, y),
        }
    }
}

impl Default for MouseArea {
    fn default() -> Self {
        MouseArea::Rect(Rect::WHOLE_PLANE)
    }
}

/// A named group of bindings
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub bindings: Vec<Binding>,
    /// Client that defined this section, if any
    pub owner: Option<String>,
    pub mouse_area: MouseArea,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bindings: Vec::new(),
            owner: None,
            mouse_area: MouseArea::default(),
        }
    }

    /// Longest binding matching `recent` (newest first) with the given
    /// builtin flag. Ties go to the earlier binding.
    pub fn best_match(&self, recent: &[KeyCode], builtin: bool) -> Option<&Binding> {
        let mut best: Option<&Binding> = None;
        for binding in self.bindings.iter().filter(|b| b.builtin == builtin) {
            if !binding.combo.matches(recent) {
                continue;
            }
            if best.map_or(true, |b| binding.combo.len() > b.combo.len()) {
                best = Some(binding);
            }
        }
        best
    }

    fn add_or_replace(&mut self, binding: Binding) {
        match self
            .bindings
            .iter_mut()
            .find(|b| b.same_slot(&binding.combo, binding.builtin))
        {
            Some(existing) => *existing = binding,
            None => self.bindings.push(binding),
        }
    }

    fn remove_bindings(&mut self, builtin: bool) {
        let mut i = 0;
        while i < self.bindings.len() {
            if self.bindings[i].builtin == builtin {
                self.bindings.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }
}

/// All sections known to the engine, in creation order.
///
/// Sections are created on first reference and never deleted, only emptied.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

fn section_name(name: &str) -> &str {
    if name.is_empty() {
        DEFAULT_SECTION
    } else {
        name
    }
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.index
            .get(section_name(name))
            .map(|&idx| &self.sections[idx])
    }

    /// Get or create the named section
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        let name = section_name(name);
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                let idx = self.sections.len();
                self.sections.push(Section::new(name));
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.sections[idx]
    }

    /// Add a binding, replacing one with the same combo and builtin flag
    pub fn bind(
        &mut self,
        section: &str,
        builtin: bool,
        combo: Combo,
        command: impl Into<String>,
        location: impl Into<String>,
    ) {
        let section = self.section_mut(section);
        let binding = Binding::new(section.name.clone(), combo, command, location, builtin);
        section.add_or_replace(binding);
    }

    /// Remove one binding; returns whether it existed
    pub fn unbind(&mut self, section: &str, builtin: bool, combo: &Combo) -> bool {
        let section = self.section_mut(section);
        match section
            .bindings
            .iter()
            .position(|b| b.same_slot(combo, builtin))
        {
            Some(idx) => {
                section.bindings.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove every binding with the given builtin flag. Order of the
    /// remaining bindings is not preserved.
    pub fn remove_bindings(&mut self, section: &str, builtin: bool) {
        self.section_mut(section).remove_bindings(builtin);
    }

    pub fn set_mouse_area(&mut self, section: &str, area: MouseArea) {
        self.section_mut(section).mouse_area = area;
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Names of sections defined by the given owner
    pub fn sections_owned_by(&self, owner: &str) -> Vec<String> {
        self.sections
            .iter()
            .filter(|s| s.owner.as_deref() == Some(owner))
            .map(|s| s.name.clone())
            .collect()
    }

    /// Total number of bindings across all sections
    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.bindings.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::KeyHistory;

    fn combo(keys: &[char]) -> Combo {
        Combo::new(keys.iter().map(|c| KeyCode::char(*c)).collect()).unwrap()
    }

    #[test]
    fn test_empty_name_is_default_section() {
        let mut table = BindingTable::new();
        table.bind("", false, combo(&['q']), "quit", "test:1");
        let section = table.section(DEFAULT_SECTION).unwrap();
        assert_eq!(section.bindings.len(), 1);
        assert_eq!(section.bindings[0].section, DEFAULT_SECTION);
    }

    #[test]
    fn test_bind_replaces_same_slot() {
        let mut table = BindingTable::new();
        table.bind("default", false, combo(&['q']), "quit", "a:1");
        table.bind("default", true, combo(&['q']), "stop", "b:1");
        table.bind("default", false, combo(&['q']), "quit-watch-later", "a:2");

        let section = table.section("default").unwrap();
        assert_eq!(section.bindings.len(), 2);
        assert_eq!(section.bindings[0].command, "quit-watch-later");
        assert_eq!(section.bindings[0].location, "a:2");
    }

    #[test]
    fn test_remove_bindings_by_builtin_flag() {
        let mut table = BindingTable::new();
        table.bind("s", true, combo(&['a']), "x", "t");
        table.bind("s", false, combo(&['b']), "y", "t");
        table.bind("s", true, combo(&['c']), "z", "t");
        table.remove_bindings("s", true);

        let section = table.section("s").unwrap();
        assert_eq!(section.bindings.len(), 1);
        assert_eq!(section.bindings[0].command, "y");
        assert!(table.unbind("s", false, &combo(&['b'])));
        assert!(table.is_empty());
    }

    #[test]
    fn test_longest_match_wins() {
        let mut table = BindingTable::new();
        table.bind("s", false, combo(&['a']), "cmd1", "t");
        table.bind("s", false, combo(&['b', 'a']), "cmd2", "t");

        let mut history = KeyHistory::new();
        history.push(KeyCode::char('b'));
        let recent = history.with(KeyCode::char('a'));

        let section = table.section("s").unwrap();
        let best = section.best_match(recent.keys(), false).unwrap();
        assert_eq!(best.command, "cmd2");
        assert!(section.best_match(recent.keys(), true).is_none());
    }

    #[test]
    fn test_mouse_area() {
        assert_eq!(
            MouseArea::from_rect(Rect::new(10, 10, 10, 50)),
            MouseArea::Unset
        );
        let area = MouseArea::from_rect(Rect::new(0, 0, 100, 50));
        assert!(area.admits(0, 0));
        assert!(area.admits(99, 49));
        assert!(!area.admits(100, 49));
        assert!(MouseArea::Unset.admits(-5, 1000));
        assert!(!MouseArea::Unset.hit(0, 0));
        assert!(MouseArea::default().hit(-1_000_000, 1_000_000));
    }

    #[test]
    fn test_sections_owned_by() {
        let mut table = BindingTable::new();
        table.section_mut("osc").owner = Some("osc.lua".to_string());
        table.section_mut("other");
        assert_eq!(table.sections_owned_by("osc.lua"), vec!["osc".to_string()]);
        assert_eq!(table.sections().count(), 2);
    }
}

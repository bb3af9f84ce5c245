//! Stack of active sections, searched top-down during resolution

use std::fmt;

use super::section::DEFAULT_SECTION;

/// Maximum number of simultaneously active sections
pub const MAX_ACTIVE_SECTIONS: usize = 50;

/// Flags attached to an active section
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SectionFlags(u8);

impl SectionFlags {
    pub const NONE: SectionFlags = SectionFlags(0);
    /// Stop descending the stack after this section
    pub const EXCLUSIVE: SectionFlags = SectionFlags(0b0001);
    /// Stay above sections enabled without this flag
    pub const ON_TOP: SectionFlags = SectionFlags(0b0010);
    /// Pointer over this section's area may hide the cursor
    pub const ALLOW_HIDE_CURSOR: SectionFlags = SectionFlags(0b0100);
    /// Pointer over this section's area may drag the window
    pub const ALLOW_DRAG: SectionFlags = SectionFlags(0b1000);

    #[inline]
    pub const fn contains(self, other: SectionFlags) -> bool {
        (self.0 & other.0) == other.0 && other.0 != 0
    }

    #[inline]
    pub const fn intersects(self, other: SectionFlags) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn union(self, other: SectionFlags) -> SectionFlags {
        SectionFlags(self.0 | other.0)
    }
}

impl std::ops::BitOr for SectionFlags {
    type Output = SectionFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for SectionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::EXCLUSIVE, "exclusive"),
            (Self::ON_TOP, "on-top"),
            (Self::ALLOW_HIDE_CURSOR, "allow-hide-cursor"),
            (Self::ALLOW_DRAG, "allow-drag"),
        ];
        let parts: Vec<_> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// An entry in the section stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSection {
    pub name: String,
    pub flags: SectionFlags,
}

/// Active sections, stored bottom to top
#[derive(Debug, Clone, Default)]
pub struct SectionStack {
    entries: Vec<ActiveSection>,
}

impl SectionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate a section. Re-enabling moves it to its new position.
    ///
    /// Returns false if the stack is full and the section was dropped.
    pub fn enable(&mut self, name: &str, flags: SectionFlags) -> bool {
        let name = if name.is_empty() { DEFAULT_SECTION } else { name };
        self.disable(name);

        if self.entries.len() >= MAX_ACTIVE_SECTIONS {
            tracing::warn!("Section stack full, not enabling '{}'", name);
            return false;
        }

        let entry = ActiveSection {
            name: name.to_string(),
            flags,
        };
        if flags.contains(SectionFlags::ON_TOP) {
            self.entries.push(entry);
        } else {
            // Below the lowest on-top entry
            let pos = self
                .entries
                .iter()
                .position(|e| e.flags.contains(SectionFlags::ON_TOP))
                .unwrap_or(self.entries.len());
            self.entries.insert(pos, entry);
        }
        tracing::trace!("Enabled section '{}' [{}]", name, flags);
        true
    }

    /// Remove every entry with the given name
    pub fn disable(&mut self, name: &str) {
        let name = if name.is_empty() { DEFAULT_SECTION } else { name };
        self.entries.retain(|e| e.name != name);
    }

    pub fn disable_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Entries in search order, top first
    pub fn iter_top_down(&self) -> impl Iterator<Item = &ActiveSection> {
        self.entries.iter().rev()
    }

    /// Entries bottom first
    pub fn iter_bottom_up(&self) -> impl Iterator<Item = &ActiveSection> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Key codes, bindings and sections
//!
//! This module provides the data side of input handling:
//! - Packed key codes with modifiers and edge state, and their names
//! - Bindings from key combinations (up to 4 keys) to command text
//! - Named sections of bindings and the stack of active sections
//! - input.conf parsing and the embedded builtin bindings
//!
//! # Architecture
//!
//! ```text
//! input.conf → ConfigEntry → BindingTable (sections) ─┐
//!                                                     ├→ Resolver
//! enable/disable section → SectionStack ──────────────┘
//! ```
//!
//! # Loading Bindings
//!
//! ```ignore
//! let mut table = BindingTable::new();
//! apply_entries(&mut table, builtin_bindings());
//! apply_entries(&mut table, load_input_conf_file(path, false, None)?);
//! ```

mod binding;
mod config;
mod defaults;
mod names;
mod section;
mod stack;
mod types;

pub use binding::{Binding, Combo, KeyHistory, MAX_COMBO_LEN};
pub use config::{load_input_conf_file, parse_input_conf, ConfigEntry, KeymapError};
pub use defaults::{apply_entries, builtin_bindings, builtin_input_conf, BUILTIN_SOURCE};
pub use names::{combo_from_name, combo_name, key_from_name, key_name};
pub use section::{BindingTable, MouseArea, Rect, Section, DEFAULT_SECTION};
pub use stack::{ActiveSection, SectionFlags, SectionStack, MAX_ACTIVE_SECTIONS};
pub use types::{KeyCode, KeyState, Modifiers, MOUSE_BUTTON_COUNT};

//! Builtin key bindings
//!
//! The builtin input.conf is embedded at compile time and loaded as builtin
//! bindings, so any user binding for the same key wins.

use super::config::{parse_input_conf, ConfigEntry};
use super::section::BindingTable;

/// Default input.conf embedded at compile time
const BUILTIN_INPUT_CONF: &str = include_str!("../../input.conf");

/// Location prefix for bindings from the embedded config
pub const BUILTIN_SOURCE: &str = "<builtin>";

/// Raw text of the embedded input.conf
pub fn builtin_input_conf() -> &'static str {
    BUILTIN_INPUT_CONF
}

/// Parse the embedded input.conf
pub fn builtin_bindings() -> Vec<ConfigEntry> {
    let entries = parse_input_conf(BUILTIN_INPUT_CONF, BUILTIN_SOURCE, true, None);
    tracing::debug!("Parsed builtin input.conf ({} bindings)", entries.len());
    entries
}

/// Add parsed entries to a table; later entries replace earlier ones with the
/// same combo and builtin flag. Returns the number of entries applied.
pub fn apply_entries(table: &mut BindingTable, entries: Vec<ConfigEntry>) -> usize {
    let count = entries.len();
    for entry in entries {
        table.bind(
            &entry.section,
            entry.builtin,
            entry.combo,
            entry.command,
            entry.location,
        );
    }
    count
}

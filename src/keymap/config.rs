//! input.conf parsing
//!
//! One binding per line:
//!
//! ```text
//! # comment
//! q            quit
//! Ctrl+s-g     {extra} script-binding stats
//! default-bindings start
//! WHEEL_UP     seek 10
//! ```
//!
//! Lines after `default-bindings start` are treated as builtin bindings.
//! Malformed lines are logged and skipped; they never abort the rest of the
//! file.

use std::path::Path;

use thiserror::Error;

use super::binding::Combo;
use super::names::combo_from_name;

/// Errors that can occur when parsing key names and input.conf files
#[derive(Debug, Error)]
pub enum KeymapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Key combination has more than 4 keys: {0}")]
    ComboTooLong(String),
    #[error("Empty key combination")]
    EmptyCombo,
    #[error("Unfinished key binding: {0}")]
    UnfinishedBinding(String),
    #[error("Unterminated section name: {0}")]
    UnterminatedSection(String),
}

/// A binding parsed from config text, not yet added to a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub combo: Combo,
    /// Target section; empty means the default section
    pub section: String,
    pub command: String,
    /// `source:line`
    pub location: String,
    pub builtin: bool,
}

/// Marker line switching the rest of the file to builtin bindings
const DEFAULT_BINDINGS_MARKER: &str = "default-bindings start";

/// Parse one line (already trimmed, not a comment)
fn parse_line(
    line: &str,
    restrict_section: Option<&str>,
) -> Result<(Combo, String, String), KeymapError> {
    let (key, rest) = match line.split_once(char::is_whitespace) {
        Some((key, rest)) => (key, rest.trim()),
        None => (line, ""),
    };
    if rest.is_empty() {
        return Err(KeymapError::UnfinishedBinding(line.to_string()));
    }
    let combo = combo_from_name(key)?;

    let mut section = restrict_section.unwrap_or_default().to_string();
    let mut command = rest;
    if restrict_section.is_none() {
        if let Some(tail) = rest.strip_prefix('{') {
            let end = tail
                .find('}')
                .ok_or_else(|| KeymapError::UnterminatedSection(rest.to_string()))?;
            section = tail[..end].to_string();
            command = tail[end + 1..].trim_start();
            if command.is_empty() {
                return Err(KeymapError::UnfinishedBinding(line.to_string()));
            }
        }
    }

    Ok((combo, section, command.to_string()))
}

/// Parse input.conf text.
///
/// `source` names the text in locations (`source:line`). With
/// `restrict_section`, every binding goes to that section and `{section}`
/// prefixes are not interpreted.
pub fn parse_input_conf(
    text: &str,
    source: &str,
    builtin: bool,
    restrict_section: Option<&str>,
) -> Vec<ConfigEntry> {
    let mut builtin = builtin;
    let mut entries = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == DEFAULT_BINDINGS_MARKER {
            builtin = true;
            continue;
        }

        let location = format!("{}:{}", source, idx + 1);
        match parse_line(line, restrict_section) {
            Ok((combo, section, command)) => entries.push(ConfigEntry {
                combo,
                section,
                command,
                location,
                builtin,
            }),
            Err(e) => tracing::error!("{}: {}", location, e),
        }
    }

    entries
}

/// Load and parse an input.conf file
pub fn load_input_conf_file(
    path: &Path,
    builtin: bool,
    restrict_section: Option<&str>,
) -> Result<Vec<ConfigEntry>, KeymapError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_input_conf(
        &content,
        &path.display().to_string(),
        builtin,
        restrict_section,
    ))
}

//! inputmux - input event resolution and command dispatch
//!
//! This crate turns raw key, mouse button, wheel and pointer events from any
//! number of input sources into one ordered stream of commands for a single
//! consumer loop, using sections of key bindings loaded from input.conf.

pub mod config;
pub mod config_paths;
pub mod input;
pub mod keymap;
pub mod tracing;

// Re-export commonly used types
pub use config::InputConfig;
pub use input::{Command, CommandParser, InputEngine, InputHandle};
pub use keymap::{KeyCode, Modifiers, SectionFlags};

//! Commands produced by the engine and the parser boundary that creates them
//!
//! The engine treats command text as opaque: it hands binding text to a
//! [`CommandParser`] and only looks at the [`CommandDef`] traits of the result
//! (abort class, autorepeat, up/down emission, scalability).

use std::collections::HashMap;

/// How a command interacts with abort escalation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AbortClass {
    #[default]
    None,
    /// Aborts only when another maybe-abort command is already queued
    Maybe,
    /// Always aborts (quit and friends)
    Always,
}

/// Static traits of a command type, supplied by the parser
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandDef {
    pub abort: AbortClass,
    /// Held keys may autorepeat this command
    pub allow_auto_repeat: bool,
    /// Emit on both key-down and key-up
    pub on_updown: bool,
    /// Understands fractional `scale` instead of being repeated per unit
    pub scalable: bool,
    /// Resolves but never reaches the queue
    pub is_ignore: bool,
}

impl CommandDef {
    pub const fn plain() -> Self {
        Self {
            abort: AbortClass::None,
            allow_auto_repeat: false,
            on_updown: false,
            scalable: false,
            is_ignore: false,
        }
    }

    pub const fn abort(mut self, abort: AbortClass) -> Self {
        self.abort = abort;
        self
    }

    pub const fn repeatable(mut self) -> Self {
        self.allow_auto_repeat = true;
        self
    }

    pub const fn scalable(mut self) -> Self {
        self.scalable = true;
        self
    }

    pub const fn on_updown(mut self) -> Self {
        self.on_updown = true;
        self
    }

    pub const fn ignore(mut self) -> Self {
        self.is_ignore = true;
        self
    }
}

/// A parsed command plus the engine's per-dispatch bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    /// Text the command was parsed from
    pub original: String,
    pub def: CommandDef,

    /// Came from a key with separate down and up edges
    pub is_up_down: bool,
    /// This is the key-up edge of a held key
    pub is_up: bool,
    /// Will be (re-)emitted when the key is released
    pub emit_on_up: bool,
    /// Synthesized by autorepeat
    pub repeated: bool,
    /// Pointer position for mouse-move commands
    pub mouse_move: Option<(i32, i32)>,
    pub scale: f64,
    pub scale_units: u32,

    /// Section the binding was found in
    pub input_section: Option<String>,
    /// Name of the key that triggered the command
    pub key_name: Option<String>,
    pub is_mouse_button: bool,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>, def: CommandDef) -> Self {
        let name = name.into();
        let original = std::iter::once(name.clone())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            name,
            args,
            original,
            def,
            is_up_down: false,
            is_up: false,
            emit_on_up: false,
            repeated: false,
            mouse_move: None,
            scale: 1.0,
            scale_units: 1,
            input_section: None,
            key_name: None,
            is_mouse_button: false,
        }
    }

    #[inline]
    pub fn is_abort(&self) -> bool {
        self.def.abort == AbortClass::Always
    }

    #[inline]
    pub fn is_maybe_abort(&self) -> bool {
        self.def.abort != AbortClass::None
    }

    #[inline]
    pub fn is_repeatable(&self) -> bool {
        self.def.allow_auto_repeat
    }

    #[inline]
    pub fn is_scalable(&self) -> bool {
        self.def.scalable
    }

    #[inline]
    pub fn is_mouse_move(&self) -> bool {
        self.mouse_move.is_some()
    }
}

/// Turns command text into commands. Implemented by the host application;
/// [`BasicParser`] is a small default.
pub trait CommandParser: Send + Sync {
    /// Parse command text. `location` identifies the source for diagnostics.
    fn parse(&self, text: &str, location: &str) -> Option<Command>;

    /// Build a command from an already split argument list
    fn parse_args(&self, args: &[&str]) -> Option<Command>;
}

/// Known command names and their traits
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    defs: HashMap<String, CommandDef>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the usual playback commands
    pub fn builtin() -> Self {
        let seek = CommandDef::plain().repeatable().scalable();
        let maybe_abort = CommandDef::plain().abort(AbortClass::Maybe);
        let abort = CommandDef::plain().abort(AbortClass::Always);

        let mut registry = Self::new();
        for (name, def) in [
            ("ignore", CommandDef::plain().ignore()),
            ("quit", abort),
            ("quit-watch-later", abort),
            ("stop", abort),
            ("playlist-next", maybe_abort),
            ("playlist-prev", maybe_abort),
            ("playlist-play-index", maybe_abort),
            ("loadfile", maybe_abort),
            ("loadlist", maybe_abort),
            ("seek", seek),
            ("add", seek),
            ("multiply", CommandDef::plain().repeatable()),
            ("cycle", seek),
            ("cycle-values", CommandDef::plain().repeatable()),
            ("set", CommandDef::plain().repeatable()),
            ("frame-step", CommandDef::plain().repeatable()),
            ("frame-back-step", CommandDef::plain().repeatable()),
            ("show-text", CommandDef::plain()),
            ("show-progress", CommandDef::plain()),
            ("screenshot", CommandDef::plain()),
            ("sub-add", CommandDef::plain()),
            ("script-binding", CommandDef::plain().on_updown()),
            ("script-message", CommandDef::plain()),
            ("keypress", CommandDef::plain()),
            ("keydown", CommandDef::plain()),
            ("keyup", CommandDef::plain()),
        ] {
            registry.register(name, def);
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, def: CommandDef) {
        self.defs.insert(name.into(), def);
    }

    pub fn get(&self, name: &str) -> Option<CommandDef> {
        self.defs.get(name).copied()
    }
}

/// Prefixes accepted before a command name
const PREFIXES: &[&str] = &[
    "no-osd",
    "osd-auto",
    "osd-bar",
    "osd-msg",
    "osd-msg-bar",
    "expand-properties",
    "raw",
    "async",
    "sync",
];

/// Whitespace-separated parser with double-quoted arguments and `#` comments
#[derive(Debug, Clone)]
pub struct BasicParser {
    registry: CommandRegistry,
}

impl BasicParser {
    pub fn new(registry: CommandRegistry) -> Self {
        Self { registry }
    }

    fn build(&self, words: Vec<String>, original: &str, location: &str) -> Option<Command> {
        let mut words = words.into_iter().peekable();
        let mut force_repeat = false;
        while let Some(word) = words.peek() {
            if word == "repeatable" {
                force_repeat = true;
            } else if !PREFIXES.contains(&word.as_str()) {
                break;
            }
            words.next();
        }

        let Some(name) = words.next() else {
            tracing::error!("Empty command ({})", location);
            return None;
        };
        let Some(mut def) = self.registry.get(&name) else {
            tracing::error!("Command '{}' not found ({})", name, location);
            return None;
        };
        if force_repeat {
            def.allow_auto_repeat = true;
        }

        let mut cmd = Command::new(name, words.collect(), def);
        cmd.original = original.trim().to_string();
        Some(cmd)
    }
}

impl Default for BasicParser {
    fn default() -> Self {
        Self::new(CommandRegistry::builtin())
    }
}

/// Split command text into words, honoring double quotes and backslash
/// escapes inside them. Returns None on an unterminated quote.
fn split_words(text: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut chars = text.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.peek() {
            None | Some('#') => break,
            Some('"') => {
                chars.next();
                let mut word = String::new();
                loop {
                    match chars.next()? {
                        '"' => break,
                        '\\' => word.push(match chars.next()? {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        }),
                        c => word.push(c),
                    }
                }
                words.push(word);
            }
            Some(_) => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                words.push(word);
            }
        }
    }
    Some(words)
}

impl CommandParser for BasicParser {
    fn parse(&self, text: &str, location: &str) -> Option<Command> {
        let Some(words) = split_words(text) else {
            tracing::error!("Unterminated quote in command '{}' ({})", text, location);
            return None;
        };
        self.build(words, text, location)
    }

    fn parse_args(&self, args: &[&str]) -> Option<Command> {
        let words = args.iter().map(|s| s.to_string()).collect();
        self.build(words, &args.join(" "), "<args>")
    }
}

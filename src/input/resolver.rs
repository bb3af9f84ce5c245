//! Key to command resolution against the section stack
//!
//! # Architecture
//!
//! ```text
//!   key ──▶ mouse-owner section (while a mouse button is held)
//!    │            │ miss
//!    │            ▼
//!    └──▶ stack top ──▶ ... ──▶ stack bottom
//!           user, then builtin bindings per section
//!           stop at EXCLUSIVE, or at ON_TOP once something matched
//!                 │ miss
//!                 ▼
//!              UNMAPPED ──▶ CLOSE_WIN fallback ──▶ unbound
//! ```
//!
//! The resolver only borrows engine state; it never mutates it.

use super::command::{Command, CommandParser};
use crate::keymap::{key_name, Binding, BindingTable, KeyCode, KeyHistory, SectionFlags, SectionStack};

/// How keys are turned into commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// Look up bindings and parse them
    #[default]
    Normal,
    /// Show every binding of the key instead of running it
    ListBindings,
}

/// Borrowed view of the engine state needed to resolve one key
pub struct Resolver<'a> {
    pub table: &'a BindingTable,
    pub stack: &'a SectionStack,
    pub history: &'a KeyHistory,
    /// Producer-side pointer position
    pub mouse_pos: (i32, i32),
    /// Section that owns the pointer
    pub mouse_section: &'a str,
    /// A plain mouse button is held down
    pub mouse_button_held: bool,
    pub use_default_bindings: bool,
    pub strategy: ResolveStrategy,
}

impl<'a> Resolver<'a> {
    /// Best binding for `code` within one section
    pub fn find_in_section(&self, section: &str, code: KeyCode) -> Option<&'a Binding> {
        let section = self.table.section(section)?;
        if section.bindings.is_empty() {
            return None;
        }
        let recent = self.history.with(code);
        section.best_match(recent.keys(), false).or_else(|| {
            self.use_default_bindings
                .then(|| section.best_match(recent.keys(), true))
                .flatten()
        })
    }

    /// Best binding for `code` across the active sections, or only in
    /// `force_section` when given
    pub fn find_any(&self, force_section: Option<&str>, code: KeyCode) -> Option<&'a Binding> {
        if let Some(section) = force_section {
            return self.find_in_section(section, code);
        }

        let use_mouse = code.depends_on_mouse_pos();
        if use_mouse && self.mouse_button_held {
            if let Some(binding) = self.find_in_section(self.mouse_section, code) {
                return Some(binding);
            }
        }

        let (x, y) = self.mouse_pos;
        let mut best: Option<&'a Binding> = None;
        for active in self.stack.iter_top_down() {
            if let Some(binding) = self.find_in_section(&active.name, code) {
                let admitted = !use_mouse
                    || self
                        .table
                        .section(&binding.section)
                        .is_some_and(|s| s.mouse_area.admits(x, y));
                if admitted && best.map_or(true, |b| b.builtin && !binding.builtin) {
                    best = Some(binding);
                }
            }
            if active.flags.contains(SectionFlags::EXCLUSIVE) {
                break;
            }
            if best.is_some() && active.flags.contains(SectionFlags::ON_TOP) {
                break;
            }
        }
        best
    }

    /// Resolve `code` to a parsed command.
    ///
    /// Unbound keys and bindings whose text fails to parse are logged and
    /// yield None.
    pub fn resolve(
        &self,
        force_section: Option<&str>,
        code: KeyCode,
        parser: &dyn CommandParser,
    ) -> Option<Command> {
        if self.strategy == ResolveStrategy::ListBindings {
            return self.list_bindings_command(code, parser);
        }

        let binding = self
            .find_any(force_section, code)
            .or_else(|| self.find_any(force_section, KeyCode::UNMAPPED));
        let name = key_name(code);
        let Some(binding) = binding else {
            if code == KeyCode::CLOSE_WIN {
                return parser.parse_args(&["quit"]);
            }
            let pointer = code.is_mouse_move()
                || code == KeyCode::MOUSE_ENTER
                || code == KeyCode::MOUSE_LEAVE;
            if pointer {
                tracing::trace!("No key binding found for key '{}'", name);
            } else {
                tracing::warn!("No key binding found for key '{}'", name);
            }
            return None;
        };

        let Some(mut cmd) = parser.parse(&binding.command, &binding.location) else {
            tracing::error!(
                "Invalid command for key binding '{}': '{}' ({})",
                name,
                binding.command,
                binding.location
            );
            return None;
        };
        tracing::trace!(
            "key '{}' -> '{}' in '{}'",
            name,
            binding.command,
            binding.section
        );
        cmd.input_section = Some(binding.section.clone());
        cmd.key_name = Some(name);
        cmd.is_mouse_button = code.emits_on_up();
        Some(cmd)
    }

    /// `show-text` command describing every single-key binding of `code`
    fn list_bindings_command(&self, code: KeyCode, parser: &dyn CommandParser) -> Option<Command> {
        if code == KeyCode::CLOSE_WIN {
            tracing::warn!("CLOSE_WIN was received. It can be bound like any other key.");
        }
        let text = self.describe_bindings(code);
        tracing::info!("{}", text);
        parser.parse_args(&["show-text", &text])
    }

    pub fn describe_bindings(&self, code: KeyCode) -> String {
        let found: Vec<String> = self
            .table
            .sections()
            .flat_map(|section| section.bindings.iter())
            .filter(|b| b.combo.keys().first() == Some(&code))
            .map(|b| format!("{} '{}'", b.section, b.command))
            .collect();
        let body = if found.is_empty() {
            "(nothing)".to_string()
        } else {
            found.join("\n")
        };
        format!("Key {} is bound to:\n{}", key_name(code), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::command::BasicParser;
    use crate::keymap::{apply_entries, parse_input_conf, Combo, MouseArea, Rect, DEFAULT_SECTION};

    struct Fixture {
        table: BindingTable,
        stack: SectionStack,
        history: KeyHistory,
    }

    impl Fixture {
        fn new(conf: &str) -> Self {
            let mut table = BindingTable::new();
            apply_entries(&mut table, parse_input_conf(conf, "test.conf", false, None));
            let mut stack = SectionStack::new();
            stack.enable(DEFAULT_SECTION, SectionFlags::NONE);
            Self {
                table,
                stack,
                history: KeyHistory::new(),
            }
        }

        fn resolver(&self) -> Resolver<'_> {
            Resolver {
                table: &self.table,
                stack: &self.stack,
                history: &self.history,
                mouse_pos: (0, 0),
                mouse_section: DEFAULT_SECTION,
                mouse_button_held: false,
                use_default_bindings: true,
                strategy: ResolveStrategy::Normal,
            }
        }
    }

    fn command_for(r: &Resolver<'_>, code: KeyCode) -> Option<String> {
        r.find_any(None, code).map(|b| b.command.clone())
    }

    #[test]
    fn test_user_binding_beats_builtin() {
        let mut fx = Fixture::new("");
        fx.table.bind("", true, Combo::single(KeyCode::char('q')), "quit", "b");
        fx.table.bind("", false, Combo::single(KeyCode::char('q')), "stop", "u");
        assert_eq!(command_for(&fx.resolver(), KeyCode::char('q')).unwrap(), "stop");

        fx.table.remove_bindings("", false);
        assert_eq!(command_for(&fx.resolver(), KeyCode::char('q')).unwrap(), "quit");
        let mut r = fx.resolver();
        r.use_default_bindings = false;
        assert!(command_for(&r, KeyCode::char('q')).is_none());
    }

    #[test]
    fn test_upper_section_wins() {
        let mut fx = Fixture::new("x {lower} seek 1\nx {upper} seek 2\nx seek 0\n");
        fx.stack.enable("lower", SectionFlags::NONE);
        fx.stack.enable("upper", SectionFlags::NONE);
        assert_eq!(command_for(&fx.resolver(), KeyCode::char('x')).unwrap(), "seek 2");
    }

    #[test]
    fn test_user_in_lower_section_beats_builtin_above() {
        let mut fx = Fixture::new("x seek 0\n");
        fx.table.bind("menu", true, Combo::single(KeyCode::char('x')), "seek 9", "b");
        fx.stack.enable("menu", SectionFlags::NONE);
        assert_eq!(command_for(&fx.resolver(), KeyCode::char('x')).unwrap(), "seek 0");
    }

    #[test]
    fn test_exclusive_stops_search() {
        let mut fx = Fixture::new("y seek 0\nx {menu} ignore\n");
        fx.stack.enable("menu", SectionFlags::EXCLUSIVE);
        assert!(command_for(&fx.resolver(), KeyCode::char('y')).is_none());
        assert_eq!(command_for(&fx.resolver(), KeyCode::char('x')).unwrap(), "ignore");
    }

    #[test]
    fn test_on_top_stops_only_after_match() {
        let mut fx = Fixture::new("y seek 0\nx seek 1\nx {osd} seek 2\n");
        fx.table.bind("osd", true, Combo::single(KeyCode::char('x')), "seek 3", "b");
        fx.stack.enable("osd", SectionFlags::ON_TOP);
        let r = fx.resolver();
        assert_eq!(command_for(&r, KeyCode::char('y')).unwrap(), "seek 0");
        assert_eq!(command_for(&r, KeyCode::char('x')).unwrap(), "seek 2");
    }

    #[test]
    fn test_mouse_area_gating() {
        let mut fx = Fixture::new("MBTN_LEFT seek 0\nMBTN_LEFT {osc} seek 1\nx {osc} seek 2\n");
        fx.stack.enable("osc", SectionFlags::NONE);
        fx.table.set_mouse_area("osc", MouseArea::from_rect(Rect::new(0, 0, 100, 20)));

        let mut r = fx.resolver();
        r.mouse_pos = (50, 10);
        assert_eq!(command_for(&r, KeyCode::MBTN_LEFT).unwrap(), "seek 1");
        r.mouse_pos = (50, 500);
        assert_eq!(command_for(&r, KeyCode::MBTN_LEFT).unwrap(), "seek 0");
        // Keyboard keys ignore the area
        assert_eq!(command_for(&r, KeyCode::char('x')).unwrap(), "seek 2");
    }

    #[test]
    fn test_held_button_prefers_mouse_section() {
        let mut fx = Fixture::new("WHEEL_UP seek 0\nWHEEL_UP {osc} seek 1\n");
        fx.stack.enable("osc", SectionFlags::NONE);
        fx.table.set_mouse_area("osc", MouseArea::from_rect(Rect::new(0, 0, 10, 10)));

        let mut r = fx.resolver();
        r.mouse_pos = (500, 500);
        assert_eq!(command_for(&r, KeyCode::WHEEL_UP).unwrap(), "seek 0");
        r.mouse_button_held = true;
        r.mouse_section = "osc";
        assert_eq!(command_for(&r, KeyCode::WHEEL_UP).unwrap(), "seek 1");
    }

    #[test]
    fn test_longest_chord_wins() {
        let mut fx = Fixture::new("g seek 1\ng-g seek 2\n");
        fx.history.push(KeyCode::char('g'));
        assert_eq!(command_for(&fx.resolver(), KeyCode::char('g')).unwrap(), "seek 2");
    }

    #[test]
    fn test_resolve_fallbacks() {
        let parser = BasicParser::default();
        let fx = Fixture::new("UNMAPPED ignore\n");
        let r = fx.resolver();
        let cmd = r.resolve(None, KeyCode::char('z'), &parser).unwrap();
        assert_eq!(cmd.name, "ignore");
        assert_eq!(cmd.key_name.as_deref(), Some("z"));
        assert_eq!(cmd.input_section.as_deref(), Some(DEFAULT_SECTION));

        let empty = Fixture::new("");
        let r = empty.resolver();
        assert_eq!(r.resolve(None, KeyCode::CLOSE_WIN, &parser).unwrap().name, "quit");
        assert!(r.resolve(None, KeyCode::char('z'), &parser).is_none());
    }

    #[test]
    fn test_invalid_binding_is_unbound() {
        let parser = BasicParser::default();
        let fx = Fixture::new("z frobnicate\n");
        assert!(fx.resolver().resolve(None, KeyCode::char('z'), &parser).is_none());
    }

    #[test]
    fn test_mouse_button_flag() {
        let parser = BasicParser::default();
        let fx = Fixture::new("MBTN_RIGHT cycle pause\n");
        let cmd = fx
            .resolver()
            .resolve(None, KeyCode::MBTN_RIGHT, &parser)
            .unwrap();
        assert!(cmd.is_mouse_button);
    }

    #[test]
    fn test_list_bindings_strategy() {
        let parser = BasicParser::default();
        let fx = Fixture::new("a seek 1\na {menu} ignore\nb quit\n");
        let mut r = fx.resolver();
        r.strategy = ResolveStrategy::ListBindings;
        let cmd = r.resolve(None, KeyCode::char('a'), &parser).unwrap();
        assert_eq!(cmd.name, "show-text");
        assert_eq!(cmd.args[0], "Key a is bound to:\ndefault 'seek 1'\nmenu 'ignore'");
        assert!(r.describe_bindings(KeyCode::char('c')).ends_with("(nothing)"));
    }
}

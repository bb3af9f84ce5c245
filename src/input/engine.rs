//! The input engine: producers feed raw events, one consumer reads commands
//!
//! # Architecture
//!
//! ```text
//!   source threads ──put_key / put_wheel / set_mouse_pos──┐
//!   control clients ──queue_command / run_command─────────┤
//!                                                         ▼
//!                    ┌──────────── EngineState (one lock) ────────────┐
//!                    │ normalize → wheel shaping → KeyLifecycle       │
//!                    │            → Resolver(stack, table, history)   │
//!                    │            → CommandQueue ──▶ wakeup()          │
//!                    └────────────────────────────────────────────────┘
//!                                                         │
//!   consumer loop ◀──────────── read_command / get_delay ─┘
//! ```
//!
//! [`InputEngine`] owns the engine and tears down its sources on drop.
//! [`InputHandle`] is a cheap clone handed to producers.

use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::{Mutex, MutexGuard};

use super::clock::{Clock, SystemClock};
use super::command::{BasicParser, Command, CommandParser};
use super::lifecycle::{KeyLifecycle, RepeatTiming};
use super::queue::{AbortHook, CommandQueue};
use super::resolver::{ResolveStrategy, Resolver};
use super::source::SourceRegistry;
use super::wheel::WheelShaper;
use crate::config::InputConfig;
use crate::keymap::{
    apply_entries, builtin_bindings, key_name, load_input_conf_file, parse_input_conf,
    BindingTable, Combo, KeyCode, KeyHistory, KeyState, Modifiers, MouseArea, Rect,
    SectionFlags, SectionStack, DEFAULT_SECTION,
};

/// Called whenever a command may have become available
pub type Wakeup = Arc<dyn Fn() + Send + Sync>;

/// Non-scalable commands are repeated at most this many times per event
const MAX_UNIT_REPEATS: u32 = 20;

/// Location recorded for bindings made with [`InputHandle::bind_key`]
const KEYBIND_LOCATION: &str = "keybind-command";

/// One binding, as reported by [`InputHandle::list_bindings`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    pub key: String,
    pub section: String,
    pub command: String,
    pub location: String,
    pub builtin: bool,
}

#[derive(Debug)]
struct MouseState {
    /// Latest position reported by a producer
    x: i32,
    y: i32,
    /// Position of the last mouse move the consumer read
    consumer: (i32, i32),
    /// Section currently owning the pointer
    section: String,
    event_counter: u64,
}

pub(crate) struct EngineState {
    config: InputConfig,
    parser: Arc<dyn CommandParser>,
    clock: Arc<dyn Clock>,
    wakeup: Option<Wakeup>,
    table: BindingTable,
    stack: SectionStack,
    history: KeyHistory,
    keys: KeyLifecycle,
    wheel: WheelShaper,
    queue: CommandQueue,
    mouse: MouseState,
    pub(crate) sources: SourceRegistry,
}

impl EngineState {
    fn new(
        config: InputConfig,
        parser: Arc<dyn CommandParser>,
        clock: Arc<dyn Clock>,
        wakeup: Option<Wakeup>,
    ) -> Self {
        let queue = CommandQueue::new(config.key_fifo_size);
        Self {
            config,
            parser,
            clock,
            wakeup,
            table: BindingTable::new(),
            stack: SectionStack::new(),
            history: KeyHistory::new(),
            keys: KeyLifecycle::new(),
            wheel: WheelShaper::new(),
            queue,
            mouse: MouseState {
                x: 0,
                y: 0,
                consumer: (0, 0),
                section: DEFAULT_SECTION.to_string(),
                event_counter: 0,
            },
            sources: SourceRegistry::default(),
        }
    }

    fn notify(&self) {
        if let Some(wakeup) = &self.wakeup {
            wakeup();
        }
    }

    fn repeat_timing(&self) -> RepeatTiming {
        RepeatTiming {
            delay: self.config.autorepeat_delay(),
            rate: self.config.autorepeat_rate,
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver {
            table: &self.table,
            stack: &self.stack,
            history: &self.history,
            mouse_pos: (self.mouse.x, self.mouse.y),
            mouse_section: &self.mouse.section,
            mouse_button_held: self.keys.holds_mouse_button(),
            use_default_bindings: self.config.default_bindings,
            strategy: if self.config.test {
                ResolveStrategy::ListBindings
            } else {
                ResolveStrategy::Normal
            },
        }
    }

    fn cmd_from_keys(&self, force_section: Option<&str>, code: KeyCode) -> Option<Command> {
        self.resolver()
            .resolve(force_section, code, self.parser.as_ref())
    }

    fn queue_locked(&mut self, cmd: Command) {
        self.queue.push(cmd);
        self.notify();
    }

    /// Recompute which section owns the pointer; the previous owner gets a
    /// MOUSE_LEAVE when it changes
    fn update_mouse_section(&mut self) {
        let owner = self
            .resolver()
            .find_any(None, KeyCode::MOUSE_MOVE)
            .map_or(DEFAULT_SECTION, |b| b.section.as_str())
            .to_string();
        if owner == self.mouse.section {
            return;
        }
        let previous = std::mem::replace(&mut self.mouse.section, owner);
        tracing::trace!(
            "Mouse section '{}' -> '{}'",
            previous,
            self.mouse.section
        );
        if let Some(cmd) = self.cmd_from_keys(Some(&previous), KeyCode::MOUSE_LEAVE) {
            self.queue_locked(cmd);
        }
    }

    fn release_down_cmd(&mut self, drop_current: bool) {
        if let Some(up) = self.keys.release(drop_current) {
            self.history.clear();
            self.queue_locked(up);
        }
        self.update_mouse_section();
    }

    fn resolve_key(&mut self, code: KeyCode) -> Option<Command> {
        self.update_mouse_section();
        let cmd = self.cmd_from_keys(None, code);
        self.history.push(code);
        let cmd = cmd?;
        if cmd.def.is_ignore {
            return None;
        }
        if self.queue.should_drop(&cmd) {
            tracing::warn!("Dropping command '{}': queue is full", cmd.original);
            return None;
        }
        Some(cmd)
    }

    fn dispatch(&mut self, mut cmd: Command, scale: f64, units: u32) {
        if cmd.is_scalable() {
            cmd.scale = scale;
            cmd.scale_units = units;
            self.queue_locked(cmd);
            return;
        }
        cmd.scale = 1.0;
        cmd.scale_units = 1;
        let units = units.min(MAX_UNIT_REPEATS);
        for _ in 1..units {
            self.queue_locked(cmd.clone());
        }
        if units > 0 {
            self.queue_locked(cmd);
        }
    }

    fn interpret_key(&mut self, code: KeyCode, scale: f64, units: u32) {
        let state = code.state();
        let code = code.without_state();
        tracing::trace!(
            "key '{}' {:?} scale={} units={}",
            key_name(code),
            state,
            scale,
            units
        );

        let cmd = match state {
            KeyState::Down => {
                // Some platforms resend DOWN while the key is held
                if self.keys.is_held(code) {
                    return;
                }
                self.release_down_cmd(true);
                let cmd = self.resolve_key(code).map(|mut cmd| {
                    cmd.is_up_down = true;
                    cmd.emit_on_up = code.emits_on_up() || cmd.def.on_updown;
                    cmd
                });
                let now = self.clock.now();
                self.keys.press(code, cmd.clone(), now);
                self.notify();
                cmd
            }
            KeyState::Up => {
                self.release_down_cmd(false);
                return;
            }
            KeyState::SetOnly => {
                if !self.keys.is_held(code) {
                    self.release_down_cmd(true);
                    let now = self.clock.now();
                    self.keys.hold(code, now);
                }
                return;
            }
            KeyState::Press => {
                if self.keys.is_held(code) {
                    self.release_down_cmd(false);
                }
                self.resolve_key(code)
            }
        };

        let Some(cmd) = cmd else {
            return;
        };
        // Keys that emit on release only get their up edge queued
        if cmd.emit_on_up && !cmd.def.on_updown {
            return;
        }
        self.history.clear();
        self.dispatch(cmd, scale, units);
    }

    fn feed_key(&mut self, code: KeyCode, scale: f64, force_mouse: bool) {
        let code = code.normalize();
        let unmod = code.without_state().base();

        if unmod == KeyCode::RELEASE_ALL {
            tracing::trace!("release all");
            self.release_down_cmd(false);
            self.history.clear();
            return;
        }
        if !self.config.enable_mouse_movements && code.is_mouse() && !force_mouse {
            return;
        }
        if unmod == KeyCode::MOUSE_LEAVE || unmod == KeyCode::MOUSE_ENTER {
            self.update_mouse_section();
            if let Some(cmd) = self.cmd_from_keys(None, code.without_state()) {
                self.queue_locked(cmd);
            }
            return;
        }
        // Double clicks are synthesized here; ignore the platform's own
        if !force_mouse && self.config.doubleclick_time_ms != 0 && code.is_mouse_button_dbl() {
            return;
        }

        let (scale, units) = if code.is_wheel() {
            match self.wheel.process(code, scale, self.clock.now()) {
                Some(shaped) => shaped,
                None => return,
            }
        } else {
            (scale, 1)
        };

        self.interpret_key(code, scale, units);

        if code.state() == KeyState::Down {
            let now = self.clock.now();
            let threshold = self.config.doubleclick_time();
            if let Some(dbl) = self.keys.note_down_edge(code, now, threshold) {
                self.interpret_key(dbl, 1.0, 1);
            }
        }
    }

    fn set_mouse_pos(&mut self, x: i32, y: i32) {
        tracing::trace!("mouse move {}/{}", x, y);
        if (self.mouse.x, self.mouse.y) == (x, y) {
            return;
        }
        self.mouse.event_counter += 1;
        self.mouse.x = x;
        self.mouse.y = y;
        if !self.config.enable_mouse_movements {
            return;
        }

        self.update_mouse_section();
        let cmd = self
            .cmd_from_keys(None, KeyCode::MOUSE_MOVE)
            .or_else(|| self.parser.parse_args(&["ignore"]));
        let Some(mut cmd) = cmd else {
            return;
        };
        cmd.mouse_move = Some((x, y));
        if self.queue.should_drop(&cmd) {
            return;
        }
        self.queue.push_mouse_move(cmd);
        self.notify();
    }

    /// Whether an active section without `reject` flags claims the point
    fn test_mouse(&self, x: i32, y: i32, reject: SectionFlags) -> bool {
        self.stack
            .iter_bottom_up()
            .filter(|active| !active.flags.intersects(reject))
            .filter_map(|active| self.table.section(&active.name))
            .any(|section| section.mouse_area.hit(x, y))
    }

    fn load_entries(&mut self, text: &str, location: &str, builtin: bool) -> usize {
        let entries = parse_input_conf(text, location, builtin, None);
        apply_entries(&mut self.table, entries)
    }

    fn load_user_conf(&mut self) {
        let explicit = self.config.input_conf.clone();
        let Some(path) = explicit
            .clone()
            .or_else(crate::config_paths::input_conf_file)
        else {
            tracing::debug!("No config directory available, skipping input.conf");
            return;
        };
        if !path.exists() {
            if explicit.is_some() {
                tracing::warn!("Input config not found at {}", path.display());
            } else {
                tracing::debug!("No input.conf at {}", path.display());
            }
            return;
        }
        match load_input_conf_file(&path, false, None) {
            Ok(entries) => {
                let count = apply_entries(&mut self.table, entries);
                tracing::info!(
                    "Loaded input.conf from {} ({} bindings)",
                    path.display(),
                    count
                );
            }
            Err(e) => tracing::warn!("Failed to load input.conf from {}: {}", path.display(), e),
        }
    }
}

/// Builder for [`InputEngine`]
pub struct EngineBuilder {
    config: InputConfig,
    parser: Option<Arc<dyn CommandParser>>,
    clock: Option<Arc<dyn Clock>>,
    wakeup: Option<Wakeup>,
}

impl EngineBuilder {
    pub fn parser(mut self, parser: Arc<dyn CommandParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Must be non-blocking; it runs with the engine lock held
    pub fn wakeup(mut self, wakeup: impl Fn() + Send + Sync + 'static) -> Self {
        self.wakeup = Some(Arc::new(wakeup));
        self
    }

    pub fn build(self) -> InputEngine {
        let parser = self
            .parser
            .unwrap_or_else(|| Arc::new(BasicParser::default()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let mut state = EngineState::new(self.config, parser, clock, self.wakeup);

        state.stack.enable(
            DEFAULT_SECTION,
            SectionFlags::ALLOW_DRAG | SectionFlags::ALLOW_HIDE_CURSOR,
        );
        if state.config.builtin_bindings {
            let count = apply_entries(&mut state.table, builtin_bindings());
            tracing::debug!("Loaded builtin bindings ({} bindings)", count);
        }
        if state.config.load_user_conf {
            state.load_user_conf();
        }

        InputEngine {
            handle: InputHandle {
                inner: Arc::new(Mutex::new(state)),
            },
        }
    }
}

/// Producer-side access to the engine. Clones share the same engine.
#[derive(Clone)]
pub struct InputHandle {
    inner: Arc<Mutex<EngineState>>,
}

impl InputHandle {
    pub(crate) fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner.lock()
    }

    /// Feed a key event (press, or DOWN/UP/SET_ONLY edge)
    pub fn put_key(&self, code: KeyCode) {
        self.lock().feed_key(code, 1.0, false);
    }

    /// Feed a key that did not come from hardware; mouse filters do not
    /// apply
    pub fn put_key_artificial(&self, code: KeyCode) {
        if code != KeyCode::NONE {
            self.lock().feed_key(code, 1.0, true);
        }
    }

    /// Feed each character of `text` as a key press with `mods`
    pub fn put_key_utf8(&self, mods: Modifiers, text: &str) {
        let mut state = self.lock();
        for c in text.chars() {
            state.feed_key(KeyCode::char(c) | mods, 1.0, false);
        }
    }

    /// Feed a wheel event; `value` is the scroll amount in wheel steps
    pub fn put_wheel(&self, direction: KeyCode, value: f64) {
        if value == 0.0 {
            return;
        }
        self.lock().feed_key(direction, value, false);
    }

    pub fn set_mouse_pos(&self, x: i32, y: i32) {
        self.lock().set_mouse_pos(x, y);
    }

    /// Queue a command directly, bypassing key resolution and backpressure
    pub fn queue_command(&self, cmd: Command) {
        self.lock().queue_locked(cmd);
    }

    /// Parse `args` and queue the result; false if parsing failed
    pub fn run_command(&self, args: &[&str]) -> bool {
        let mut state = self.lock();
        match state.parser.parse_args(args) {
            Some(cmd) => {
                state.queue_locked(cmd);
                true
            }
            None => false,
        }
    }

    /// Parse command text and queue the result; false if parsing failed
    pub fn run_text(&self, text: &str, location: &str) -> bool {
        let mut state = self.lock();
        match state.parser.parse(text, location) {
            Some(cmd) => {
                state.queue_locked(cmd);
                true
            }
            None => false,
        }
    }

    pub fn enable_section(&self, name: &str, flags: SectionFlags) {
        tracing::debug!("enable section '{}' [{}]", name, flags);
        self.lock().stack.enable(name, flags);
    }

    pub fn disable_section(&self, name: &str) {
        tracing::debug!("disable section '{}'", name);
        self.lock().stack.disable(name);
    }

    pub fn disable_all_sections(&self) {
        self.lock().stack.disable_all();
    }

    /// Restrict a section's mouse bindings to `rect`. A zero-sized rect
    /// lifts the restriction.
    pub fn set_section_mouse_area(&self, name: &str, rect: Rect) {
        self.lock()
            .table
            .set_mouse_area(name, MouseArea::from_rect(rect));
    }

    /// Replace the bindings of a section with `contents` (input.conf lines,
    /// all going to this section), or clear and disable it when `contents`
    /// is empty.
    pub fn define_section(
        &self,
        name: &str,
        location: &str,
        contents: &str,
        builtin: bool,
        owner: Option<&str>,
    ) {
        if name.is_empty() {
            return;
        }
        let mut state = self.lock();
        let section = state.table.section_mut(name);
        let claim = section.owner.is_none()
            || owner.is_some_and(|o| section.owner.as_deref() != Some(o));
        if claim && section.name != DEFAULT_SECTION {
            section.owner = owner.map(str::to_string);
        }
        state.table.remove_bindings(name, builtin);

        if contents.trim().is_empty() {
            state.stack.disable(name);
            return;
        }
        let entries = parse_input_conf(contents, location, builtin, Some(name));
        let count = apply_entries(&mut state.table, entries);
        tracing::debug!("Defined section '{}' ({} bindings)", name, count);
    }

    /// Clear and disable every section defined by `owner`
    pub fn remove_sections_by_owner(&self, owner: &str) {
        let mut state = self.lock();
        for name in state.table.sections_owned_by(owner) {
            state.stack.disable(&name);
            state.table.remove_bindings(&name, false);
            state.table.remove_bindings(&name, true);
        }
    }

    /// Bind a single key in the default section as a user binding. An empty
    /// command removes the binding.
    pub fn bind_key(&self, code: KeyCode, command: &str) {
        let combo = Combo::single(code.normalize());
        let mut state = self.lock();
        if command.trim().is_empty() {
            state.table.unbind(DEFAULT_SECTION, false, &combo);
            return;
        }
        tracing::debug!("bind '{}' -> '{}'", combo, command);
        state
            .table
            .bind(DEFAULT_SECTION, false, combo, command, KEYBIND_LOCATION);
    }

    /// Load input.conf text; returns the number of bindings added
    pub fn load_config_text(&self, text: &str, location: &str, builtin: bool) -> usize {
        self.lock().load_entries(text, location, builtin)
    }

    /// Load an input.conf file as user bindings
    pub fn load_config_file(&self, path: &Path) -> anyhow::Result<usize> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input config {}", path.display()))?;
        let count = self.load_config_text(&text, &path.display().to_string(), false);
        tracing::info!("Loaded input.conf from {} ({} bindings)", path.display(), count);
        Ok(count)
    }

    /// Whether the pointer at this position is over a section that needs the
    /// cursor visible
    pub fn test_mouse_active(&self, x: i32, y: i32) -> bool {
        self.lock().test_mouse(x, y, SectionFlags::ALLOW_HIDE_CURSOR)
    }

    /// Whether a window drag starting at this position must be suppressed
    pub fn test_dragging(&self, x: i32, y: i32) -> bool {
        let state = self.lock();
        !state.config.allow_win_drag || state.test_mouse(x, y, SectionFlags::ALLOW_DRAG)
    }

    /// Incremented on every pointer position change
    pub fn mouse_event_counter(&self) -> u64 {
        self.lock().mouse.event_counter
    }

    pub fn has_abort_commands(&self) -> bool {
        self.lock().queue.has_abort_commands()
    }

    pub fn list_bindings(&self) -> Vec<BindingInfo> {
        let state = self.lock();
        state
            .table
            .sections()
            .flat_map(|section| section.bindings.iter())
            .map(|b| BindingInfo {
                key: b.combo.to_string(),
                section: b.section.clone(),
                command: b.command.clone(),
                location: b.location.clone(),
                builtin: b.builtin,
            })
            .collect()
    }
}

/// The engine. Dropping it stops all input sources.
pub struct InputEngine {
    handle: InputHandle,
}

impl InputEngine {
    pub fn new(config: InputConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: InputConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            parser: None,
            clock: None,
            wakeup: None,
        }
    }

    pub fn handle(&self) -> InputHandle {
        self.handle.clone()
    }

    /// Next command for the consumer. Autorepeat is serviced when the queue
    /// is empty.
    pub fn read_command(&self) -> Option<Command> {
        let mut state = self.handle.lock();
        if state.queue.is_empty() {
            let now = state.clock.now();
            let timing = state.repeat_timing();
            if let Some(repeated) = state.keys.check_autorepeat(now, timing) {
                state.queue.push(repeated);
            }
        }
        let cmd = state.queue.pop_head()?;
        if let Some(pos) = cmd.mouse_move {
            state.mouse.consumer = pos;
        }
        Some(cmd)
    }

    pub fn pending_commands(&self) -> usize {
        self.handle.lock().queue.len()
    }

    /// How long the consumer may sleep before autorepeat needs servicing;
    /// None means until woken
    pub fn get_delay(&self) -> Option<Duration> {
        let state = self.handle.lock();
        state.keys.repeat_delay(state.repeat_timing())
    }

    /// Pointer position as of the last mouse move returned by
    /// [`read_command`](Self::read_command)
    pub fn mouse_pos(&self) -> (i32, i32) {
        self.handle.lock().mouse.consumer
    }

    /// Install the hook run when an abort command is queued
    pub fn set_cancel(&self, hook: Option<AbortHook>) {
        self.handle.lock().queue.set_abort_hook(hook);
    }
}

impl Deref for InputEngine {
    type Target = InputHandle;

    fn deref(&self) -> &InputHandle {
        &self.handle
    }
}

impl Drop for InputEngine {
    fn drop(&mut self) {
        self.handle.close_all_sources();
    }
}

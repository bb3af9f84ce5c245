//! Held-key bookkeeping: down/up pairing, autorepeat and double clicks
//!
//! # Architecture
//!
//! ```text
//!            press(code, cmd)             release()
//!   Idle ─────────────────────────▶ Down ───────────▶ Idle
//!                                    │                 (up command returned
//!                                    │ check_autorepeat  if it emits on up)
//!                                    ▼
//!                      Armed ──delay──▶ Repeating ──1/rate──▶ Repeating
//! ```
//!
//! Only one key is held at a time. Pressing another key releases the
//! previous one first; that is done by the engine, which owns the queue the
//! returned up-commands go to.

use std::time::{Duration, Instant};

use super::command::Command;
use crate::keymap::KeyCode;

/// Repeat timing is rebased if the consumer fell this far behind
const MAX_REPEAT_LAG: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepeatState {
    /// Nothing held, or the held command does not repeat
    Disabled,
    /// Waiting for the initial delay to pass
    Armed,
    Repeating { last: Instant },
}

/// Autorepeat timing knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTiming {
    pub delay: Duration,
    /// Repeats per second; 0 disables autorepeat
    pub rate: u32,
}

impl RepeatTiming {
    fn period(&self) -> Option<Duration> {
        (self.rate > 0).then(|| Duration::from_secs(1) / self.rate)
    }
}

#[derive(Debug)]
pub struct KeyLifecycle {
    held: Option<KeyCode>,
    held_since: Option<Instant>,
    /// Command dispatched on the down edge, kept for key-up and autorepeat
    pending: Option<Command>,
    repeat: RepeatState,
    last_click: Option<(KeyCode, Instant)>,
}

impl Default for KeyLifecycle {
    fn default() -> Self {
        Self {
            held: None,
            held_since: None,
            pending: None,
            repeat: RepeatState::Disabled,
            last_click: None,
        }
    }
}

impl KeyLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held == Some(code.without_state())
    }

    /// Whether the held key is a plain mouse button (not a double click)
    pub fn holds_mouse_button(&self) -> bool {
        self.held.is_some_and(KeyCode::is_mouse_button)
    }

    /// Start holding `code`. `pending` is the command dispatched for the
    /// down edge, if it should be re-emitted on release or autorepeated.
    pub fn press(&mut self, code: KeyCode, pending: Option<Command>, now: Instant) {
        self.held = Some(code.without_state());
        self.held_since = Some(now);
        self.pending = pending;
        self.repeat = RepeatState::Armed;
    }

    /// Mark `code` as held without any command attached
    pub fn hold(&mut self, code: KeyCode, now: Instant) {
        self.held = Some(code.without_state());
        self.held_since = Some(now);
        self.pending = None;
        self.repeat = RepeatState::Disabled;
    }

    /// Forget the held key.
    ///
    /// Returns the key-up command to queue when the pending command emits on
    /// up. With `drop_current` (another key interrupted this one) only
    /// commands that explicitly want both edges get their up edge.
    pub fn release(&mut self, drop_current: bool) -> Option<Command> {
        let up = self
            .pending
            .take()
            .filter(|cmd| cmd.emit_on_up && (!drop_current || cmd.def.on_updown))
            .map(|mut cmd| {
                cmd.is_up = true;
                cmd
            });
        self.held = None;
        self.held_since = None;
        self.repeat = RepeatState::Disabled;
        up
    }

    /// Produce the next autorepeat command if one is due at `now`
    pub fn check_autorepeat(&mut self, now: Instant, timing: RepeatTiming) -> Option<Command> {
        let repeatable = timing.rate > 0
            && self.held.is_some_and(|key| !key.is_no_repeat())
            && self.pending.as_ref().is_some_and(Command::is_repeatable);
        if !repeatable {
            self.repeat = RepeatState::Disabled;
            return None;
        }
        let period = timing.period()?;
        let since = self.held_since?;

        match self.repeat {
            RepeatState::Disabled => None,
            RepeatState::Armed => {
                if now.saturating_duration_since(since) < timing.delay {
                    return None;
                }
                self.repeat = RepeatState::Repeating {
                    last: since + timing.delay,
                };
                self.repeated_command()
            }
            RepeatState::Repeating { mut last } => {
                if now.saturating_duration_since(last) > MAX_REPEAT_LAG {
                    last = now;
                }
                if now.saturating_duration_since(last) < period {
                    self.repeat = RepeatState::Repeating { last };
                    return None;
                }
                self.repeat = RepeatState::Repeating {
                    last: last + period,
                };
                self.repeated_command()
            }
        }
    }

    fn repeated_command(&self) -> Option<Command> {
        let mut cmd = self.pending.clone()?;
        cmd.repeated = true;
        Some(cmd)
    }

    /// Upper bound on how long the consumer may sleep before autorepeat
    /// needs servicing
    pub fn repeat_delay(&self, timing: RepeatTiming) -> Option<Duration> {
        if self.held.is_none() || self.repeat == RepeatState::Disabled {
            return None;
        }
        timing.period().map(|period| period.min(timing.delay))
    }

    /// Record a down edge for double-click detection.
    ///
    /// Returns the double-click key to dispatch when the same key went down
    /// twice within `threshold`.
    pub fn note_down_edge(
        &mut self,
        code: KeyCode,
        now: Instant,
        threshold: Duration,
    ) -> Option<KeyCode> {
        let code = code.without_state();
        let dbl = match self.last_click {
            Some((prev, at)) if prev == code && now.saturating_duration_since(at) < threshold => {
                code.double_click_variant()
            }
            _ => None,
        };
        // A third click starts a new pair
        self.last_click = if dbl.is_some() { None } else { Some((code, now)) };
        dbl
    }
}

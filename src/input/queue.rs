//! Bounded command FIFO between producers and the consumer

use std::collections::VecDeque;
use std::sync::Arc;

use super::command::Command;

/// Callback invoked when an abort-class command is queued. Runs with the
/// engine lock held and must not block.
pub type AbortHook = Arc<dyn Fn() + Send + Sync>;

/// Default maximum queue length for key-generated commands
pub const DEFAULT_QUEUE_LIMIT: usize = 7;

pub struct CommandQueue {
    items: VecDeque<Command>,
    limit: usize,
    abort_hook: Option<AbortHook>,
}

impl CommandQueue {
    pub fn new(limit: usize) -> Self {
        Self {
            items: VecDeque::new(),
            limit,
            abort_hook: None,
        }
    }

    pub fn set_abort_hook(&mut self, hook: Option<AbortHook>) {
        self.abort_hook = hook;
    }

    /// Whether queueing `cmd` would escalate to an abort: always for abort
    /// commands, and for maybe-abort commands only if another maybe-abort
    /// command is already waiting.
    fn escalates(&self, cmd: &Command) -> bool {
        if !cmd.is_maybe_abort() {
            return false;
        }
        cmd.is_abort() || self.items.iter().any(Command::is_maybe_abort)
    }

    /// Append a command, firing the abort hook first if it escalates
    pub fn push(&mut self, cmd: Command) {
        if self.escalates(&cmd) {
            if let Some(hook) = &self.abort_hook {
                tracing::debug!("Abort escalation for '{}'", cmd.name);
                hook();
            }
        }
        self.items.push_back(cmd);
    }

    /// Append a mouse-move command, replacing a mouse move at the tail
    pub fn push_mouse_move(&mut self, cmd: Command) {
        if self.items.back().is_some_and(Command::is_mouse_move) {
            self.items.pop_back();
        }
        self.push(cmd);
    }

    pub fn pop_head(&mut self) -> Option<Command> {
        self.items.pop_front()
    }

    /// Backpressure: the queue is full and `cmd` is not an abort command
    pub fn should_drop(&self, cmd: &Command) -> bool {
        self.items.len() >= self.limit && !cmd.is_abort()
    }

    pub fn has_abort_commands(&self) -> bool {
        self.items.iter().any(Command::is_abort)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("len", &self.items.len())
            .field("limit", &self.limit)
            .field("abort_hook", &self.abort_hook.is_some())
            .finish()
    }
}

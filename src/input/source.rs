//! Threaded input sources
//!
//! Each source runs its own loop on a dedicated thread and feeds events
//! through an [`InputHandle`]. Registration blocks until the loop reports
//! that it is ready to be cancelled. Teardown never cancels a source before
//! that point, so the cancel hook is always in place when it runs.
//!
//! Teardown runs outside the engine lock, in a fixed order:
//! cancel hook, then join, then uninit hook. A record closed while its
//! source is still starting is torn down once registration has settled.

use std::fmt;
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use super::engine::InputHandle;

/// Maximum number of concurrently registered sources
pub const MAX_SOURCES: usize = 10;

/// Longest command line accepted by [`SourceContext::feed_cmd_text`]
pub const MAX_LINE_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Too many input sources (limit {capacity})")]
    RegistryFull { capacity: usize },
    #[error("Failed to spawn input source thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Input source '{name}' failed to initialize")]
    InitFailed { name: String },
    #[error("Input source '{name}' was closed while starting")]
    Closed { name: String },
}

/// A registered source. Consumed by [`InputHandle::kill_source`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type CancelHook = Box<dyn Fn() + Send + Sync>;
type UninitHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Hooks {
    cancel: Option<CancelHook>,
    uninit: Option<UninitHook>,
}

pub(crate) struct SourceRecord {
    id: u64,
    name: String,
    hooks: Mutex<Hooks>,
    thread: Mutex<Option<JoinHandle<()>>>,
    /// Set by the registering thread once init has succeeded or failed and
    /// the join handle is in place
    settled: Mutex<bool>,
    settled_cv: Condvar,
}

impl SourceRecord {
    fn settle(&self) {
        *self.settled.lock() = true;
        self.settled_cv.notify_all();
    }

    fn wait_settled(&self) {
        let mut settled = self.settled.lock();
        while !*settled {
            self.settled_cv.wait(&mut settled);
        }
    }

    fn teardown(&self) {
        self.wait_settled();
        let cancel = self.hooks.lock().cancel.take();
        if let Some(cancel) = cancel {
            cancel();
        }
        let thread = self.thread.lock().take();
        if let Some(thread) = thread {
            if thread.join().is_err() {
                tracing::error!("Input source '{}' #{} panicked", self.name, self.id);
            }
        }
        let uninit = self.hooks.lock().uninit.take();
        if let Some(uninit) = uninit {
            uninit();
        }
        tracing::debug!("Closed input source '{}' #{}", self.name, self.id);
    }
}

/// Sources known to the engine, guarded by the engine lock
#[derive(Default)]
pub(crate) struct SourceRegistry {
    records: Vec<Arc<SourceRecord>>,
    next_id: u64,
}

impl SourceRegistry {
    fn register(&mut self, name: &str) -> Result<Arc<SourceRecord>, SourceError> {
        if self.records.len() >= MAX_SOURCES {
            return Err(SourceError::RegistryFull {
                capacity: MAX_SOURCES,
            });
        }
        self.next_id += 1;
        let record = Arc::new(SourceRecord {
            id: self.next_id,
            name: name.to_string(),
            hooks: Mutex::new(Hooks::default()),
            thread: Mutex::new(None),
            settled: Mutex::new(false),
            settled_cv: Condvar::new(),
        });
        self.records.push(Arc::clone(&record));
        Ok(record)
    }

    fn remove(&mut self, id: u64) -> Option<Arc<SourceRecord>> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(idx))
    }

    fn contains(&self, id: u64) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    fn take_first(&mut self) -> Option<Arc<SourceRecord>> {
        (!self.records.is_empty()).then(|| self.records.remove(0))
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

/// Handed to a source loop running on its own thread
pub struct SourceContext {
    record: Arc<SourceRecord>,
    handle: InputHandle,
    init_tx: Option<SyncSender<bool>>,
    line: Vec<u8>,
    /// Discarding the rest of an over-long line
    dropping: bool,
}

impl SourceContext {
    pub fn handle(&self) -> &InputHandle {
        &self.handle
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Hook asking the loop to return. Called from another thread, at most
    /// once; must not block.
    pub fn set_cancel(&self, cancel: impl Fn() + Send + Sync + 'static) {
        self.record.hooks.lock().cancel = Some(Box::new(cancel));
    }

    /// Hook run after the loop thread has been joined
    pub fn set_uninit(&self, uninit: impl FnOnce() + Send + 'static) {
        self.record.hooks.lock().uninit = Some(Box::new(uninit));
    }

    /// Report successful initialization and unblock the registering thread.
    /// Returning from the loop without calling this reports failure.
    pub fn init_done(&mut self) {
        if let Some(tx) = self.init_tx.take() {
            // Receiver only goes away once registration has given up
            let _ = tx.send(true);
        }
    }

    /// Feed raw bytes of newline-separated command text.
    ///
    /// Partial lines are buffered across calls. Lines longer than
    /// [`MAX_LINE_LEN`] are dropped whole.
    pub fn feed_cmd_text(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let (part, terminated) = match bytes.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    let part = &bytes[..end];
                    bytes = &bytes[end + 1..];
                    (part, true)
                }
                None => {
                    let part = bytes;
                    bytes = &[];
                    (part, false)
                }
            };

            if self.dropping {
                self.dropping = !terminated;
                continue;
            }
            if self.line.len() + part.len() > MAX_LINE_LEN {
                tracing::warn!("Dropping overlong line from input source '{}'", self.name());
                self.line.clear();
                self.dropping = !terminated;
                continue;
            }

            self.line.extend_from_slice(part);
            if terminated {
                let text = String::from_utf8_lossy(&self.line).trim().to_string();
                self.line.clear();
                if !text.is_empty() {
                    let location = format!("<{}>", self.record.name);
                    self.handle.run_text(&text, &location);
                }
            }
        }
    }
}

impl Drop for SourceContext {
    fn drop(&mut self) {
        if let Some(tx) = self.init_tx.take() {
            let _ = tx.send(false);
        }
    }
}

impl InputHandle {
    /// Start `run` on a new thread as an input source.
    ///
    /// Blocks until `run` calls [`SourceContext::init_done`] or returns.
    /// On failure nothing stays registered. If the source is closed by
    /// another thread while starting, that thread tears it down and
    /// [`SourceError::Closed`] is returned.
    pub fn add_thread_source<F>(&self, name: &str, run: F) -> Result<SourceId, SourceError>
    where
        F: FnOnce(&mut SourceContext) + Send + 'static,
    {
        let record = self.lock().sources.register(name)?;
        let id = record.id;
        let (tx, rx) = sync_channel(1);
        let mut ctx = SourceContext {
            record: Arc::clone(&record),
            handle: self.clone(),
            init_tx: Some(tx),
            line: Vec::new(),
            dropping: false,
        };

        let spawned = thread::Builder::new()
            .name(format!("input source {}", name))
            .spawn(move || run(&mut ctx));
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                record.settle();
                self.kill_if_registered(id);
                return Err(SourceError::Spawn(e));
            }
        };
        *record.thread.lock() = Some(thread);

        let ok = rx.recv().unwrap_or(false);
        record.settle();
        if !ok {
            tracing::warn!("Input source '{}' failed to initialize", name);
            self.kill_if_registered(id);
            return Err(SourceError::InitFailed {
                name: name.to_string(),
            });
        }
        if !self.lock().sources.contains(id) {
            tracing::debug!("Input source '{}' #{} closed while starting", name, id);
            return Err(SourceError::Closed {
                name: name.to_string(),
            });
        }
        tracing::debug!("Added input source '{}' #{}", name, id);
        Ok(SourceId(id))
    }

    /// Tear down a record unless a concurrent close already took it
    fn kill_if_registered(&self, id: u64) {
        let record = self.lock().sources.remove(id);
        if let Some(record) = record {
            record.teardown();
        }
    }

    /// Stop a source: cancel, join, uninit.
    ///
    /// # Panics
    ///
    /// If the source is not registered with this engine.
    pub fn kill_source(&self, id: SourceId) {
        let record = self.lock().sources.remove(id.0);
        let Some(record) = record else {
            panic!("Input source {} is not registered", id);
        };
        record.teardown();
    }

    /// Stop every source, oldest first
    pub fn close_all_sources(&self) {
        loop {
            let first = self.lock().sources.take_first();
            match first {
                Some(record) => record.teardown(),
                None => break,
            }
        }
    }

    pub fn source_count(&self) -> usize {
        self.lock().sources.len()
    }
}

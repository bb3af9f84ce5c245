//! Input event resolution and command dispatch
//!
//! Raw key, wheel and pointer events arrive from any number of producer
//! threads. They are normalized, shaped, matched against the active binding
//! sections and turned into [`Command`]s for a single consumer.
//!
//! # Architecture
//!
//! ```text
//! source thread ─┐
//! source thread ─┼─▶ InputHandle ─▶ EngineState ─▶ CommandQueue ─▶ InputEngine::read_command
//! control client ┘                    │
//!                                     ├─ WheelShaper   (deadzone, units)
//!                                     ├─ KeyLifecycle  (held key, autorepeat, double click)
//!                                     └─ Resolver      (section stack + binding table)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let engine = InputEngine::builder(InputConfig::load())
//!     .wakeup(move || waker.wake())
//!     .build();
//! engine.handle().put_key(KeyCode::char('q'));
//! while let Some(cmd) = engine.read_command() {
//!     run(cmd);
//! }
//! ```

mod clock;
mod command;
mod drop;
mod engine;
mod lifecycle;
mod queue;
mod resolver;
mod source;
mod wheel;

pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{AbortClass, BasicParser, Command, CommandDef, CommandParser, CommandRegistry};
pub use drop::{might_be_subtitle_file, DropAction};
pub use engine::{BindingInfo, EngineBuilder, InputEngine, InputHandle, Wakeup};
pub use lifecycle::{KeyLifecycle, RepeatTiming};
pub use queue::{AbortHook, CommandQueue, DEFAULT_QUEUE_LIMIT};
pub use resolver::{ResolveStrategy, Resolver};
pub use source::{SourceContext, SourceError, SourceId, MAX_LINE_LEN, MAX_SOURCES};
pub use wheel::{WheelAxisState, WheelShaper, DEADZONE_DIST, DEADZONE_SCROLL_TIME, UNIT_SCROLL_TIME};

//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::sync::Arc;

use inputmux::config::InputConfig;
use inputmux::input::{Command, InputEngine, ManualClock};

/// Config that loads no bindings from disk or the embedded input.conf
pub fn test_config() -> InputConfig {
    InputConfig {
        builtin_bindings: false,
        load_user_conf: false,
        ..InputConfig::default()
    }
}

/// Engine with the given user bindings and a manual clock
pub fn test_engine(conf: &str) -> (InputEngine, ManualClock) {
    test_engine_with(test_config(), conf)
}

pub fn test_engine_with(config: InputConfig, conf: &str) -> (InputEngine, ManualClock) {
    let clock = ManualClock::new();
    let engine = InputEngine::builder(config)
        .clock(Arc::new(clock.clone()))
        .build();
    engine.load_config_text(conf, "test.conf", false);
    (engine, clock)
}

/// Read every queued command
pub fn drain(engine: &InputEngine) -> Vec<Command> {
    std::iter::from_fn(|| engine.read_command()).collect()
}

/// Read every queued command as its original text
pub fn drain_text(engine: &InputEngine) -> Vec<String> {
    drain(engine).into_iter().map(|c| c.original).collect()
}

/// Read every queued command, skipping pointer movement
pub fn drain_keys(engine: &InputEngine) -> Vec<String> {
    drain(engine)
        .into_iter()
        .filter(|c| !c.is_mouse_move())
        .map(|c| c.original)
        .collect()
}

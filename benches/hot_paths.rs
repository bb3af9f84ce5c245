//! Benchmarks for the per-event hot paths
//!
//! - key resolution against the builtin bindings (put_key + read_command)
//! - key name parsing for input.conf lines
//! - wheel shaping
//! - mouse-move coalescing
//!
//! Run with: cargo bench hot_paths

use std::sync::Arc;
use std::time::{Duration, Instant};

use inputmux::input::{ManualClock, WheelShaper};
use inputmux::keymap::combo_from_name;
use inputmux::{InputConfig, InputEngine, KeyCode, Modifiers};

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

fn main() {
    divan::main();
}

fn builtin_engine() -> (InputEngine, ManualClock) {
    let clock = ManualClock::new();
    let config = InputConfig {
        load_user_conf: false,
        ..InputConfig::default()
    };
    let engine = InputEngine::builder(config)
        .clock(Arc::new(clock.clone()))
        .build();
    (engine, clock)
}

// ============================================================================
// Key resolution
// ============================================================================

#[divan::bench(args = ["q", "SPACE", "Ctrl+s", "RIGHT", "x"])]
fn resolve_key(bencher: divan::Bencher, name: &str) {
    let (engine, _clock) = builtin_engine();
    let key = combo_from_name(name).map(|c| c.keys()[0]).unwrap_or(KeyCode::SPACE);
    bencher.bench_local(|| {
        engine.put_key(divan::black_box(key));
        divan::black_box(engine.read_command())
    });
}

#[divan::bench]
fn resolve_unbound_key(bencher: divan::Bencher) {
    let (engine, _clock) = builtin_engine();
    let key = KeyCode::char('\u{00e9}') | Modifiers::ALT;
    bencher.bench_local(|| {
        engine.put_key(divan::black_box(key));
        divan::black_box(engine.read_command())
    });
}

#[divan::bench(args = [1, 4, 16])]
fn resolve_with_section_stack(bencher: divan::Bencher, depth: usize) {
    let (engine, _clock) = builtin_engine();
    for i in 0..depth {
        let name = format!("layer{}", i);
        engine.define_section(&name, "bench", "a show-text layer", false, None);
        engine.enable_section(&name, inputmux::SectionFlags::NONE);
    }
    bencher.bench_local(|| {
        engine.put_key(divan::black_box(KeyCode::char('q')));
        divan::black_box(engine.read_command())
    });
}

// ============================================================================
// Key name parsing
// ============================================================================

#[divan::bench(args = ["a", "Ctrl+Shift+LEFT", "MBTN_LEFT_DBL", "Alt+x-y-z", "0x20"])]
fn parse_combo(name: &str) {
    divan::black_box(combo_from_name(divan::black_box(name)).ok());
}

// ============================================================================
// Wheel shaping
// ============================================================================

#[divan::bench(args = [0.1, 1.0, 3.5])]
fn wheel_process(bencher: divan::Bencher, delta: f64) {
    let start = Instant::now();
    bencher.bench_local(|| {
        let mut shaper = WheelShaper::new();
        let mut now = start;
        for i in 0..32 {
            let dir = if i % 8 == 7 {
                KeyCode::WHEEL_RIGHT
            } else {
                KeyCode::WHEEL_UP
            };
            now += Duration::from_millis(5);
            divan::black_box(shaper.process(dir, delta, now));
        }
    });
}

// ============================================================================
// Mouse movement
// ============================================================================

#[divan::bench]
fn mouse_move_burst(bencher: divan::Bencher) {
    let (engine, _clock) = builtin_engine();
    bencher.bench_local(|| {
        for i in 0..64 {
            engine.set_mouse_pos(i, i * 2);
        }
        while let Some(cmd) = engine.read_command() {
            divan::black_box(cmd);
        }
    });
}

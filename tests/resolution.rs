//! Binding resolution through the engine: precedence, sections, mouse areas

mod common;

use common::{drain_keys, drain_text, test_engine};
use inputmux::input::InputEngine;
use inputmux::keymap::Rect;
use inputmux::{KeyCode, Modifiers, SectionFlags};
use std::time::Duration;

fn click(engine: &InputEngine, button: KeyCode) {
    engine.put_key(button.down());
    engine.put_key(button.up());
}

// ========================================================================
// Precedence
// ========================================================================

#[test]
fn test_longest_match_wins() {
    let (engine, _) = test_engine("a seek 1\nb-a seek 2\n");
    engine.put_key(KeyCode::char('b'));
    engine.put_key(KeyCode::char('a'));
    assert_eq!(drain_text(&engine), vec!["seek 2"]);
}

#[test]
fn test_chord_prefix_is_not_consumed() {
    // 'b' alone is unbound, so it stays in the history for the chord
    let (engine, _) = test_engine("b-a seek 2\n");
    engine.put_key(KeyCode::char('b'));
    assert!(engine.read_command().is_none());
    engine.put_key(KeyCode::char('a'));
    assert_eq!(drain_text(&engine), vec!["seek 2"]);
}

#[test]
fn test_dispatch_clears_history() {
    let (engine, _) = test_engine("b seek 1\na seek 3\nb-a seek 2\n");
    engine.put_key(KeyCode::char('b'));
    engine.put_key(KeyCode::char('a'));
    assert_eq!(drain_text(&engine), vec!["seek 1", "seek 3"]);
}

#[test]
fn test_user_over_builtin_regardless_of_order() {
    let (engine, _) = test_engine("");
    engine.load_config_text("q quit", "builtin.conf", true);
    engine.load_config_text("q stop", "user.conf", false);
    engine.put_key(KeyCode::char('q'));
    assert_eq!(drain_text(&engine), vec!["stop"]);

    let (engine, _) = test_engine("");
    engine.load_config_text("q stop", "user.conf", false);
    engine.load_config_text("q quit", "builtin.conf", true);
    engine.put_key(KeyCode::char('q'));
    assert_eq!(drain_text(&engine), vec!["stop"]);
}

#[test]
fn test_default_bindings_switch() {
    let config = inputmux::InputConfig {
        default_bindings: false,
        ..common::test_config()
    };
    let (engine, _) = common::test_engine_with(config, "");
    engine.load_config_text("q quit", "builtin.conf", true);
    engine.put_key(KeyCode::char('q'));
    assert!(engine.read_command().is_none());
}

#[test]
fn test_unmapped_catch_all() {
    let (engine, _) = test_engine("UNMAPPED script-binding catch\nx seek 1\n");
    engine.put_key(KeyCode::char('z'));
    engine.put_key(KeyCode::char('x'));
    assert_eq!(drain_text(&engine), vec!["script-binding catch", "seek 1"]);
}

#[test]
fn test_modifier_bindings() {
    let (engine, _) = test_engine("Ctrl+s screenshot\ns screenshot subtitles\nS screenshot video\n");
    engine.put_key(KeyCode::char('s') | Modifiers::CTRL);
    engine.put_key(KeyCode::char('s'));
    engine.put_key(KeyCode::char('s') | Modifiers::SHIFT);
    assert_eq!(
        drain_text(&engine),
        vec!["screenshot", "screenshot subtitles", "screenshot video"]
    );
}

// ========================================================================
// Section stack
// ========================================================================

#[test]
fn test_exclusive_section_short_circuits() {
    let (engine, _) = test_engine("y seek 0\nx {menu} seek 1\n");
    engine.enable_section("menu", SectionFlags::EXCLUSIVE);
    engine.put_key(KeyCode::char('y'));
    engine.put_key(KeyCode::char('x'));
    assert_eq!(drain_text(&engine), vec!["seek 1"]);

    engine.disable_section("menu");
    engine.put_key(KeyCode::char('y'));
    assert_eq!(drain_text(&engine), vec!["seek 0"]);
}

#[test]
fn test_disable_all_sections() {
    let (engine, _) = test_engine("y seek 0\n");
    engine.disable_all_sections();
    engine.put_key(KeyCode::char('y'));
    assert!(engine.read_command().is_none());

    engine.enable_section("default", SectionFlags::NONE);
    engine.put_key(KeyCode::char('y'));
    assert_eq!(drain_text(&engine), vec!["seek 0"]);
}

#[test]
fn test_on_top_section_stays_above() {
    let (engine, _) = test_engine("x {osd} seek 1\nx {menu} seek 2\n");
    engine.enable_section("osd", SectionFlags::ON_TOP);
    engine.enable_section("menu", SectionFlags::NONE);
    engine.put_key(KeyCode::char('x'));
    assert_eq!(drain_text(&engine), vec!["seek 1"]);
}

// ========================================================================
// Mouse areas
// ========================================================================

#[test]
fn test_mouse_area_gates_clicks() {
    let (engine, clock) = test_engine("MBTN_RIGHT cycle pause\nMBTN_RIGHT {osc} script-binding osc/click\n");
    engine.enable_section("osc", SectionFlags::NONE);
    engine.set_section_mouse_area("osc", Rect::new(0, 0, 100, 30));

    engine.set_mouse_pos(50, 10);
    click(&engine, KeyCode::MBTN_RIGHT);
    assert_eq!(drain_keys(&engine), vec!["script-binding osc/click"]);

    clock.advance(Duration::from_secs(1));
    engine.set_mouse_pos(50, 300);
    click(&engine, KeyCode::MBTN_RIGHT);
    assert_eq!(drain_keys(&engine), vec!["cycle pause"]);
}

#[test]
fn test_zero_sized_area_matches_everywhere() {
    let (engine, _) = test_engine("MBTN_RIGHT {osc} script-binding osc/click\n");
    engine.enable_section("osc", SectionFlags::NONE);
    engine.set_section_mouse_area("osc", Rect::new(10, 10, 10, 50));
    engine.set_mouse_pos(900, 900);
    click(&engine, KeyCode::MBTN_RIGHT);
    assert_eq!(drain_keys(&engine), vec!["script-binding osc/click"]);
}

#[test]
fn test_mouse_leave_sent_to_previous_owner() {
    let (engine, _) = test_engine("");
    engine.define_section(
        "osc",
        "osc.lua",
        "MOUSE_MOVE script-binding osc/move\nMOUSE_LEAVE script-binding osc/leave\n",
        false,
        Some("osc.lua"),
    );
    engine.enable_section("osc", SectionFlags::NONE);
    engine.set_section_mouse_area("osc", Rect::new(0, 0, 100, 100));

    engine.set_mouse_pos(10, 10);
    engine.set_mouse_pos(500, 500);
    let cmds = common::drain(&engine);
    let args: Vec<String> = cmds.iter().map(|c| c.args.join(" ")).collect();
    assert_eq!(args, vec!["osc/move", "osc/leave", ""]);
    assert_eq!(cmds[0].mouse_move, Some((10, 10)));
    assert_eq!(cmds[2].name, "ignore");
    assert_eq!(cmds[2].mouse_move, Some((500, 500)));
}

#[test]
fn test_mouse_enter_and_leave_keys() {
    let (engine, _) = test_engine("MOUSE_ENTER script-binding enter\nMOUSE_LEAVE script-binding leave\n");
    engine.put_key(KeyCode::MOUSE_ENTER);
    engine.put_key(KeyCode::MOUSE_LEAVE);
    assert_eq!(
        drain_text(&engine),
        vec!["script-binding enter", "script-binding leave"]
    );
}

#[test]
fn test_mouse_input_can_be_disabled() {
    let config = inputmux::InputConfig {
        enable_mouse_movements: false,
        ..common::test_config()
    };
    let (engine, _) = common::test_engine_with(config, "MBTN_RIGHT cycle pause\nx seek 1\n");
    click(&engine, KeyCode::MBTN_RIGHT);
    engine.set_mouse_pos(3, 4);
    engine.put_key(KeyCode::char('x'));
    assert_eq!(drain_text(&engine), vec!["seek 1"]);

    // Artificial keys bypass the filter
    engine.put_key_artificial(KeyCode::MBTN_RIGHT.down());
    engine.put_key_artificial(KeyCode::MBTN_RIGHT.up());
    assert_eq!(drain_text(&engine), vec!["cycle pause"]);
}

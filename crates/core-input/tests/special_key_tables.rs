//! Exhaustive checks over the special key tables and the notation they produce.

use core_config::AltLiteralConfig;
use core_events::{Action, ModMask};
use core_input::special_keys::{KEY_CODES, KEY_NAMES};
use core_input::{InputEncoder, KeyDisposition, KeyInput, special_key_name};
use pretty_assertions::assert_eq;

fn encode(e: &InputEncoder, ev: KeyInput) -> Option<String> {
    match e.key_down(&ev, "normal") {
        KeyDisposition::Consumed(Action::Input(s)) => Some(s),
        _ => None,
    }
}

#[test]
fn every_identifier_maps_to_its_name() {
    for (id, name) in KEY_NAMES {
        assert_eq!(special_key_name(Some(*id), 0, false).as_deref(), Some(*name), "identifier {id:?}");
    }
}

#[test]
fn every_code_maps_to_its_name() {
    for (code, name) in KEY_CODES {
        assert_eq!(special_key_name(None, *code, false).as_deref(), Some(*name), "code {code}");
    }
}

#[test]
fn identifier_table_matches_expected_pairs() {
    let got: Vec<(&str, &str)> = KEY_NAMES.to_vec();
    let expected = vec![
        ("Escape", "Esc"),
        ("Backspace", "BS"),
        ("Tab", "Tab"),
        ("Enter", "CR"),
        ("PageUp", "PageUp"),
        ("PageDown", "PageDown"),
        ("End", "End"),
        ("Home", "Home"),
        ("ArrowLeft", "Left"),
        ("ArrowUp", "Up"),
        ("ArrowRight", "Right"),
        ("ArrowDown", "Down"),
        ("Insert", "Insert"),
        ("Delete", "Del"),
        ("Help", "Help"),
        ("<", "LT"),
        ("", "Nul"),
    ];
    assert_eq!(got, expected);
}

#[test]
fn function_key_codes_cover_f1_to_f12() {
    let names: Vec<String> = (112..=123)
        .map(|code| special_key_name(None, code, false).unwrap_or_default())
        .collect();
    let expected: Vec<String> = (1..=12).map(|n| format!("F{n}")).collect();
    assert_eq!(names, expected);
}

#[test]
fn codes_outside_table_are_plain() {
    let known: Vec<u32> = KEY_CODES.iter().map(|(c, _)| *c).collect();
    for code in 0..256u32 {
        if known.contains(&code) || code == 188 {
            continue;
        }
        assert_eq!(special_key_name(None, code, true), None, "code {code}");
    }
}

#[test]
fn every_special_key_encodes_with_modifier_prefix() {
    let e = InputEncoder::new(AltLiteralConfig::default());
    for (id, name) in KEY_NAMES {
        let got = encode(&e, KeyInput::new(*id, 0, ModMask::CTRL | ModMask::SHIFT));
        let expected = if *name == "LT" {
            "<C-LT>".to_string()
        } else {
            format!("<C-S-{name}>")
        };
        assert_eq!(got.as_deref(), Some(expected.as_str()), "identifier {id:?}");
    }
}

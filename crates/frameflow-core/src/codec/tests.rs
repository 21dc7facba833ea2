// crates/frameflow-core/src/codec/tests.rs
// ============================================================================
// Module: URL/State Codec Unit Tests
// Description: Unit tests for target resolution and button encoding.
// Purpose: Pin the wire format and edge cases of the codec.
// Dependencies: frameflow-core
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions."
)]

use url::Url;

use super::*;

fn current() -> Url {
    Url::parse("https://frames.example/frames/step?foo=bar&__bi=1:p").unwrap()
}

fn info(index: u8, action: PressedAction) -> ButtonInformation {
    ButtonInformation {
        action,
        index: ButtonIndex::new(index).unwrap(),
    }
}

#[test]
fn join_paths_collapses_slashes() {
    assert_eq!(join_paths("/", ""), "/");
    assert_eq!(join_paths("/frames", ""), "/frames");
    assert_eq!(join_paths("/frames/", ""), "/frames");
    assert_eq!(join_paths("/frames", "/next"), "/frames/next");
    assert_eq!(join_paths("/frames/", "//next/"), "/frames/next/");
    assert_eq!(join_paths("frames", "next"), "/frames/next");
}

#[test]
fn absolute_targets_are_returned_unmodified() {
    let target = ButtonTarget::from("https://other.example/x?y=1");
    let url = generate_target_url(&current(), Some(&target), "/frames").unwrap();
    assert_eq!(url.as_str(), "https://other.example/x?y=1");
}

#[test]
fn missing_target_resolves_to_base_path_without_query() {
    let url = generate_target_url(&current(), None, "/frames").unwrap();
    assert_eq!(url.as_str(), "https://frames.example/frames");
}

#[test]
fn relative_targets_drop_current_query() {
    let target = ButtonTarget::from("/next?page=2");
    let url = generate_target_url(&current(), Some(&target), "/frames").unwrap();
    assert_eq!(url.as_str(), "https://frames.example/frames/next?page=2");
}

#[test]
fn structured_targets_append_query() {
    let target = ButtonTarget::with_query("next", [("b", "2"), ("a", "1")]);
    let url = generate_target_url(&current(), Some(&target), "/").unwrap();
    assert_eq!(url.as_str(), "https://frames.example/next?a=1&b=2");
}

#[test]
fn application_queries_cannot_set_reserved_parameter() {
    let target = ButtonTarget::with_query("/next", [(BUTTON_INFORMATION_PARAM, "4:pr")]);
    let url =
        generate_button_target_url(&current(), Some(&target), "/", info(2, PressedAction::Post))
            .unwrap();
    let values: Vec<String> = url
        .query_pairs()
        .filter(|(key, _)| key == BUTTON_INFORMATION_PARAM)
        .map(|(_, value)| value.into_owned())
        .collect();
    assert_eq!(values, vec!["2:p".to_string()]);
}

#[test]
fn button_target_round_trips() {
    for action in [PressedAction::Post, PressedAction::PostRedirect, PressedAction::Tx] {
        for index in 1..=4 {
            let button = info(index, action);
            let url = generate_button_target_url(&current(), None, "/frames", button).unwrap();
            assert_eq!(parse_button_information_from_target_url(&url), Some(button));
        }
    }
}

#[test]
fn absolute_button_targets_keep_their_query() {
    let target = ButtonTarget::from("https://other.example/x?y=1");
    let url =
        generate_button_target_url(&current(), Some(&target), "/", info(3, PressedAction::Tx))
            .unwrap();
    assert_eq!(url.query(), Some("y=1&__bi=3%3Atx"));
}

#[test]
fn malformed_button_information_is_absent() {
    for raw in ["", "1", ":p", "1:", "0:p", "5:p", "1.0:p", "+1:p", "-1:p", "1:x", "999:p", "a:p"] {
        assert_eq!(decode_button_information(raw), None, "value {raw}");
    }
    let url = Url::parse("https://frames.example/?foo=1").unwrap();
    assert_eq!(parse_button_information_from_target_url(&url), None);
}

#[test]
fn decode_accepts_every_valid_code() {
    assert_eq!(decode_button_information("1:p"), Some(info(1, PressedAction::Post)));
    assert_eq!(decode_button_information("4:pr"), Some(info(4, PressedAction::PostRedirect)));
    assert_eq!(decode_button_information("2:tx"), Some(info(2, PressedAction::Tx)));
}

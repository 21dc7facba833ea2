// crates/frameflow-server/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and command helpers.
// Purpose: Ensure decoding and config summaries fail closed on bad input.
// Dependencies: frameflow-server main helpers
// ============================================================================

//! ## Overview
//! Validates CLI parsing, `decode_button` and `config_summary`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::Parser;
use frameflow_config::FrameflowConfig;
use serde_json::json;

use super::Cli;
use super::Commands;
use super::config_summary;
use super::decode_button;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn decode_button_reads_reserved_parameter() {
    let decoded = decode_button("https://frames.test/app?__bi=2%3Apr").unwrap();
    assert_eq!(decoded, json!({"action": "post_redirect", "index": 2}));
}

#[test]
fn decode_button_rejects_urls_without_button() {
    let err = decode_button("https://frames.test/app?x=1").unwrap_err();
    assert_eq!(err.to_string(), "url carries no button information");
}

#[test]
fn decode_button_rejects_out_of_range_index() {
    assert!(decode_button("https://frames.test/app?__bi=5%3Ap").is_err());
}

#[test]
fn decode_button_rejects_relative_urls() {
    let err = decode_button("/app?__bi=1%3Ap").unwrap_err();
    assert!(err.to_string().starts_with("invalid url"));
}

#[test]
fn config_summary_lists_accepts() {
    let config = FrameflowConfig::from_toml_str(
        "[frames]\nbase_path = \"/counter\"\naccepts = [\"xmtp@vNext\"]\n",
    )
    .unwrap();
    let summary = config_summary(&config).unwrap();
    assert_eq!(summary["base_path"], "/counter");
    assert_eq!(summary["accepts"], json!(["xmtp@vNext"]));
}

#[test]
fn cli_parses_subcommands() {
    let cli = Cli::try_parse_from(["frameflow", "check-config", "--config", "a.toml"]).unwrap();
    match cli.command {
        Some(Commands::CheckConfig(args)) => {
            assert_eq!(args.config.unwrap().to_string_lossy(), "a.toml");
        }
        other => panic!("unexpected command {other:?}"),
    }
    let cli = Cli::try_parse_from(["frameflow", "decode-button", "https://frames.test/?__bi=1%3Ap"])
        .unwrap();
    assert!(matches!(cli.command, Some(Commands::DecodeButton(_))));
}

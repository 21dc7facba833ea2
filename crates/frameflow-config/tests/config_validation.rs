//! Validation tests for frameflow-config.
// crates/frameflow-config/tests/config_validation.rs
// =============================================================================
// Module: Config Validation Tests
// Description: Field-level rules for server, frames and logging sections.
// Purpose: Ensure invalid configuration fails closed.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use frameflow_config::FrameflowConfig;
use frameflow_config::LogSinkKind;
use frameflow_config::MAX_ACCEPTS;
use frameflow_config::MAX_BODY_BYTES_LIMIT;
use frameflow_core::ClientProtocolId;
use serde_json::json;

mod common;

use common::TestResult;
use common::assert_invalid;

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn default_config_validates() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.bind != "127.0.0.1:8080" {
        return Err(format!("unexpected default bind {}", config.server.bind));
    }
    if config.frames.base_path != "/" {
        return Err("base_path should default to '/'".to_string());
    }
    if config.logging.sink != LogSinkKind::Stderr {
        return Err("logging should default to stderr".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Server
// ============================================================================

#[test]
fn bind_must_be_a_socket_address() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = "localhost".to_string();
    assert_invalid(config.validate(), "invalid bind address")
}

#[test]
fn max_body_bytes_rejects_zero() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "max_body_bytes must be greater than zero")
}

#[test]
fn max_body_bytes_accepts_upper_bound() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.max_body_bytes = MAX_BODY_BYTES_LIMIT;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn max_body_bytes_rejects_above_upper_bound() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.max_body_bytes = MAX_BODY_BYTES_LIMIT + 1;
    assert_invalid(config.validate(), "max_body_bytes must not exceed")
}

#[test]
fn public_origin_must_be_absolute() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.public_origin = Some("/relative".to_string());
    assert_invalid(config.validate(), "public_origin must be an absolute url")
}

#[test]
fn public_origin_must_be_http() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.public_origin = Some("ftp://frames.test".to_string());
    assert_invalid(config.validate(), "public_origin must use http or https")
}

#[test]
fn public_origin_must_not_carry_a_path() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.public_origin = Some("https://frames.test/app".to_string());
    assert_invalid(config.validate(), "public_origin must not carry a path")
}

#[test]
fn public_origin_must_not_carry_a_query() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.public_origin = Some("https://frames.test/?x=1".to_string());
    assert_invalid(config.validate(), "public_origin must not carry a path")
}

#[test]
fn public_origin_accepts_trailing_slash() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.public_origin = Some("https://frames.test:8443/".to_string());
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn public_origin_parses() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.public_origin = Some("https://frames.test".to_string());
    let origin = config.server.public_origin_url().map_err(|err| err.to_string())?;
    match origin {
        Some(url) if url.host_str() == Some("frames.test") => Ok(()),
        other => Err(format!("unexpected origin {other:?}")),
    }
}

// ============================================================================
// SECTION: Frames
// ============================================================================

#[test]
fn base_path_must_be_absolute() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.frames.base_path = "frames".to_string();
    assert_invalid(config.validate(), "frames.base_path must start with '/'")
}

#[test]
fn accepts_require_id_and_version() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.frames.accepts = vec!["xmtp".to_string()];
    assert_invalid(config.validate(), "id@version")
}

#[test]
fn accepts_reject_empty_version() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.frames.accepts = vec!["xmtp@".to_string()];
    assert_invalid(config.validate(), "invalid client protocol version")
}

#[test]
fn accepts_are_bounded() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.frames.accepts = (0 ..= MAX_ACCEPTS).map(|i| format!("p{i}@v1")).collect();
    assert_invalid(config.validate(), "frames.accepts must not exceed")
}

#[test]
fn accepts_are_deduplicated_in_order() -> TestResult {
    let config = FrameflowConfig::from_toml_str(
        r#"
[frames]
accepts = ["xmtp@vNext", "lens@1.0.0", "xmtp@vNext"]
"#,
    )
    .map_err(|err| err.to_string())?;
    let protocols = config.frames.accepted_protocols().map_err(|err| err.to_string())?;
    let expected = vec![
        ClientProtocolId::new("xmtp", "vNext").map_err(|err| err.to_string())?,
        ClientProtocolId::new("lens", "1.0.0").map_err(|err| err.to_string())?,
    ];
    if protocols != expected {
        return Err(format!("unexpected protocols {protocols:?}"));
    }
    Ok(())
}

#[test]
fn initial_state_converts_to_json() -> TestResult {
    let config = FrameflowConfig::from_toml_str(
        r#"
[frames.initial_state]
count = 0
label = "start"
ratio = 0.5
tags = ["a", "b"]
"#,
    )
    .map_err(|err| err.to_string())?;
    let state = config.frames.initial_state_json().map_err(|err| err.to_string())?;
    let expected = json!({"count": 0, "label": "start", "ratio": 0.5, "tags": ["a", "b"]});
    if state != Some(expected) {
        return Err(format!("unexpected state {state:?}"));
    }
    Ok(())
}

#[test]
fn initial_state_rejects_nan() -> TestResult {
    assert_invalid(
        FrameflowConfig::from_toml_str("[frames]\ninitial_state = nan\n"),
        "must not contain nan or inf",
    )
}

// ============================================================================
// SECTION: Logging
// ============================================================================

#[test]
fn file_sink_requires_path() -> TestResult {
    assert_invalid(
        FrameflowConfig::from_toml_str("[logging]\nsink = \"file\"\n"),
        "logging.sink=file requires logging.path",
    )
}

#[test]
fn unknown_sink_is_a_parse_error() -> TestResult {
    assert_invalid(
        FrameflowConfig::from_toml_str("[logging]\nsink = \"syslog\"\n"),
        "config parse error",
    )
}

#[test]
fn empty_log_path_is_rejected() -> TestResult {
    assert_invalid(
        FrameflowConfig::from_toml_str("[logging]\nsink = \"file\"\npath = \"  \"\n"),
        "logging.path must be non-empty",
    )
}

#[test]
fn log_path_component_is_bounded() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.logging.sink = LogSinkKind::File;
    config.logging.path = Some(format!("/tmp/{}", "a".repeat(300)));
    assert_invalid(config.validate(), "logging.path path component too long")
}

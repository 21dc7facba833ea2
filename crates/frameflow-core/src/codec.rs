// crates/frameflow-core/src/codec.rs
// ============================================================================
// Module: URL/State Codec
// Description: Target URL resolution and pressed-button encoding.
// Purpose: Encode button identity into target URLs and recover it exactly.
// Dependencies: url, thiserror
// ============================================================================

//! ## Overview
//! Button targets resolve against the frame base path; the current URL only
//! contributes its origin, never its query parameters. Buttons that post back
//! carry a reserved query parameter encoding `"<index>:<code>"`. Decoding
//! never fails: anything malformed is treated as "no button pressed".
//!
//! Invariants:
//! - `parse_button_information_from_target_url(generate_button_target_url(..))`
//!   recovers the encoded index and action.
//! - The reserved parameter is never taken from application-supplied queries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use url::Url;

use crate::core::button::ButtonInformation;
use crate::core::button::ButtonTarget;
use crate::core::button::PressedAction;
use crate::core::identifiers::ButtonIndex;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reserved query parameter carrying pressed-button information.
pub const BUTTON_INFORMATION_PARAM: &str = "__bi";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while resolving target URLs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The target could not be turned into a URL.
    #[error("invalid target url: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// SECTION: Target Resolution
// ============================================================================

/// Returns true when the value is an absolute `http(s)` URL.
#[must_use]
pub fn is_absolute_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Joins path segments and collapses repeated slashes.
///
/// An empty trailing segment does not introduce a trailing slash.
#[must_use]
pub fn join_paths(base: &str, path: &str) -> String {
    let joined = if path.is_empty() { base.to_string() } else { format!("{base}/{path}") };
    let mut normalized = String::with_capacity(joined.len() + 1);
    if !joined.starts_with('/') {
        normalized.push('/');
    }
    let mut previous_slash = false;
    for ch in joined.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        normalized.push(ch);
    }
    if path.is_empty() && normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Resolves the frame base URL: the current origin joined with `base_path`.
///
/// # Errors
///
/// Returns [`CodecError`] when the current URL cannot carry a path.
pub fn resolve_base_url(current: &Url, base_path: &str) -> Result<Url, CodecError> {
    build_url(current, &join_paths(base_path, ""), std::iter::empty())
}

/// Resolves a button or image target against the base path.
///
/// Absolute `http(s)` targets are returned unmodified. Relative targets and
/// structured targets resolve against `base_path` on the current origin; the
/// current URL's own query parameters are discarded.
///
/// # Errors
///
/// Returns [`CodecError`] when the target is not a valid URL.
pub fn generate_target_url(
    current: &Url,
    target: Option<&ButtonTarget>,
    base_path: &str,
) -> Result<Url, CodecError> {
    match target {
        None => resolve_base_url(current, base_path),
        Some(ButtonTarget::Path(raw)) => {
            if is_absolute_http_url(raw) {
                return Url::parse(raw).map_err(|err| CodecError::InvalidUrl(err.to_string()));
            }
            let (path, query) = raw.split_once('?').unwrap_or((raw.as_str(), ""));
            let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            build_url(current, &join_paths(base_path, path), pairs.into_iter())
        }
        Some(ButtonTarget::Structured {
            pathname,
            query,
        }) => {
            let pairs = query.iter().map(|(key, value)| (key.clone(), value.clone()));
            if is_absolute_http_url(pathname) {
                let mut url =
                    Url::parse(pathname).map_err(|err| CodecError::InvalidUrl(err.to_string()))?;
                append_pairs(&mut url, pairs);
                return Ok(url);
            }
            build_url(current, &join_paths(base_path, pathname), pairs)
        }
    }
}

/// Resolves a button target and appends the encoded button information.
///
/// Absolute targets receive the parameter as well so that a post back to an
/// external frame server still identifies the pressed button.
///
/// # Errors
///
/// Returns [`CodecError`] when the target is not a valid URL.
pub fn generate_button_target_url(
    current: &Url,
    target: Option<&ButtonTarget>,
    base_path: &str,
    button: ButtonInformation,
) -> Result<Url, CodecError> {
    let mut url = generate_target_url(current, target, base_path)?;
    strip_reserved(&mut url);
    url.query_pairs_mut()
        .append_pair(BUTTON_INFORMATION_PARAM, &encode_button_information(button));
    Ok(url)
}

/// Recovers pressed-button information from a target URL.
///
/// Returns `None` when the reserved parameter is absent or malformed.
#[must_use]
pub fn parse_button_information_from_target_url(url: &Url) -> Option<ButtonInformation> {
    let (_, value) = url.query_pairs().find(|(key, _)| key == BUTTON_INFORMATION_PARAM)?;
    decode_button_information(&value)
}

// ============================================================================
// SECTION: Button Information Encoding
// ============================================================================

/// Encodes button information as `"<index>:<code>"`.
#[must_use]
pub fn encode_button_information(button: ButtonInformation) -> String {
    format!("{}:{}", button.index, button.action.code())
}

/// Decodes `"<index>:<code>"`; the index must be a plain decimal integer.
#[must_use]
pub fn decode_button_information(value: &str) -> Option<ButtonInformation> {
    let (index, code) = value.split_once(':')?;
    if index.is_empty() || !index.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let index = ButtonIndex::new(index.parse::<u8>().ok()?)?;
    let action = PressedAction::from_code(code)?;
    Some(ButtonInformation {
        action,
        index,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a URL on the current origin with the given path and query pairs.
fn build_url(
    current: &Url,
    path: &str,
    pairs: impl Iterator<Item = (String, String)>,
) -> Result<Url, CodecError> {
    if current.cannot_be_a_base() {
        return Err(CodecError::InvalidUrl(format!("url cannot carry a path: {current}")));
    }
    let mut url = current.clone();
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    append_pairs(&mut url, pairs);
    Ok(url)
}

/// Appends application query pairs, skipping the reserved parameter.
fn append_pairs(url: &mut Url, pairs: impl Iterator<Item = (String, String)>) {
    let pairs: Vec<(String, String)> =
        pairs.filter(|(key, _)| key != BUTTON_INFORMATION_PARAM).collect();
    if pairs.is_empty() {
        return;
    }
    let mut serializer = url.query_pairs_mut();
    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
}

/// Removes any existing reserved parameter from the URL.
fn strip_reserved(url: &mut Url) {
    if !url.query_pairs().any(|(key, _)| key == BUTTON_INFORMATION_PARAM) {
        return;
    }
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != BUTTON_INFORMATION_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.set_query(None);
    append_pairs(url, retained.into_iter());
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;

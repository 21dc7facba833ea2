// crates/frameflow-core/src/metadata.rs
// ============================================================================
// Module: Frame Metadata Encoding
// Description: Flattened frame properties and their HTML/JSON encodings.
// Purpose: Produce equivalent meta-tag and JSON documents for one frame.
// Dependencies: serde_json, bytes
// ============================================================================

//! ## Overview
//! A resolved frame is flattened into ordered `(key, value)` pairs. The HTML
//! encoding emits one `<meta name=.. content=..>` tag per pair; the JSON
//! encoding emits an object with the same pairs. Both carry identical
//! information, so [`parse_meta_tags`] on the HTML document and a JSON parse
//! of the JSON document expose the same key/value set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bytes::Bytes;
use serde_json::Map;
use serde_json::Value;

use crate::core::button::ButtonAction;
use crate::core::error::FrameError;
use crate::core::frame::AspectRatio;
use crate::core::identifiers::ClientProtocolId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `Accept` value selecting the JSON encoding.
pub const FRAME_JSON_MEDIA_TYPE: &str = "application/frame+json";

/// Frame protocol version advertised by `fc:frame` and `of:version`.
pub const FRAME_VERSION: &str = "vNext";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Button with fully resolved targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedButton {
    /// Button label.
    pub label: String,
    /// Declared action.
    pub action: ButtonAction,
    /// Resolved target URL.
    pub target: Option<String>,
    /// Resolved post URL (transaction buttons).
    pub post_url: Option<String>,
}

/// Frame with every URL resolved and state serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMetadata {
    /// Image URL (possibly a `data:` URL).
    pub image: String,
    /// Declared aspect ratio.
    pub aspect_ratio: Option<AspectRatio>,
    /// Default post URL.
    pub post_url: String,
    /// Text input placeholder.
    pub input_text: Option<String>,
    /// Serialized state.
    pub state: Option<String>,
    /// Buttons in display order.
    pub buttons: Vec<RenderedButton>,
    /// Accepted client protocols.
    pub accepts: Vec<ClientProtocolId>,
    /// Document title.
    pub title: Option<String>,
}

impl FrameMetadata {
    /// Flattens the frame into ordered metadata pairs.
    ///
    /// Only the first version of a protocol id is advertised, so every key
    /// appears once.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: String, value: &str| pairs.push((key, value.to_string()));
        push("fc:frame".to_string(), FRAME_VERSION);
        push("og:image".to_string(), &self.image);
        for prefix in ["fc:frame", "of"] {
            if prefix == "of" {
                push("of:version".to_string(), FRAME_VERSION);
                let mut seen: Vec<&str> = Vec::new();
                for protocol in &self.accepts {
                    if seen.contains(&protocol.id.as_str()) {
                        continue;
                    }
                    seen.push(&protocol.id);
                    push(format!("of:accepts:{}", protocol.id), &protocol.version);
                }
            }
            push(format!("{prefix}:image"), &self.image);
            if let Some(ratio) = self.aspect_ratio {
                push(format!("{prefix}:image:aspect_ratio"), ratio.as_str());
            }
            push(format!("{prefix}:post_url"), &self.post_url);
            if let Some(input) = &self.input_text {
                push(format!("{prefix}:input:text"), input);
            }
            if let Some(state) = &self.state {
                push(format!("{prefix}:state"), state);
            }
            for (position, button) in self.buttons.iter().enumerate() {
                let key = format!("{prefix}:button:{}", position + 1);
                push(key.clone(), &button.label);
                push(format!("{key}:action"), button.action.as_str());
                if let Some(target) = &button.target {
                    push(format!("{key}:target"), target);
                }
                if let Some(post_url) = &button.post_url {
                    push(format!("{key}:post_url"), post_url);
                }
            }
        }
        if let Some(title) = &self.title {
            push("og:title".to_string(), title);
        }
        pairs
    }
}

// ============================================================================
// SECTION: Encoders
// ============================================================================

/// Encodes metadata pairs as a flat JSON object.
///
/// # Errors
///
/// Returns [`FrameError`] when serialization fails.
pub fn encode_json(pairs: &[(String, String)]) -> Result<Bytes, FrameError> {
    let object: Map<String, Value> =
        pairs.iter().map(|(key, value)| (key.clone(), Value::String(value.clone()))).collect();
    serde_json::to_vec(&Value::Object(object))
        .map(Bytes::from)
        .map_err(|err| FrameError::internal(format!("metadata serialization failed: {err}")))
}

/// Encodes metadata pairs as an HTML document head.
#[must_use]
pub fn encode_html(pairs: &[(String, String)], title: Option<&str>) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\"/>");
    if let Some(title) = title {
        html.push_str("<title>");
        html.push_str(&escape_html(title));
        html.push_str("</title>");
    }
    for (key, value) in pairs {
        html.push_str("<meta name=\"");
        html.push_str(&escape_html(key));
        html.push_str("\" content=\"");
        html.push_str(&escape_html(value));
        html.push_str("\"/>");
    }
    html.push_str("</head><body></body></html>");
    html
}

/// Extracts `name`/`content` pairs from `<meta>` tags.
///
/// Tags without both attributes are skipped; values are unescaped.
#[must_use]
pub fn parse_meta_tags(html: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = html;
    while let Some(start) = rest.find("<meta ") {
        let after = &rest[start + "<meta ".len() ..];
        let Some(end) = after.find('>') else {
            break;
        };
        let tag = &after[.. end];
        if let (Some(name), Some(content)) = (attribute(tag, "name"), attribute(tag, "content")) {
            pairs.push((unescape_html(name), unescape_html(content)));
        }
        rest = &after[end ..];
    }
    pairs
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the raw value of a double-quoted attribute.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let mut offset = 0;
    while let Some(found) = tag[offset ..].find(&needle) {
        let position = offset + found;
        let boundary = position == 0 || tag[.. position].ends_with(char::is_whitespace);
        let value_start = position + needle.len();
        if boundary {
            let value = &tag[value_start ..];
            return value.find('"').map(|end| &value[.. end]);
        }
        offset = value_start;
    }
    None
}

/// Escapes text for use inside HTML attributes and elements.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Reverses [`escape_html`].
fn unescape_html(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::collections::BTreeMap;

    use super::*;

    fn metadata() -> FrameMetadata {
        FrameMetadata {
            image: "https://frames.test/img.png?a=1&b=2".to_string(),
            aspect_ratio: Some(AspectRatio::Square),
            post_url: "https://frames.test/".to_string(),
            input_text: Some("Say \"hi\" <here>".to_string()),
            state: Some(r#"{"count":1}"#.to_string()),
            buttons: vec![RenderedButton {
                label: "Next".to_string(),
                action: ButtonAction::Post,
                target: Some("https://frames.test/?__bi=1%3Ap".to_string()),
                post_url: None,
            }],
            accepts: vec![
                ClientProtocolId::farcaster(),
                ClientProtocolId::new("xmtp", "vNext").unwrap(),
                ClientProtocolId::new("xmtp", "2024-02-01").unwrap(),
            ],
            title: Some("Counter".to_string()),
        }
    }

    #[test]
    fn flattened_keys_are_unique() {
        let pairs = metadata().flatten();
        let keys: BTreeMap<&str, &str> =
            pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())).collect();
        assert_eq!(keys.len(), pairs.len());
        assert_eq!(keys["of:accepts:xmtp"], "vNext");
        assert_eq!(keys["fc:frame:button:1:action"], "post");
        assert_eq!(keys["of:state"], r#"{"count":1}"#);
    }

    #[test]
    fn html_and_json_expose_identical_pairs() {
        let pairs = metadata().flatten();
        let html = encode_html(&pairs, Some("Counter"));
        let from_html: BTreeMap<String, String> = parse_meta_tags(&html).into_iter().collect();
        let json: Value = serde_json::from_slice(&encode_json(&pairs).unwrap()).unwrap();
        let from_json: BTreeMap<String, String> = json
            .as_object()
            .unwrap()
            .iter()
            .map(|(key, value)| (key.clone(), value.as_str().unwrap().to_string()))
            .collect();
        assert_eq!(from_html, from_json);
        assert_eq!(from_html["fc:frame:input:text"], "Say \"hi\" <here>");
    }

    #[test]
    fn meta_parser_skips_tags_without_name() {
        let html = r#"<meta charset="utf-8"/><meta property="x" content="y"/><meta name="a" content="b"/>"#;
        assert_eq!(parse_meta_tags(html), vec![("a".to_string(), "b".to_string())]);
    }
}

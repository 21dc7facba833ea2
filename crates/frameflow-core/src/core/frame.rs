// crates/frameflow-core/src/core/frame.rs
// ============================================================================
// Module: Frame Definitions
// Description: Handler results: frame definitions, redirects, passthroughs.
// Purpose: Describe the next turn of a frame independently of its encoding.
// Dependencies: bytes, hyper, serde, serde_json
// ============================================================================

//! ## Overview
//! A handler returns a [`FrameResult`]: a typed [`FrameDefinition`], an
//! untyped JSON frame description, a [`FrameRedirect`], or a raw HTTP
//! response. Definitions and redirects are mutually exclusive; the response
//! renderer turns whichever value arrives into exactly one HTTP response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use bytes::Bytes;
use hyper::Response;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::button::FrameButton;
use crate::core::error::FrameError;
use crate::core::identifiers::ClientProtocolId;
use crate::core::identifiers::MAX_BUTTONS;

// ============================================================================
// SECTION: Images
// ============================================================================

/// Renderable image element tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageElement {
    /// Text leaf.
    Text(String),
    /// Element node with properties and children.
    Node {
        /// Element tag name.
        tag: String,
        /// Element properties.
        #[serde(default)]
        props: BTreeMap<String, String>,
        /// Child elements.
        #[serde(default)]
        children: Vec<ImageElement>,
    },
}

impl ImageElement {
    /// Creates an element node.
    #[must_use]
    pub fn node(tag: impl Into<String>, children: Vec<Self>) -> Self {
        Self::Node {
            tag: tag.into(),
            props: BTreeMap::new(),
            children,
        }
    }

    /// Creates a text leaf.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

/// Frame image: a pre-hosted URL or an element rendered on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameImage {
    /// Absolute or base-relative URL (or a `data:` URL).
    Url(String),
    /// Element delegated to the image renderer.
    Element(ImageElement),
}

impl From<&str> for FrameImage {
    fn from(value: &str) -> Self {
        Self::Url(value.to_string())
    }
}

impl From<String> for FrameImage {
    fn from(value: String) -> Self {
        Self::Url(value)
    }
}

impl From<ImageElement> for FrameImage {
    fn from(value: ImageElement) -> Self {
        Self::Element(value)
    }
}

/// Supported frame image aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1.91:1 landscape.
    #[default]
    #[serde(rename = "1.91:1")]
    Wide,
    /// 1:1 square.
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    /// Returns the wire form of the ratio.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wide => "1.91:1",
            Self::Square => "1:1",
        }
    }

    /// Returns the default pixel dimensions for the ratio.
    #[must_use]
    pub const fn default_dimensions(self) -> (u32, u32) {
        match self {
            Self::Wide => (1146, 600),
            Self::Square => (1146, 1146),
        }
    }
}

/// Image rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageOptions {
    /// Declared aspect ratio; omitted from metadata when `None`.
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
    /// Explicit width override in pixels.
    #[serde(default)]
    pub width: Option<u32>,
    /// Explicit height override in pixels.
    #[serde(default)]
    pub height: Option<u32>,
}

impl ImageOptions {
    /// Returns the effective pixel dimensions.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        let (width, height) = self.aspect_ratio.unwrap_or_default().default_dimensions();
        (self.width.unwrap_or(width), self.height.unwrap_or(height))
    }
}

// ============================================================================
// SECTION: Response Init
// ============================================================================

/// Standard response-init fields carried by definitions and redirects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseInit {
    /// Optional status code override.
    pub status: Option<u16>,
    /// Additional response headers, applied after framework headers.
    pub headers: Vec<(String, String)>,
}

// ============================================================================
// SECTION: Frame Definition
// ============================================================================

/// Application description of the next frame turn.
///
/// # Invariants
/// - At most [`MAX_BUTTONS`] buttons render successfully.
/// - `accepts` holds each protocol at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDefinition {
    /// Frame image.
    pub image: FrameImage,
    /// Image options (aspect ratio, dimensions).
    pub image_options: ImageOptions,
    /// Declared buttons, in display order.
    pub buttons: Vec<FrameButton>,
    /// Optional text input placeholder.
    pub text_input: Option<String>,
    /// Optional next-turn state.
    pub state: Option<Value>,
    /// Client protocols the endpoint accepts.
    pub accepts: Vec<ClientProtocolId>,
    /// Optional document title.
    pub title: Option<String>,
    /// Response-init overrides.
    pub init: ResponseInit,
}

impl FrameDefinition {
    /// Creates a definition with the given image and no buttons.
    #[must_use]
    pub fn new(image: impl Into<FrameImage>) -> Self {
        Self {
            image: image.into(),
            image_options: ImageOptions::default(),
            buttons: Vec::new(),
            text_input: None,
            state: None,
            accepts: Vec::new(),
            title: None,
            init: ResponseInit::default(),
        }
    }

    /// Appends a button.
    #[must_use]
    pub fn button(mut self, button: FrameButton) -> Self {
        self.buttons.push(button);
        self
    }

    /// Sets the text input placeholder.
    #[must_use]
    pub fn text_input(mut self, label: impl Into<String>) -> Self {
        self.text_input = Some(label.into());
        self
    }

    /// Sets the next-turn state from a JSON value.
    #[must_use]
    pub fn state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the next-turn state from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] with kind `InvalidStateValue` when the value
    /// cannot be represented as JSON.
    pub fn try_state<T: Serialize>(mut self, state: &T) -> Result<Self, FrameError> {
        let value = serde_json::to_value(state)
            .map_err(|err| FrameError::invalid_state(format!("State must be JSON serializable: {err}")))?;
        self.state = Some(value);
        Ok(self)
    }

    /// Sets the image aspect ratio.
    #[must_use]
    pub const fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.image_options.aspect_ratio = Some(ratio);
        self
    }

    /// Sets the document title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the response status code.
    #[must_use]
    pub const fn status(mut self, status: u16) -> Self {
        self.init.status = Some(status);
        self
    }

    /// Adds a response header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.init.headers.push((name.into(), value.into()));
        self
    }

    /// Declares an accepted client protocol (set semantics).
    #[must_use]
    pub fn accept(mut self, protocol: ClientProtocolId) -> Self {
        self.add_accept(protocol);
        self
    }

    /// Adds an accepted protocol unless already present.
    pub fn add_accept(&mut self, protocol: ClientProtocolId) {
        if !self.accepts.contains(&protocol) {
            self.accepts.push(protocol);
        }
    }

    /// Decodes an untyped JSON frame description.
    ///
    /// The button count is checked before any button is decoded, so an
    /// oversized list reports the count violation first.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] describing the first contract violation.
    pub fn from_value(value: &Value) -> Result<Self, FrameError> {
        let Some(object) = value.as_object() else {
            return Err(FrameError::internal("frame description must be a JSON object"));
        };
        let image = match object.get("image") {
            Some(Value::String(url)) => FrameImage::Url(url.clone()),
            Some(element @ Value::Object(_)) => FrameImage::Element(
                serde_json::from_value(element.clone())
                    .map_err(|err| FrameError::internal(format!("invalid image element: {err}")))?,
            ),
            _ => return Err(FrameError::internal("frame description requires an image")),
        };
        let image_options = match object.get("image_options") {
            None | Some(Value::Null) => ImageOptions::default(),
            Some(options) => serde_json::from_value(options.clone())
                .map_err(|err| FrameError::internal(format!("invalid image options: {err}")))?,
        };
        let buttons = match object.get("buttons") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(raw)) => {
                if raw.len() > MAX_BUTTONS {
                    return Err(FrameError::InvalidButtonCount {
                        count: raw.len(),
                    });
                }
                raw.iter().map(FrameButton::from_value).collect::<Result<Vec<_>, _>>()?
            }
            Some(_) => return Err(FrameError::invalid_button_shape("Buttons must be an array")),
        };
        let mut definition = Self::new(image);
        definition.image_options = image_options;
        definition.buttons = buttons;
        definition.text_input = optional_string(object, "text_input")?;
        definition.title = optional_string(object, "title")?;
        definition.state = object.get("state").filter(|state| !state.is_null()).cloned();
        for protocol in decode_accepts(object.get("accepts"))? {
            definition.add_accept(protocol);
        }
        definition.init = decode_init(object)?;
        Ok(definition)
    }
}

/// Reads an optional string field.
fn optional_string(object: &Map<String, Value>, key: &str) -> Result<Option<String>, FrameError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(FrameError::internal(format!("frame field {key} must be a string"))),
    }
}

/// Reads the `accepts` list of an untyped frame description.
fn decode_accepts(value: Option<&Value>) -> Result<Vec<ClientProtocolId>, FrameError> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(FrameError::internal("frame field accepts must be an array")),
    };
    entries
        .iter()
        .map(|entry| match entry {
            Value::String(raw) => raw
                .parse::<ClientProtocolId>()
                .map_err(|err| FrameError::internal(err.to_string())),
            other => serde_json::from_value::<ClientProtocolId>(other.clone())
                .map_err(|err| FrameError::internal(format!("invalid accepts entry: {err}"))),
        })
        .collect()
}

/// Reads response-init fields of an untyped frame description.
fn decode_init(object: &Map<String, Value>) -> Result<ResponseInit, FrameError> {
    let status = match object.get("status") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_u64()
                .and_then(|status| u16::try_from(status).ok())
                .ok_or_else(|| FrameError::internal("frame status must be an integer"))?,
        ),
    };
    let headers = match object.get("headers") {
        Some(Value::Object(headers)) => headers
            .iter()
            .map(|(name, value)| {
                value
                    .as_str()
                    .map(|value| (name.clone(), value.to_string()))
                    .ok_or_else(|| FrameError::internal("frame header values must be strings"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
    };
    Ok(ResponseInit {
        status,
        headers,
    })
}

// ============================================================================
// SECTION: Redirect
// ============================================================================

/// Redirect returned instead of a frame definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRedirect {
    /// Redirect location.
    pub location: String,
    /// Response-init overrides; status defaults to 302.
    pub init: ResponseInit,
}

impl FrameRedirect {
    /// Creates a redirect to the given location.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            init: ResponseInit::default(),
        }
    }

    /// Overrides the redirect status code.
    #[must_use]
    pub const fn status(mut self, status: u16) -> Self {
        self.init.status = Some(status);
        self
    }
}

// ============================================================================
// SECTION: Frame Result
// ============================================================================

/// Value produced by the middleware chain.
#[derive(Debug)]
pub enum FrameResult {
    /// Raw HTTP response returned unmodified.
    Response(Response<Bytes>),
    /// Typed frame definition.
    Frame(Box<FrameDefinition>),
    /// Untyped JSON frame description, decoded by the renderer.
    Dynamic(Value),
    /// Redirect.
    Redirect(FrameRedirect),
    /// Placeholder returned to a concurrent branch whose continuation was
    /// captured; never reaches the renderer in a well-formed chain.
    Deferred,
}

impl FrameResult {
    /// Wraps a typed frame definition.
    #[must_use]
    pub fn frame(definition: FrameDefinition) -> Self {
        Self::Frame(Box::new(definition))
    }

    /// Returns true for typed and untyped frame descriptions.
    #[must_use]
    pub const fn is_frame(&self) -> bool {
        matches!(self, Self::Frame(_) | Self::Dynamic(_))
    }

    /// Returns true for redirects and redirect-status responses.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        match self {
            Self::Redirect(_) => true,
            Self::Response(response) => response.status().is_redirection(),
            Self::Frame(_) | Self::Dynamic(_) | Self::Deferred => false,
        }
    }

    /// Sets the frame state when the frame does not declare its own.
    pub fn fill_default_state(&mut self, state: &Value) {
        match self {
            Self::Frame(definition) => {
                if definition.state.is_none() {
                    definition.state = Some(state.clone());
                }
            }
            Self::Dynamic(Value::Object(object)) => {
                let missing = object.get("state").is_none_or(Value::is_null);
                if missing {
                    object.insert("state".to_string(), state.clone());
                }
            }
            Self::Dynamic(_) | Self::Response(_) | Self::Redirect(_) | Self::Deferred => {}
        }
    }

    /// Adds an accepted protocol to a frame result (set semantics).
    pub fn add_accept(&mut self, protocol: &ClientProtocolId) {
        match self {
            Self::Frame(definition) => definition.add_accept(protocol.clone()),
            Self::Dynamic(Value::Object(object)) => {
                let canonical = protocol.to_string();
                let entry = object.entry("accepts".to_string()).or_insert(Value::Null);
                if entry.is_null() {
                    *entry = Value::Array(Vec::new());
                } else if !entry.is_array() {
                    let existing = entry.take();
                    *entry = Value::Array(vec![existing]);
                }
                if let Value::Array(accepts) = entry {
                    let present = accepts.iter().any(|existing| {
                        existing.as_str() == Some(canonical.as_str())
                            || serde_json::from_value::<ClientProtocolId>(existing.clone())
                                .is_ok_and(|existing| &existing == protocol)
                    });
                    if !present {
                        accepts.push(Value::String(canonical));
                    }
                }
            }
            Self::Dynamic(_) | Self::Response(_) | Self::Redirect(_) | Self::Deferred => {}
        }
    }
}

impl From<FrameDefinition> for FrameResult {
    fn from(value: FrameDefinition) -> Self {
        Self::frame(value)
    }
}

impl From<FrameRedirect> for FrameResult {
    fn from(value: FrameRedirect) -> Self {
        Self::Redirect(value)
    }
}

impl From<Response<Bytes>> for FrameResult {
    fn from(value: Response<Bytes>) -> Self {
        Self::Response(value)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

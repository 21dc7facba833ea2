// crates/frameflow-core/src/core/button.rs
// ============================================================================
// Module: Frame Buttons
// Description: Button actions, pressed-button information, and button targets.
// Purpose: Model the closed set of frame button kinds and their wire codes.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Frames declare up to four buttons. `post`, `post_redirect` and `tx` buttons
//! round-trip through the server and carry a short action code in their target
//! URL; `link` and `mint` buttons are resolved entirely by the client.
//!
//! Untyped button descriptions (JSON objects) are decoded with
//! [`FrameButton::from_value`], which distinguishes unknown actions from
//! otherwise malformed buttons.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::FrameError;
use crate::core::identifiers::ButtonIndex;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum button label length in bytes.
pub const MAX_BUTTON_LABEL_BYTES: usize = 256;

// ============================================================================
// SECTION: Actions
// ============================================================================

/// Closed set of button actions a frame may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    /// Posts back to the frame server and renders the next frame.
    Post,
    /// Posts back to the frame server and expects a redirect.
    PostRedirect,
    /// Requests transaction data and posts the transaction result back.
    Tx,
    /// Opens an external URL on the client.
    Link,
    /// Mints the referenced token on the client.
    Mint,
}

impl ButtonAction {
    /// Returns the wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::PostRedirect => "post_redirect",
            Self::Tx => "tx",
            Self::Link => "link",
            Self::Mint => "mint",
        }
    }

    /// Parses a wire action name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "post" => Some(Self::Post),
            "post_redirect" => Some(Self::PostRedirect),
            "tx" => Some(Self::Tx),
            "link" => Some(Self::Link),
            "mint" => Some(Self::Mint),
            _ => None,
        }
    }
}

impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions that round-trip through the frame server.
///
/// # Invariants
/// - Each variant maps to exactly one short wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressedAction {
    /// Button declared `post`.
    Post,
    /// Button declared `post_redirect`.
    PostRedirect,
    /// Button declared `tx`.
    Tx,
}

impl PressedAction {
    /// Returns the short code embedded in button target URLs.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Post => "p",
            Self::PostRedirect => "pr",
            Self::Tx => "tx",
        }
    }

    /// Parses a short action code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "p" => Some(Self::Post),
            "pr" => Some(Self::PostRedirect),
            "tx" => Some(Self::Tx),
            _ => None,
        }
    }

    /// Returns the wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.as_button_action().as_str()
    }

    /// Widens the pressed action into the general action set.
    #[must_use]
    pub const fn as_button_action(self) -> ButtonAction {
        match self {
            Self::Post => ButtonAction::Post,
            Self::PostRedirect => ButtonAction::PostRedirect,
            Self::Tx => ButtonAction::Tx,
        }
    }
}

/// Pressed button recovered from a request URL.
///
/// # Invariants
/// - Exists only for the duration of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ButtonInformation {
    /// Action the button declared when it was rendered.
    pub action: PressedAction,
    /// One-based index of the button.
    pub index: ButtonIndex,
}

// ============================================================================
// SECTION: Targets
// ============================================================================

/// Target of a `post`, `post_redirect` or `tx` button.
///
/// # Invariants
/// - Relative paths resolve against the frame base path.
/// - Absolute `http(s)://` strings are used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ButtonTarget {
    /// Path (optionally with a query string) or absolute URL.
    Path(String),
    /// Path plus explicit query parameters.
    Structured {
        /// Path relative to the base path.
        pathname: String,
        /// Query parameters appended to the resolved URL.
        #[serde(default)]
        query: BTreeMap<String, String>,
    },
}

impl ButtonTarget {
    /// Creates a structured target.
    #[must_use]
    pub fn with_query<K, V>(pathname: impl Into<String>, query: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Structured {
            pathname: pathname.into(),
            query: query.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
        }
    }
}

impl From<&str> for ButtonTarget {
    fn from(value: &str) -> Self {
        Self::Path(value.to_string())
    }
}

impl From<String> for ButtonTarget {
    fn from(value: String) -> Self {
        Self::Path(value)
    }
}

// ============================================================================
// SECTION: Buttons
// ============================================================================

/// Button declared by a frame definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameButton {
    /// Post back to the server.
    Post {
        /// Button label.
        label: String,
        /// Optional target; defaults to the base path.
        target: Option<ButtonTarget>,
    },
    /// Post back and expect a redirect.
    PostRedirect {
        /// Button label.
        label: String,
        /// Optional target; defaults to the base path.
        target: Option<ButtonTarget>,
    },
    /// Transaction button.
    Tx {
        /// Button label.
        label: String,
        /// Endpoint returning transaction data.
        target: ButtonTarget,
        /// Optional endpoint receiving the transaction result.
        post_url: Option<ButtonTarget>,
    },
    /// External link.
    Link {
        /// Button label.
        label: String,
        /// Absolute `http(s)` URL.
        target: String,
    },
    /// Mint action.
    Mint {
        /// Button label.
        label: String,
        /// CAIP-10 style token reference.
        target: String,
    },
}

impl FrameButton {
    /// Creates a `post` button.
    #[must_use]
    pub fn post(label: impl Into<String>, target: Option<ButtonTarget>) -> Self {
        Self::Post {
            label: label.into(),
            target,
        }
    }

    /// Creates a `post_redirect` button.
    #[must_use]
    pub fn post_redirect(label: impl Into<String>, target: Option<ButtonTarget>) -> Self {
        Self::PostRedirect {
            label: label.into(),
            target,
        }
    }

    /// Creates a `link` button.
    #[must_use]
    pub fn link(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Link {
            label: label.into(),
            target: target.into(),
        }
    }

    /// Returns the button label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Post {
                label, ..
            }
            | Self::PostRedirect {
                label, ..
            }
            | Self::Tx {
                label, ..
            }
            | Self::Link {
                label, ..
            }
            | Self::Mint {
                label, ..
            } => label,
        }
    }

    /// Returns the declared action.
    #[must_use]
    pub const fn action(&self) -> ButtonAction {
        match self {
            Self::Post {
                ..
            } => ButtonAction::Post,
            Self::PostRedirect {
                ..
            } => ButtonAction::PostRedirect,
            Self::Tx {
                ..
            } => ButtonAction::Tx,
            Self::Link {
                ..
            } => ButtonAction::Link,
            Self::Mint {
                ..
            } => ButtonAction::Mint,
        }
    }

    /// Validates the button shape.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] with kind `InvalidButtonShape` when the label or
    /// target is malformed.
    pub fn validate(&self) -> Result<(), FrameError> {
        let label = self.label();
        if label.trim().is_empty() {
            return Err(FrameError::invalid_button_shape("Button label must not be empty"));
        }
        if label.len() > MAX_BUTTON_LABEL_BYTES {
            return Err(FrameError::invalid_button_shape(format!(
                "Button label must not exceed {MAX_BUTTON_LABEL_BYTES} bytes"
            )));
        }
        match self {
            Self::Link {
                target, ..
            } => {
                if !(target.starts_with("http://") || target.starts_with("https://")) {
                    return Err(FrameError::invalid_button_shape(
                        "Link button target must be an absolute http(s) URL",
                    ));
                }
            }
            Self::Mint {
                target, ..
            } => {
                if target.trim().is_empty() {
                    return Err(FrameError::invalid_button_shape(
                        "Mint button target must not be empty",
                    ));
                }
            }
            Self::Post {
                ..
            }
            | Self::PostRedirect {
                ..
            }
            | Self::Tx {
                ..
            } => {}
        }
        Ok(())
    }

    /// Decodes an untyped button description.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] with kind `UnrecognizedButtonAction` when the
    /// `action` is not one of the closed set, and `InvalidButtonShape` when the
    /// value is not a button object.
    pub fn from_value(value: &Value) -> Result<Self, FrameError> {
        let Some(object) = value.as_object() else {
            return Err(FrameError::invalid_button_shape("Button must be an object"));
        };
        let action = match object.get("action") {
            None | Some(Value::Null) => ButtonAction::Post,
            Some(Value::String(action)) => ButtonAction::parse(action)
                .ok_or_else(|| FrameError::unrecognized_button_action(action.clone()))?,
            Some(other) => return Err(FrameError::unrecognized_button_action(other.to_string())),
        };
        let Some(label) = object.get("label").and_then(Value::as_str) else {
            return Err(FrameError::invalid_button_shape("Button label must be a string"));
        };
        let label = label.to_string();
        let target = decode_target(object.get("target"))?;
        let button = match action {
            ButtonAction::Post => Self::Post {
                label,
                target,
            },
            ButtonAction::PostRedirect => Self::PostRedirect {
                label,
                target,
            },
            ButtonAction::Tx => {
                let Some(target) = target else {
                    return Err(FrameError::invalid_button_shape("Tx button requires a target"));
                };
                Self::Tx {
                    label,
                    target,
                    post_url: decode_target(object.get("post_url"))?,
                }
            }
            ButtonAction::Link | ButtonAction::Mint => {
                let Some(ButtonTarget::Path(target)) = target else {
                    return Err(FrameError::invalid_button_shape(format!(
                        "{action} button requires a string target"
                    )));
                };
                if action == ButtonAction::Link {
                    Self::Link {
                        label,
                        target,
                    }
                } else {
                    Self::Mint {
                        label,
                        target,
                    }
                }
            }
        };
        Ok(button)
    }
}

/// Decodes an optional target field of an untyped button.
fn decode_target(value: Option<&Value>) -> Result<Option<ButtonTarget>, FrameError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value::<ButtonTarget>(value.clone())
            .map(Some)
            .map_err(|_| FrameError::invalid_button_shape("Button target is malformed")),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// crates/frameflow-core/src/core/error.rs
// ============================================================================
// Module: Frame Errors
// Description: Pipeline error taxonomy with explicit error kinds.
// Purpose: Map every failure to a stable kind and a client-safe message.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`FrameError`] is the single error type flowing through the middleware
//! chain. Errors are caught once, at the response renderer, which uses
//! [`FrameError::public_message`] to decide what the client may see.
//! Contract violations by the application expose their message; collaborator
//! failures expose a fixed message; everything else is reported generically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::MAX_BUTTONS;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Generic message reported for internal failures.
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";
/// Fixed message reported for image rendering failures.
pub const IMAGE_RENDER_ERROR_MESSAGE: &str = "Failed to render image";

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Stable classification of pipeline errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling and log labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameErrorKind {
    /// More than four buttons were declared.
    InvalidButtonCount,
    /// A button declared an action outside the closed set.
    UnrecognizedButtonAction,
    /// A button is not a well-formed button element.
    InvalidButtonShape,
    /// The frame state is not a valid state value.
    InvalidStateValue,
    /// The image renderer failed.
    ImageRender,
    /// A client protocol handler failed while extracting a message.
    Protocol,
    /// Any other failure.
    Internal,
}

impl FrameErrorKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidButtonCount => "invalid_button_count",
            Self::UnrecognizedButtonAction => "unrecognized_button_action",
            Self::InvalidButtonShape => "invalid_button_shape",
            Self::InvalidStateValue => "invalid_state_value",
            Self::ImageRender => "image_render",
            Self::Protocol => "protocol",
            Self::Internal => "internal",
        }
    }
}

// ============================================================================
// SECTION: Frame Error
// ============================================================================

/// Errors raised while handling a frame request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// More than the allowed number of buttons.
    #[error("Only {} buttons are allowed", MAX_BUTTONS)]
    InvalidButtonCount {
        /// Number of buttons declared.
        count: usize,
    },
    /// Unknown button action.
    #[error("Unrecognized button action: {action}")]
    UnrecognizedButtonAction {
        /// Action name as declared.
        action: String,
    },
    /// Malformed button element.
    #[error("{0}")]
    InvalidButtonShape(String),
    /// Invalid frame state.
    #[error("{0}")]
    InvalidStateValue(String),
    /// Image renderer failure.
    #[error("image render failed: {0}")]
    ImageRender(String),
    /// Client protocol handler failure.
    #[error("client protocol error: {0}")]
    Protocol(String),
    /// Internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FrameError {
    /// Builds an invalid button shape error.
    #[must_use]
    pub fn invalid_button_shape(message: impl Into<String>) -> Self {
        Self::InvalidButtonShape(message.into())
    }

    /// Builds an unrecognized button action error.
    #[must_use]
    pub fn unrecognized_button_action(action: impl Into<String>) -> Self {
        Self::UnrecognizedButtonAction {
            action: action.into(),
        }
    }

    /// Builds an invalid state value error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidStateValue(message.into())
    }

    /// Builds an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the stable kind of the error.
    #[must_use]
    pub const fn kind(&self) -> FrameErrorKind {
        match self {
            Self::InvalidButtonCount {
                ..
            } => FrameErrorKind::InvalidButtonCount,
            Self::UnrecognizedButtonAction {
                ..
            } => FrameErrorKind::UnrecognizedButtonAction,
            Self::InvalidButtonShape(_) => FrameErrorKind::InvalidButtonShape,
            Self::InvalidStateValue(_) => FrameErrorKind::InvalidStateValue,
            Self::ImageRender(_) => FrameErrorKind::ImageRender,
            Self::Protocol(_) => FrameErrorKind::Protocol,
            Self::Internal(_) => FrameErrorKind::Internal,
        }
    }

    /// Returns the message that may be shown to the client.
    ///
    /// Application contract violations reveal their message; image failures
    /// reveal a fixed message; all other failures are reported generically.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.kind() {
            FrameErrorKind::InvalidButtonCount
            | FrameErrorKind::UnrecognizedButtonAction
            | FrameErrorKind::InvalidButtonShape
            | FrameErrorKind::InvalidStateValue => self.to_string(),
            FrameErrorKind::ImageRender => IMAGE_RENDER_ERROR_MESSAGE.to_string(),
            FrameErrorKind::Protocol | FrameErrorKind::Internal => {
                INTERNAL_SERVER_ERROR_MESSAGE.to_string()
            }
        }
    }
}

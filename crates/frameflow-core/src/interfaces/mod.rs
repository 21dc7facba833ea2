// crates/frameflow-core/src/interfaces/mod.rs
// ============================================================================
// Module: Frameflow Interfaces
// Description: Contracts for external collaborators of the frame pipeline.
// Purpose: Keep signature schemes and image rasterizers out of the core.
// Dependencies: async-trait, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The core never hardcodes a signature scheme or an image backend. Client
//! protocols plug in through [`ClientProtocolHandler`]; image production
//! plugs in through [`ImageRenderer`]. Both receive untrusted inputs and must
//! not panic on malformed data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::frame::ImageElement;
use crate::core::frame::ImageOptions;
use crate::core::message::FrameMessage;

// ============================================================================
// SECTION: Client Protocol Handler
// ============================================================================

/// Client protocol handler errors.
///
/// # Invariants
/// - `InvalidPayload` degrades to "no message"; other variants fail the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The payload claimed by the handler turned out to be malformed.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    /// Signature or identity verification failed.
    #[error("verification failed: {0}")]
    Verification(String),
    /// The handler failed for another reason (network, backend).
    #[error("protocol handler error: {0}")]
    Handler(String),
}

/// Signature/identity scheme able to claim and decode POST bodies.
#[async_trait]
pub trait ClientProtocolHandler: Send + Sync {
    /// Returns true when the JSON body belongs to this protocol.
    fn is_valid_payload(&self, body: &Value) -> bool;

    /// Extracts the normalized message from a claimed body.
    ///
    /// Returns `Ok(None)` when the body carries no usable message.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the message cannot be verified.
    async fn frame_message(&self, body: &Value) -> Result<Option<FrameMessage>, ProtocolError>;
}

// ============================================================================
// SECTION: Image Renderer
// ============================================================================

/// Image renderer errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageRenderError {
    /// The element uses features the renderer cannot draw.
    #[error("unsupported image element: {0}")]
    Unsupported(String),
    /// Rendering failed.
    #[error("image render failed: {0}")]
    Failed(String),
}

/// Renders image elements into URLs (typically `data:` URLs).
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Renders the element with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`ImageRenderError`] when the element cannot be rendered.
    async fn render(
        &self,
        element: &ImageElement,
        options: &ImageOptions,
    ) -> Result<String, ImageRenderError>;
}

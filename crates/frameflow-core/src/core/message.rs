// crates/frameflow-core/src/core/message.rs
// ============================================================================
// Module: Frame Messages
// Description: Normalized client message extracted from a POST body.
// Purpose: Decouple the pipeline from any one client signature scheme.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every client protocol handler reduces its signed payload to a
//! [`FrameMessage`]. Common fields are typed; protocol-specific data is kept
//! in [`FrameMessage::details`] for handlers and applications that need it.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ButtonIndex;

/// Message decoded from a client POST body.
///
/// # Invariants
/// - `state` is the raw serialized state echoed by the client, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameMessage {
    /// Index of the button the user pressed, as reported by the client.
    #[serde(default)]
    pub button_index: Option<ButtonIndex>,
    /// Text entered in the frame input, if any.
    #[serde(default)]
    pub input_text: Option<String>,
    /// Serialized state carried from the previous turn.
    #[serde(default)]
    pub state: Option<String>,
    /// Transaction identifier for transaction results.
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Wallet address connected by the user.
    #[serde(default)]
    pub connected_address: Option<String>,
    /// Protocol-specific identity of the requester (fid, address, profile id).
    #[serde(default)]
    pub requester: Option<String>,
    /// URL of the frame as seen by the client.
    #[serde(default)]
    pub url: Option<String>,
    /// Protocol-specific payload.
    #[serde(default)]
    pub details: Value,
}

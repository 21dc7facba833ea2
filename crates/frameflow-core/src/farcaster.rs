// crates/frameflow-core/src/farcaster.rs
// ============================================================================
// Module: Farcaster Client Protocol
// Description: Hub-native frame action payload handler.
// Purpose: Decode `untrustedData`/`trustedData` POST bodies into messages.
// Dependencies: async-trait, serde_json
// ============================================================================

//! ## Overview
//! [`FarcasterProtocol`] claims POST bodies carrying both an `untrustedData`
//! object and a `trustedData` object, the shape hub-native clients send on a
//! button press. The untrusted fields are mapped onto a [`FrameMessage`]
//! after the configured [`FarcasterMessageValidator`] accepts the payload.
//!
//! Security posture: [`UntrustedValidator`] accepts every payload, so
//! messages decoded with it carry client-asserted identity only. Deployments
//! that act on `requester` must plug in a validator that checks
//! `trustedData.messageBytes` against a hub.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::ButtonIndex;
use crate::core::message::FrameMessage;
use crate::interfaces::ClientProtocolHandler;
use crate::interfaces::ProtocolError;

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Verifies the signed part of a hub-native payload.
#[async_trait]
pub trait FarcasterMessageValidator: Send + Sync {
    /// Accepts or rejects a claimed payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Verification`] when the signature does not
    /// match, or [`ProtocolError::Handler`] when the hub cannot be reached.
    async fn validate(&self, trusted: &Value, untrusted: &Value) -> Result<(), ProtocolError>;
}

/// Validator that accepts every payload without checking signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntrustedValidator;

#[async_trait]
impl FarcasterMessageValidator for UntrustedValidator {
    async fn validate(&self, _trusted: &Value, _untrusted: &Value) -> Result<(), ProtocolError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Client protocol handler for hub-native frame actions.
#[derive(Clone)]
pub struct FarcasterProtocol {
    /// Signature check run before the message is decoded.
    validator: Arc<dyn FarcasterMessageValidator>,
}

impl FarcasterProtocol {
    /// Creates a handler that trusts client-asserted fields.
    #[must_use]
    pub fn untrusted() -> Self {
        Self::with_validator(Arc::new(UntrustedValidator))
    }

    /// Creates a handler that verifies payloads with `validator`.
    #[must_use]
    pub fn with_validator(validator: Arc<dyn FarcasterMessageValidator>) -> Self {
        Self {
            validator,
        }
    }
}

#[async_trait]
impl ClientProtocolHandler for FarcasterProtocol {
    fn is_valid_payload(&self, body: &Value) -> bool {
        body.get("untrustedData").is_some_and(Value::is_object)
            && body.get("trustedData").is_some_and(Value::is_object)
    }

    async fn frame_message(&self, body: &Value) -> Result<Option<FrameMessage>, ProtocolError> {
        let (Some(untrusted), Some(trusted)) = (body.get("untrustedData"), body.get("trustedData"))
        else {
            return Err(ProtocolError::InvalidPayload(
                "untrustedData and trustedData are required".to_string(),
            ));
        };
        let Some(fields) = untrusted.as_object() else {
            return Err(ProtocolError::InvalidPayload("untrustedData must be an object".to_string()));
        };
        self.validator.validate(trusted, untrusted).await?;
        Ok(Some(FrameMessage {
            button_index: fields
                .get("buttonIndex")
                .and_then(Value::as_u64)
                .and_then(|index| u8::try_from(index).ok())
                .and_then(ButtonIndex::new),
            input_text: text_field(fields, "inputText"),
            state: text_field(fields, "state"),
            transaction_id: text_field(fields, "transactionId"),
            connected_address: text_field(fields, "address"),
            requester: identity_field(fields, "fid"),
            url: text_field(fields, "url"),
            details: untrusted.clone(),
        }))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a non-empty string field.
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).filter(|value| !value.is_empty()).map(str::to_string)
}

/// Reads an identity that clients send either as a number or a string.
fn identity_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Number(number) => Some(number.to_string()),
        Value::String(value) if !value.is_empty() => Some(value.clone()),
        _ => None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

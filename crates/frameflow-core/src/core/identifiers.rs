// crates/frameflow-core/src/core/identifiers.rs
// ============================================================================
// Module: Frameflow Identifiers
// Description: Client protocol identifiers and button indices.
// Purpose: Provide strongly typed identifiers with stable string forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Client protocols are identified by an `id` and a `version` and serialize
//! canonically as `"id@version"`. Button indices are 1-based and bounded by
//! the frame button limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of buttons a frame may declare.
pub const MAX_BUTTONS: usize = 4;

// ============================================================================
// SECTION: Client Protocol Identifier
// ============================================================================

/// Identifier of a client signature/identity protocol.
///
/// # Invariants
/// - `id` and `version` are non-empty and `id` contains no `@`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientProtocolId {
    /// Protocol identifier (for example `xmtp`).
    pub id: String,
    /// Protocol version (for example `vNext`).
    pub version: String,
}

impl ClientProtocolId {
    /// Creates a new protocol identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolIdError`] when either part is empty or the id contains `@`.
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Result<Self, ProtocolIdError> {
        let id = id.into();
        let version = version.into();
        if id.trim().is_empty() || id.contains('@') {
            return Err(ProtocolIdError::InvalidId(id));
        }
        if version.trim().is_empty() {
            return Err(ProtocolIdError::InvalidVersion(version));
        }
        Ok(Self {
            id,
            version,
        })
    }

    /// Returns the hub-native protocol identifier advertised by every frame.
    #[must_use]
    pub fn farcaster() -> Self {
        Self {
            id: "farcaster".to_string(),
            version: "vNext".to_string(),
        }
    }
}

impl fmt::Display for ClientProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

impl FromStr for ClientProtocolId {
    type Err = ProtocolIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((id, version)) = value.split_once('@') else {
            return Err(ProtocolIdError::MissingSeparator(value.to_string()));
        };
        Self::new(id, version)
    }
}

/// Errors raised while parsing protocol identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolIdError {
    /// The canonical form lacks the `@` separator.
    #[error("client protocol must be formatted as id@version: {0}")]
    MissingSeparator(String),
    /// The id part is empty or malformed.
    #[error("invalid client protocol id: '{0}'")]
    InvalidId(String),
    /// The version part is empty.
    #[error("invalid client protocol version: '{0}'")]
    InvalidVersion(String),
}

// ============================================================================
// SECTION: Button Index
// ============================================================================

/// One-based index of a frame button.
///
/// # Invariants
/// - Value is within `1..=MAX_BUTTONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ButtonIndex(u8);

impl ButtonIndex {
    /// Creates a button index, returning `None` when out of range.
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        if value == 0 || usize::from(value) > MAX_BUTTONS {
            return None;
        }
        Some(Self(value))
    }

    /// Builds the index for a zero-based button position.
    #[must_use]
    pub fn from_position(position: usize) -> Option<Self> {
        let value = u8::try_from(position.checked_add(1)?).ok()?;
        Self::new(value)
    }

    /// Returns the raw one-based index.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ButtonIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<u8> for ButtonIndex {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("button index out of range: {value}"))
    }
}

impl From<ButtonIndex> for u8 {
    fn from(value: ButtonIndex) -> Self {
        value.0
    }
}

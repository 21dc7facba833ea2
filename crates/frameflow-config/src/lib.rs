// crates/frameflow-config/src/lib.rs
// ============================================================================
// Module: Frameflow Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for frameflow.toml semantics.
// Dependencies: frameflow-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `frameflow-config` defines the configuration model for a frame server:
//! listener settings, pipeline defaults and the log sink. Loading is strict
//! and fail-closed.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;

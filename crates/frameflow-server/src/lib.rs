// crates/frameflow-server/src/lib.rs
// ============================================================================
// Module: Frameflow Server Library
// Description: HTTP adapter and demo frames for the frameflow binary.
// Purpose: Expose the axum bridge to embedders and the CLI.
// Dependencies: axum, frameflow-config, frameflow-core, tokio
// ============================================================================

//! ## Overview
//! `frameflow-server` mounts a frame pipeline on an axum router and ships the
//! counter frame served by `frameflow serve`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod demo;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use demo::counter_builder;
pub use demo::counter_frames;
pub use server::ServerError;
pub use server::frame_route;
pub use server::serve;

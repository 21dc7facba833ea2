// crates/frameflow-core/src/lib.rs
// ============================================================================
// Module: Frameflow Core Library
// Description: Request-handling pipeline for interactive social frames.
// Purpose: Decode frame requests and render frame responses.
// Dependencies: async-trait, base64, bytes, hyper, serde, tokio, url
// ============================================================================

//! ## Overview
//! Frameflow Core implements the server side of the frame protocol: the
//! middleware composition engine, the pressed-button URL codec, pluggable
//! client protocol parsing, state derivation and the response renderer.
//! Invariants:
//! - Button information round-trips exactly through target URLs.
//! - Context slots are shadowed, never removed.
//! - Errors are caught once, at the response renderer.
//!
//! Security posture: request URLs and POST bodies are untrusted; malformed
//! input degrades to defaults and internal failures are never detailed to
//! clients.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod codec;
pub mod core;
pub mod farcaster;
pub mod frames;
pub mod image;
pub mod interfaces;
pub mod logging;
pub mod metadata;
pub mod middleware;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use codec::BUTTON_INFORMATION_PARAM;
pub use codec::CodecError;
pub use codec::generate_button_target_url;
pub use codec::generate_target_url;
pub use codec::parse_button_information_from_target_url;
pub use crate::core::*;
pub use farcaster::FarcasterMessageValidator;
pub use farcaster::FarcasterProtocol;
pub use farcaster::UntrustedValidator;
pub use frames::Frames;
pub use frames::FramesBuilder;
pub use image::SvgImageRenderer;
pub use interfaces::ClientProtocolHandler;
pub use interfaces::ImageRenderError;
pub use interfaces::ImageRenderer;
pub use interfaces::ProtocolError;
pub use logging::FileLogSink;
pub use logging::FrameLogEvent;
pub use logging::FrameLogSink;
pub use logging::LogLevel;
pub use logging::MemoryLogSink;
pub use logging::NoopLogSink;
pub use logging::StderrLogSink;
pub use metadata::FRAME_JSON_MEDIA_TYPE;
pub use middleware::ComposeError;
pub use middleware::HandlerMiddleware;
pub use middleware::Middleware;
pub use middleware::MiddlewareResult;
pub use middleware::Next;
pub use middleware::SharedMiddleware;
pub use middleware::compose_middleware;
pub use middleware::concurrent_middleware;
pub use middleware::openframes::ClientProtocolRegistry;
pub use middleware::openframes::openframes;
pub use middleware::run_middleware;

// crates/frameflow-core/src/core/mod.rs
// ============================================================================
// Module: Frameflow Core Types
// Description: Data model shared by every stage of the frame pipeline.
// Purpose: Group identifiers, buttons, frames, messages, context and errors.
// Dependencies: crate::core::*
// ============================================================================

//! ## Overview
//! Core types are backend-agnostic: they describe what a frame turn looks
//! like, not how it is transported or signed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod button;
pub mod context;
pub mod error;
pub mod frame;
pub mod identifiers;
pub mod message;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use button::ButtonAction;
pub use button::ButtonInformation;
pub use button::ButtonTarget;
pub use button::FrameButton;
pub use button::PressedAction;
pub use context::ContextPatch;
pub use context::FrameContext;
pub use context::FrameRequest;
pub use error::FrameError;
pub use error::FrameErrorKind;
pub use frame::AspectRatio;
pub use frame::FrameDefinition;
pub use frame::FrameImage;
pub use frame::FrameRedirect;
pub use frame::FrameResult;
pub use frame::ImageElement;
pub use frame::ImageOptions;
pub use frame::ResponseInit;
pub use identifiers::ButtonIndex;
pub use identifiers::ClientProtocolId;
pub use identifiers::MAX_BUTTONS;
pub use identifiers::ProtocolIdError;
pub use message::FrameMessage;

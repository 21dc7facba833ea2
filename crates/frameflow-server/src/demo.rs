// crates/frameflow-server/src/demo.rs
// ============================================================================
// Module: Counter Demo Frame
// Description: A stateful counter frame served by `frameflow serve`.
// Purpose: Exercise state round trips and button presses end to end.
// Dependencies: frameflow-core, serde_json
// ============================================================================

//! ## Overview
//! The counter keeps `{"count": n}` in frame state. Button 1 increments,
//! button 2 decrements and button 3 resets to zero. The image is an element
//! tree rendered by the built-in SVG renderer. Hub-native button presses are
//! decoded by [`FarcasterProtocol`] without signature verification.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use frameflow_core::ClientProtocolId;
use frameflow_core::FarcasterProtocol;
use frameflow_core::FrameButton;
use frameflow_core::FrameContext;
use frameflow_core::FrameDefinition;
use frameflow_core::Frames;
use frameflow_core::FramesBuilder;
use frameflow_core::ImageElement;
use frameflow_core::MiddlewareResult;
use frameflow_core::SvgImageRenderer;
use serde_json::Value;
use serde_json::json;

use crate::server::ServerError;

// ============================================================================
// SECTION: Counter
// ============================================================================

/// Returns the builder defaults for the counter frame.
#[must_use]
pub fn counter_builder() -> FramesBuilder {
    Frames::builder()
        .initial_state(json!({"count": 0}))
        .image_renderer(Arc::new(SvgImageRenderer::new()))
        .protocol(ClientProtocolId::farcaster(), Arc::new(FarcasterProtocol::untrusted()))
}

/// Builds the counter pipeline from a configured builder.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the chain cannot be composed.
pub fn counter_frames(builder: FramesBuilder) -> Result<Frames, ServerError> {
    builder.build(counter).map_err(|err| ServerError::Init(err.to_string()))
}

/// Counter frame handler.
async fn counter(ctx: FrameContext) -> MiddlewareResult {
    let count = ctx.state().and_then(|state| state.get("count")).and_then(Value::as_i64).unwrap_or(0);
    let count = match ctx.pressed_button().map(|button| button.index.get()) {
        Some(1) => count.saturating_add(1),
        Some(2) => count.saturating_sub(1),
        Some(3) => 0,
        _ => count,
    };
    let image = ImageElement::node("div", vec![ImageElement::text(format!("Count: {count}"))]);
    Ok(FrameDefinition::new(image)
        .title("Frameflow counter")
        .button(FrameButton::post("+1", None))
        .button(FrameButton::post("-1", None))
        .button(FrameButton::post("Reset", None))
        .state(json!({"count": count}))
        .into())
}

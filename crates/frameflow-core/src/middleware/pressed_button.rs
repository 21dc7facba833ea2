// crates/frameflow-core/src/middleware/pressed_button.rs
// ============================================================================
// Module: Pressed Button Middleware
// Description: Recovers the pressed button from the request URL.
// Purpose: Expose button identity and check handler results against it.
// Dependencies: async-trait, serde_json
// ============================================================================

//! ## Overview
//! Only POST requests carry a pressed button; GET requests are fresh loads.
//! After the handler runs, the result is compared with the pressed action:
//! `post_redirect` expects a redirect and `post` expects a frame. Mismatches
//! are logged as warnings and never change the response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::codec::parse_button_information_from_target_url;
use crate::core::button::ButtonInformation;
use crate::core::button::PressedAction;
use crate::core::context::ContextPatch;
use crate::core::context::FrameContext;
use crate::core::frame::FrameResult;
use crate::logging::FrameLogEvent;
use crate::logging::LogLevel;
use crate::middleware::Middleware;
use crate::middleware::MiddlewareResult;
use crate::middleware::Next;
use crate::middleware::SharedMiddleware;

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Middleware writing the `pressed_button` slot.
pub struct PressedButtonMiddleware;

#[async_trait]
impl Middleware for PressedButtonMiddleware {
    async fn handle(&self, ctx: FrameContext, next: Next<'_>) -> MiddlewareResult {
        let pressed = pressed_button_of(&ctx);
        let log_ctx = pressed.map(|_| ctx.clone());
        let result = next.run(ctx, ContextPatch::new().with_pressed_button(pressed)).await?;
        if let (Some(button), Some(log_ctx)) = (pressed, log_ctx)
            && let Some(problem) = consistency_violation(button, &result)
        {
            log_ctx.log(
                FrameLogEvent::new("button_result_mismatch", LogLevel::Warn, problem).with_details(
                    json!({
                        "index": button.index.get(),
                        "action": button.action.as_str(),
                    }),
                ),
            );
        }
        Ok(result)
    }
}

/// Returns the pressed-button middleware.
#[must_use]
pub fn pressed_button() -> SharedMiddleware {
    Arc::new(PressedButtonMiddleware)
}

/// Decodes the pressed button of a request; GET requests never carry one.
#[must_use]
pub fn pressed_button_of(ctx: &FrameContext) -> Option<ButtonInformation> {
    if !ctx.request().is_post() {
        return None;
    }
    parse_button_information_from_target_url(ctx.url())
}

/// Describes a mismatch between the pressed action and the handler result.
fn consistency_violation(button: ButtonInformation, result: &FrameResult) -> Option<String> {
    if matches!(result, FrameResult::Deferred) {
        return None;
    }
    match button.action {
        PressedAction::PostRedirect if !result.is_redirect() => Some(format!(
            "button {} is post_redirect but the handler did not return a redirect",
            button.index
        )),
        PressedAction::Post if !result.is_frame() => Some(format!(
            "button {} is post but the handler returned a response or redirect instead of a frame",
            button.index
        )),
        PressedAction::Post | PressedAction::PostRedirect | PressedAction::Tx => None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

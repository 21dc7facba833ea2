// crates/frameflow-core/src/middleware/state.rs
// ============================================================================
// Module: State Middleware
// Description: Derives the state a turn operates with.
// Purpose: Isolate state handling from any specific client protocol.
// Dependencies: async-trait, serde_json
// ============================================================================

//! ## Overview
//! With no message (first load), the state is the configured initial state.
//! With a message, its serialized state is parsed as JSON; an empty or absent
//! value means "no state yet" and a malformed value degrades to the initial
//! state with a warning. A frame result that does not set its own state
//! inherits the state derived here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use serde_json::json;

use crate::core::context::ContextPatch;
use crate::core::context::FrameContext;
use crate::logging::FrameLogEvent;
use crate::logging::LogLevel;
use crate::middleware::Middleware;
use crate::middleware::MiddlewareResult;
use crate::middleware::Next;
use crate::middleware::SharedMiddleware;

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Middleware writing the `state` slot and back-filling result state.
pub struct StateMiddleware;

#[async_trait]
impl Middleware for StateMiddleware {
    async fn handle(&self, ctx: FrameContext, next: Next<'_>) -> MiddlewareResult {
        let state = derive_state(&ctx);
        let mut result = next.run(ctx, ContextPatch::new().with_state(state.clone())).await?;
        if let Some(state) = &state {
            result.fill_default_state(state);
        }
        Ok(result)
    }
}

/// Returns the state middleware.
#[must_use]
pub fn state() -> SharedMiddleware {
    Arc::new(StateMiddleware)
}

/// Derives the current turn's state from the message or the initial state.
#[must_use]
pub fn derive_state(ctx: &FrameContext) -> Option<Value> {
    let Some(message) = ctx.message() else {
        return ctx.initial_state().cloned();
    };
    match message.state.as_deref() {
        None | Some("") => ctx.initial_state().cloned(),
        Some(raw) => match serde_json::from_str(raw) {
            Ok(state) => Some(state),
            Err(err) => {
                ctx.log(
                    FrameLogEvent::new(
                        "state_parse_failed",
                        LogLevel::Warn,
                        "message state is not valid JSON; using initial state",
                    )
                    .with_details(json!({
                        "error": err.to_string(),
                        "state_bytes": raw.len(),
                    })),
                );
                ctx.initial_state().cloned()
            }
        },
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// crates/frameflow-server/src/server.rs
// ============================================================================
// Module: Frame HTTP Adapter
// Description: axum routes bridging HTTP requests into the frame pipeline.
// Purpose: Serve a composed frame pipeline over HTTP with a body limit.
// Dependencies: axum, frameflow-config, frameflow-core, tokio
// ============================================================================

//! ## Overview
//! [`frame_route`] mounts a [`Frames`] pipeline on its base path and every
//! path below it, for both GET and POST. Bodies are buffered up to the
//! configured limit before the pipeline runs; oversized bodies are rejected
//! with 413 without reaching it.
//! Security posture: request bodies are untrusted and bounded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::body::Bytes;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::MethodRouter;
use axum::routing::get;
use frameflow_config::FrameflowConfig;
use frameflow_core::Frames;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: Routes
// ============================================================================

/// Shared state for the frame routes.
struct RouteState {
    /// Composed frame pipeline.
    frames: Frames,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Builds a router serving `frames` on its base path.
///
/// # Errors
///
/// Returns [`ServerError::Config`] when the base path cannot be routed.
pub fn frame_route(frames: Frames, max_body_bytes: usize) -> Result<Router, ServerError> {
    let (exact, nested) = route_paths(frames.base_path())?;
    let state = Arc::new(RouteState {
        frames,
        max_body_bytes,
    });
    let method_router: MethodRouter<Arc<RouteState>> = get(handle_frame).post(handle_frame);
    Ok(Router::new()
        .route(&exact, method_router.clone())
        .route(&nested, method_router)
        .with_state(state))
}

/// Returns the exact and wildcard route paths for a base path.
fn route_paths(base_path: &str) -> Result<(String, String), ServerError> {
    if !base_path.starts_with('/') {
        return Err(ServerError::Config("base path must start with '/'".to_string()));
    }
    if base_path.contains(['{', '}', '*', ':']) {
        return Err(ServerError::Config(format!("base path cannot be routed: {base_path}")));
    }
    let trimmed = base_path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(("/".to_string(), "/{*rest}".to_string()));
    }
    Ok((trimmed.to_string(), format!("{trimmed}/{{*rest}}")))
}

/// Handles one frame request.
async fn handle_frame(State(state): State<Arc<RouteState>>, request: Request) -> Response {
    match buffer_request(request, state.max_body_bytes).await {
        Ok(request) => state.frames.handle(request).await.map(Body::from),
        Err(response) => response,
    }
}

/// Buffers the request body up to `limit` bytes.
async fn buffer_request(
    request: Request,
    limit: usize,
) -> Result<axum::http::Request<Bytes>, Response> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|_| {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            "Payload Too Large",
        )
            .into_response()
    })?;
    Ok(axum::http::Request::from_parts(parts, bytes))
}

// ============================================================================
// SECTION: Serving
// ============================================================================

/// Binds the configured address and serves `frames` until shutdown.
///
/// # Errors
///
/// Returns [`ServerError`] when binding or serving fails.
pub async fn serve(config: &FrameflowConfig, frames: Frames) -> Result<(), ServerError> {
    let addr = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
    let app = frame_route(frames, config.server.max_body_bytes)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Frame server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::route_paths;

    #[test]
    fn root_base_path_routes_everything() {
        let (exact, nested) = route_paths("/").unwrap();
        assert_eq!(exact, "/");
        assert_eq!(nested, "/{*rest}");
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let (exact, nested) = route_paths("/counter/").unwrap();
        assert_eq!(exact, "/counter");
        assert_eq!(nested, "/counter/{*rest}");
    }

    #[test]
    fn route_syntax_is_rejected() {
        assert!(route_paths("/{id}").is_err());
        assert!(route_paths("relative").is_err());
    }
}

// crates/frameflow-core/src/frames.rs
// ============================================================================
// Module: Frame Pipeline
// Description: Builder assembling the default middleware chain.
// Purpose: Turn one HTTP request into exactly one HTTP response.
// Dependencies: bytes, hyper, serde_json, url
// ============================================================================

//! ## Overview
//! [`Frames`] wires the default chain
//! `[render_response, pressed_button, <client protocols>, state, <app middleware>, handler]`
//! and exposes [`Frames::handle`], which never fails: every error is rendered
//! by the response renderer as a 500 response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use hyper::Request;
use hyper::Response;
use serde_json::Value;
use serde_json::json;
use url::Url;

use crate::core::context::FrameContext;
use crate::core::context::FrameRequest;
use crate::core::error::FrameError;
use crate::core::frame::FrameResult;
use crate::core::identifiers::ClientProtocolId;
use crate::interfaces::ClientProtocolHandler;
use crate::interfaces::ImageRenderer;
use crate::logging::FrameLogEvent;
use crate::logging::FrameLogSink;
use crate::logging::LogLevel;
use crate::logging::NoopLogSink;
use crate::middleware::ComposeError;
use crate::middleware::HandlerMiddleware;
use crate::middleware::MiddlewareResult;
use crate::middleware::SharedMiddleware;
use crate::middleware::compose_middleware;
use crate::middleware::openframes::ClientProtocolRegistry;
use crate::middleware::openframes::openframes;
use crate::middleware::pressed_button::pressed_button;
use crate::middleware::render::RenderResponseMiddleware;
use crate::middleware::render::error_response;
use crate::middleware::render::wants_json;
use crate::middleware::run_middleware;
use crate::middleware::state::state;

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Composed frame pipeline.
pub struct Frames {
    /// Composed middleware chain.
    chain: SharedMiddleware,
    /// Base path for target resolution.
    base_path: String,
    /// Initial state for fresh sessions.
    initial_state: Option<Value>,
    /// Public origin for path-only requests.
    origin: Option<Url>,
    /// Log sink injected into every context.
    log: Arc<dyn FrameLogSink>,
}

impl Frames {
    /// Starts a pipeline builder.
    #[must_use]
    pub fn builder() -> FramesBuilder {
        FramesBuilder::default()
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Handles one request.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let json = wants_json(request.headers());
        let request = match FrameRequest::from_http(request, self.origin.as_ref()) {
            Ok(request) => request,
            Err(err) => return self.fail(None, &err, json),
        };
        let path = request.url.path().to_string();
        let ctx = FrameContext::new(request, self.base_path.clone(), self.initial_state.clone())
            .with_log(Arc::clone(&self.log));
        match run_middleware(&self.chain, ctx).await {
            Ok(FrameResult::Response(response)) => response,
            Ok(_) => self.fail(
                Some(path),
                &FrameError::internal("pipeline did not produce an HTTP response"),
                json,
            ),
            Err(err) => self.fail(Some(path), &err, json),
        }
    }

    /// Logs a failure outside the renderer and builds the error response.
    fn fail(&self, path: Option<String>, err: &FrameError, json: bool) -> Response<Bytes> {
        let mut event = FrameLogEvent::new("pipeline_failed", LogLevel::Error, err.to_string())
            .with_details(json!({"kind": err.kind().as_str()}));
        if let Some(path) = path {
            event = event.with_path(path);
        }
        self.log.record(&event);
        error_response(err, json)
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for [`Frames`].
pub struct FramesBuilder {
    /// Base path for target resolution.
    base_path: String,
    /// Initial state for fresh sessions.
    initial_state: Option<Value>,
    /// Public origin for path-only requests.
    origin: Option<Url>,
    /// Individually chained protocol middlewares.
    protocols: Vec<SharedMiddleware>,
    /// Optional first-match-wins protocol registry.
    registry: Option<ClientProtocolRegistry>,
    /// Protocols advertised without a handler.
    accepts: Vec<ClientProtocolId>,
    /// Application middlewares, run after state derivation.
    middleware: Vec<SharedMiddleware>,
    /// Image renderer for element images.
    images: Option<Arc<dyn ImageRenderer>>,
    /// Log sink.
    log: Arc<dyn FrameLogSink>,
}

impl Default for FramesBuilder {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
            initial_state: None,
            origin: None,
            protocols: Vec::new(),
            registry: None,
            accepts: Vec::new(),
            middleware: Vec::new(),
            images: None,
            log: Arc::new(NoopLogSink),
        }
    }
}

impl FramesBuilder {
    /// Sets the base path.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the initial state.
    #[must_use]
    pub fn initial_state(mut self, state: Value) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Sets the public origin used when requests carry only a path.
    ///
    /// Only the scheme, host and port are used; mount prefixes belong in
    /// [`FramesBuilder::base_path`].
    #[must_use]
    pub fn public_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Chains a client protocol middleware.
    #[must_use]
    pub fn protocol(
        mut self,
        protocol: ClientProtocolId,
        handler: Arc<dyn ClientProtocolHandler>,
    ) -> Self {
        self.protocols.push(openframes(protocol, handler));
        self
    }

    /// Uses a first-match-wins protocol registry after any chained protocols.
    #[must_use]
    pub fn protocol_registry(mut self, registry: ClientProtocolRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Advertises a protocol on every frame without registering a handler.
    #[must_use]
    pub fn accept(mut self, protocol: ClientProtocolId) -> Self {
        if !self.accepts.contains(&protocol) {
            self.accepts.push(protocol);
        }
        self
    }

    /// Appends an application middleware.
    #[must_use]
    pub fn middleware(mut self, middleware: SharedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Sets the image renderer.
    #[must_use]
    pub fn image_renderer(mut self, images: Arc<dyn ImageRenderer>) -> Self {
        self.images = Some(images);
        self
    }

    /// Sets the log sink.
    #[must_use]
    pub fn log_sink(mut self, log: Arc<dyn FrameLogSink>) -> Self {
        self.log = log;
        self
    }

    /// Builds the pipeline around an async handler function.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError`] when the chain cannot be composed.
    pub fn build<F, Fut>(self, handler: F) -> Result<Frames, ComposeError>
    where
        F: Fn(FrameContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareResult> + Send + 'static,
    {
        self.build_with(Arc::new(HandlerMiddleware::new(handler)))
    }

    /// Builds the pipeline around a terminal middleware.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError`] when the chain cannot be composed.
    pub fn build_with(self, handler: SharedMiddleware) -> Result<Frames, ComposeError> {
        let mut renderer = RenderResponseMiddleware::new().with_accepts(self.accepts);
        if let Some(images) = self.images {
            renderer = renderer.with_image_renderer(images);
        }
        let mut chain: Vec<SharedMiddleware> = vec![Arc::new(renderer), pressed_button()];
        chain.extend(self.protocols);
        if let Some(registry) = self.registry {
            chain.push(registry.into_middleware());
        }
        chain.push(state());
        chain.extend(self.middleware);
        chain.push(handler);
        Ok(Frames {
            chain: compose_middleware(chain)?,
            base_path: self.base_path,
            initial_state: self.initial_state,
            origin: self.origin,
            log: self.log,
        })
    }
}

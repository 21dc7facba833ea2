// crates/frameflow-core/src/middleware/render.rs
// ============================================================================
// Module: Response Renderer
// Description: Terminal state machine turning handler results into responses.
// Purpose: Enforce frame contracts and encode frames as HTML or JSON.
// Dependencies: async-trait, bytes, hyper, serde_json
// ============================================================================

//! ## Overview
//! The renderer is the outermost middleware and the only place errors are
//! caught. Raw responses pass through unmodified, redirects become
//! `Location` responses (302 by default), and frame descriptions are
//! validated, resolved through the URL codec and encoded as meta tags or as
//! a flat JSON object depending on the `Accept` header.
//!
//! Every failure becomes a 500 response whose body is
//! [`FrameError::public_message`]: contract violations reveal their message,
//! everything else is reported generically and logged server-side.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::HeaderMap;
use hyper::Response;
use hyper::StatusCode;
use hyper::header::ACCEPT;
use hyper::header::CONTENT_TYPE;
use hyper::header::HeaderName;
use hyper::header::HeaderValue;
use hyper::header::LOCATION;
use serde_json::json;

use crate::codec::CodecError;
use crate::codec::generate_button_target_url;
use crate::codec::generate_target_url;
use crate::codec::is_absolute_http_url;
use crate::codec::resolve_base_url;
use crate::core::button::ButtonInformation;
use crate::core::button::ButtonTarget;
use crate::core::button::FrameButton;
use crate::core::button::PressedAction;
use crate::core::context::ContextPatch;
use crate::core::context::FrameContext;
use crate::core::error::FrameError;
use crate::core::error::FrameErrorKind;
use crate::core::frame::FrameDefinition;
use crate::core::frame::FrameImage;
use crate::core::frame::FrameRedirect;
use crate::core::frame::FrameResult;
use crate::core::frame::ResponseInit;
use crate::core::identifiers::ButtonIndex;
use crate::core::identifiers::ClientProtocolId;
use crate::core::identifiers::MAX_BUTTONS;
use crate::interfaces::ImageRenderer;
use crate::logging::FrameLogEvent;
use crate::logging::LogLevel;
use crate::metadata::FRAME_JSON_MEDIA_TYPE;
use crate::metadata::FrameMetadata;
use crate::metadata::RenderedButton;
use crate::metadata::encode_html;
use crate::metadata::encode_json;
use crate::middleware::Middleware;
use crate::middleware::MiddlewareResult;
use crate::middleware::Next;
use crate::middleware::SharedMiddleware;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum serialized state size embedded in a frame.
pub const MAX_STATE_BYTES: usize = 4096;

/// Content type of JSON-encoded frames and errors.
const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of HTML-encoded frames.
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Content type of plain-text errors.
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Terminal renderer middleware.
#[derive(Clone, Default)]
pub struct RenderResponseMiddleware {
    /// Collaborator rendering image elements.
    images: Option<Arc<dyn ImageRenderer>>,
    /// Protocols advertised on every frame.
    accepts: Vec<ClientProtocolId>,
}

impl RenderResponseMiddleware {
    /// Creates a renderer without an image renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the image renderer used for element images.
    #[must_use]
    pub fn with_image_renderer(mut self, images: Arc<dyn ImageRenderer>) -> Self {
        self.images = Some(images);
        self
    }

    /// Sets protocols advertised on every frame.
    #[must_use]
    pub fn with_accepts(mut self, accepts: Vec<ClientProtocolId>) -> Self {
        self.accepts = accepts;
        self
    }

    /// Renders a handler result.
    async fn render(
        &self,
        ctx: &FrameContext,
        result: FrameResult,
    ) -> Result<Response<Bytes>, FrameError> {
        match result {
            FrameResult::Response(response) => Ok(response),
            FrameResult::Redirect(redirect) => redirect_response(&redirect),
            FrameResult::Frame(definition) => self.render_frame(ctx, *definition).await,
            FrameResult::Dynamic(value) => {
                self.render_frame(ctx, FrameDefinition::from_value(&value)?).await
            }
            FrameResult::Deferred => {
                Err(FrameError::internal("deferred middleware result reached the renderer"))
            }
        }
    }

    /// Validates, resolves and encodes a frame definition.
    async fn render_frame(
        &self,
        ctx: &FrameContext,
        definition: FrameDefinition,
    ) -> Result<Response<Bytes>, FrameError> {
        if definition.buttons.len() > MAX_BUTTONS {
            return Err(FrameError::InvalidButtonCount {
                count: definition.buttons.len(),
            });
        }
        for button in &definition.buttons {
            button.validate()?;
        }
        let state = serialize_state(&definition)?;
        let image = self.resolve_image(ctx, &definition).await?;
        let buttons = definition
            .buttons
            .iter()
            .enumerate()
            .map(|(position, button)| render_button(ctx, position, button))
            .collect::<Result<Vec<_>, _>>()?;
        let post_url = resolve_base_url(ctx.url(), ctx.base_path()).map_err(codec_error)?;

        let mut accepts = vec![ClientProtocolId::farcaster()];
        for protocol in definition.accepts {
            if !accepts.contains(&protocol) {
                accepts.push(protocol);
            }
        }

        let metadata = FrameMetadata {
            image,
            aspect_ratio: definition.image_options.aspect_ratio,
            post_url: post_url.to_string(),
            input_text: definition.text_input,
            state,
            buttons,
            accepts,
            title: definition.title,
        };
        let pairs = metadata.flatten();
        let (content_type, body) = if wants_json(&ctx.request().headers) {
            (JSON_CONTENT_TYPE, encode_json(&pairs)?)
        } else {
            (HTML_CONTENT_TYPE, Bytes::from(encode_html(&pairs, metadata.title.as_deref())))
        };
        let mut response = Response::new(body);
        response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        apply_init(&mut response, &definition.init)?;
        Ok(response)
    }

    /// Produces the image URL of a frame.
    async fn resolve_image(
        &self,
        ctx: &FrameContext,
        definition: &FrameDefinition,
    ) -> Result<String, FrameError> {
        match &definition.image {
            FrameImage::Url(raw) if raw.starts_with("data:") || is_absolute_http_url(raw) => {
                Ok(raw.clone())
            }
            FrameImage::Url(raw) => {
                let target = ButtonTarget::Path(raw.clone());
                generate_target_url(ctx.url(), Some(&target), ctx.base_path())
                    .map(|url| url.to_string())
                    .map_err(codec_error)
            }
            FrameImage::Element(element) => {
                let Some(images) = &self.images else {
                    return Err(FrameError::ImageRender("no image renderer configured".to_string()));
                };
                images
                    .render(element, &definition.image_options)
                    .await
                    .map_err(|err| FrameError::ImageRender(err.to_string()))
            }
        }
    }
}

#[async_trait]
impl Middleware for RenderResponseMiddleware {
    async fn handle(&self, ctx: FrameContext, next: Next<'_>) -> MiddlewareResult {
        let render_ctx = ctx.clone();
        let outcome = match next.run(ctx, ContextPatch::new()).await {
            Ok(mut result) => {
                for protocol in &self.accepts {
                    result.add_accept(protocol);
                }
                self.render(&render_ctx, result).await
            }
            Err(err) => Err(err),
        };
        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                log_failure(&render_ctx, &err);
                error_response(&err, wants_json(&render_ctx.request().headers))
            }
        };
        Ok(FrameResult::Response(response))
    }
}

/// Returns a renderer middleware with the given image renderer.
#[must_use]
pub fn render_response(images: Option<Arc<dyn ImageRenderer>>) -> SharedMiddleware {
    let renderer = RenderResponseMiddleware::new();
    Arc::new(match images {
        Some(images) => renderer.with_image_renderer(images),
        None => renderer,
    })
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Returns true when the request asks for the JSON frame encoding.
#[must_use]
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == FRAME_JSON_MEDIA_TYPE)
}

/// Builds the 500 response for a pipeline error.
#[must_use]
pub fn error_response(err: &FrameError, json: bool) -> Response<Bytes> {
    let message = err.public_message();
    let (content_type, body) = if json {
        let body = serde_json::to_vec(&json!({"error": message})).unwrap_or_default();
        (JSON_CONTENT_TYPE, Bytes::from(body))
    } else {
        (TEXT_CONTENT_TYPE, Bytes::from(message))
    };
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Builds a `Location` response for a redirect.
fn redirect_response(redirect: &FrameRedirect) -> Result<Response<Bytes>, FrameError> {
    let location = HeaderValue::from_str(&redirect.location)
        .map_err(|_| FrameError::internal("redirect location is not a valid header value"))?;
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = StatusCode::FOUND;
    response.headers_mut().insert(LOCATION, location);
    apply_init(&mut response, &redirect.init)?;
    Ok(response)
}

/// Applies caller-supplied status and headers over framework defaults.
///
/// The first header with a given name replaces the framework value; repeated
/// names append.
fn apply_init(response: &mut Response<Bytes>, init: &ResponseInit) -> Result<(), FrameError> {
    if let Some(status) = init.status {
        *response.status_mut() = StatusCode::from_u16(status)
            .map_err(|_| FrameError::internal(format!("invalid response status: {status}")))?;
    }
    let mut replaced = BTreeSet::new();
    for (name, value) in &init.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| FrameError::internal(format!("invalid response header name: {name}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| FrameError::internal(format!("invalid value for header {name}")))?;
        if replaced.insert(name.as_str().to_string()) {
            response.headers_mut().insert(name, value);
        } else {
            response.headers_mut().append(name, value);
        }
    }
    Ok(())
}

/// Records a renderer-boundary failure.
fn log_failure(ctx: &FrameContext, err: &FrameError) {
    let level = match err.kind() {
        FrameErrorKind::Protocol | FrameErrorKind::Internal | FrameErrorKind::ImageRender => {
            LogLevel::Error
        }
        FrameErrorKind::InvalidButtonCount
        | FrameErrorKind::UnrecognizedButtonAction
        | FrameErrorKind::InvalidButtonShape
        | FrameErrorKind::InvalidStateValue => LogLevel::Warn,
    };
    ctx.log(
        FrameLogEvent::new("frame_render_failed", level, err.to_string())
            .with_details(json!({"kind": err.kind().as_str()})),
    );
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serializes frame state, enforcing the size limit.
fn serialize_state(definition: &FrameDefinition) -> Result<Option<String>, FrameError> {
    let Some(state) = &definition.state else {
        return Ok(None);
    };
    let serialized = serde_json::to_string(state)
        .map_err(|err| FrameError::invalid_state(format!("State must be JSON serializable: {err}")))?;
    if serialized.len() > MAX_STATE_BYTES {
        return Err(FrameError::invalid_state(format!(
            "State must not exceed {MAX_STATE_BYTES} bytes when serialized"
        )));
    }
    Ok(Some(serialized))
}

/// Resolves a button's targets, embedding its index and action.
fn render_button(
    ctx: &FrameContext,
    position: usize,
    button: &FrameButton,
) -> Result<RenderedButton, FrameError> {
    let index = ButtonIndex::from_position(position).ok_or(FrameError::InvalidButtonCount {
        count: position + 1,
    })?;
    let post_back = |target: Option<&ButtonTarget>, action: PressedAction| {
        generate_button_target_url(
            ctx.url(),
            target,
            ctx.base_path(),
            ButtonInformation {
                action,
                index,
            },
        )
        .map(|url| url.to_string())
        .map_err(codec_error)
    };
    let (target, post_url) = match button {
        FrameButton::Post {
            target, ..
        } => (Some(post_back(target.as_ref(), PressedAction::Post)?), None),
        FrameButton::PostRedirect {
            target, ..
        } => (Some(post_back(target.as_ref(), PressedAction::PostRedirect)?), None),
        FrameButton::Tx {
            target,
            post_url,
            ..
        } => (
            Some(post_back(Some(target), PressedAction::Tx)?),
            post_url.as_ref().map(|post_url| post_back(Some(post_url), PressedAction::Tx)).transpose()?,
        ),
        FrameButton::Link {
            target, ..
        }
        | FrameButton::Mint {
            target, ..
        } => (Some(target.clone()), None),
    };
    Ok(RenderedButton {
        label: button.label().to_string(),
        action: button.action(),
        target,
        post_url,
    })
}

/// Maps codec failures to internal errors.
fn codec_error(err: CodecError) -> FrameError {
    FrameError::internal(err.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;

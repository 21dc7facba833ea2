// crates/frameflow-core/src/core/context.rs
// ============================================================================
// Module: Frame Context
// Description: Per-request context threaded through the middleware chain.
// Purpose: Accumulate middleware contributions in an append-only record.
// Dependencies: bytes, hyper, serde_json, url
// ============================================================================

//! ## Overview
//! A [`FrameContext`] is created once per request and dropped when the
//! response is returned. Fixed fields (`base_path`, `initial_state`,
//! `request`, `url`) are set at creation; every other slot is owned by one
//! middleware and written through a [`ContextPatch`].
//!
//! Invariants:
//! - A slot written by a patch is never removed, only shadowed by a later
//!   write of the same slot (last writer wins).
//! - Patches merge in application order; `ContextPatch::merge` is
//!   associative and the later patch wins on collisions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use hyper::HeaderMap;
use hyper::Method;
use hyper::Request;
use hyper::header::HOST;
use serde_json::Value;
use url::Url;

use crate::codec::BUTTON_INFORMATION_PARAM;
use crate::core::button::ButtonInformation;
use crate::core::error::FrameError;
use crate::core::identifiers::ClientProtocolId;
use crate::core::message::FrameMessage;
use crate::logging::FrameLogEvent;
use crate::logging::FrameLogSink;
use crate::logging::NoopLogSink;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Normalized HTTP request consumed by the pipeline.
///
/// # Invariants
/// - `url` is absolute.
/// - `body` is fully buffered and may be read by any number of middlewares.
#[derive(Debug, Clone)]
pub struct FrameRequest {
    /// Request method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Buffered request body.
    pub body: Bytes,
}

impl FrameRequest {
    /// Normalizes an HTTP request.
    ///
    /// Requests carrying only a path are resolved against `origin`, then the
    /// `Host` header, then `http://localhost`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] when no absolute URL can be derived.
    pub fn from_http(request: Request<Bytes>, origin: Option<&Url>) -> Result<Self, FrameError> {
        let (parts, body) = request.into_parts();
        let url = if parts.uri.scheme().is_some() && parts.uri.authority().is_some() {
            Url::parse(&parts.uri.to_string())
                .map_err(|err| FrameError::internal(format!("invalid request url: {err}")))?
        } else {
            let base = match origin {
                Some(origin) => origin.clone(),
                None => host_origin(&parts.headers)?,
            };
            let path = parts.uri.path_and_query().map_or("/", |value| value.as_str());
            base.join(path)
                .map_err(|err| FrameError::internal(format!("invalid request path: {err}")))?
        };
        Ok(Self {
            method: parts.method,
            url,
            headers: parts.headers,
            body,
        })
    }

    /// Returns a header value as a string when present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns true for POST requests.
    #[must_use]
    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    /// Parses the body as JSON; `None` when empty or malformed.
    #[must_use]
    pub fn json_body(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

/// Derives an origin from the `Host` header.
fn host_origin(headers: &HeaderMap) -> Result<Url, FrameError> {
    let host = headers.get(HOST).and_then(|value| value.to_str().ok()).unwrap_or("localhost");
    Url::parse(&format!("http://{host}/"))
        .map_err(|err| FrameError::internal(format!("invalid host header: {err}")))
}

// ============================================================================
// SECTION: Context Patch
// ============================================================================

/// Partial context contributed by a middleware.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextPatch {
    /// Pressed-button slot.
    pressed_button: Option<Option<ButtonInformation>>,
    /// Message slot.
    message: Option<FrameMessage>,
    /// Client protocol slot.
    client_protocol: Option<ClientProtocolId>,
    /// Derived state slot.
    state: Option<Option<Value>>,
    /// Application-owned slots.
    extensions: BTreeMap<String, Value>,
}

impl ContextPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the pressed-button slot.
    #[must_use]
    pub const fn with_pressed_button(mut self, button: Option<ButtonInformation>) -> Self {
        self.pressed_button = Some(button);
        self
    }

    /// Writes the message and the protocol that produced it.
    #[must_use]
    pub fn with_message(mut self, message: FrameMessage, protocol: ClientProtocolId) -> Self {
        self.message = Some(message);
        self.client_protocol = Some(protocol);
        self
    }

    /// Writes the derived state slot.
    #[must_use]
    pub fn with_state(mut self, state: Option<Value>) -> Self {
        self.state = Some(state);
        self
    }

    /// Writes an application-owned slot.
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    /// Merges a later patch into this one; the later patch wins per slot.
    #[must_use]
    pub fn merge(mut self, later: Self) -> Self {
        if later.pressed_button.is_some() {
            self.pressed_button = later.pressed_button;
        }
        if later.message.is_some() {
            self.message = later.message;
        }
        if later.client_protocol.is_some() {
            self.client_protocol = later.client_protocol;
        }
        if later.state.is_some() {
            self.state = later.state;
        }
        self.extensions.extend(later.extensions);
        self
    }
}

// ============================================================================
// SECTION: Frame Context
// ============================================================================

/// Per-request context passed through the middleware chain.
#[derive(Clone)]
pub struct FrameContext {
    /// Base path that button targets resolve against.
    base_path: String,
    /// Configured initial state.
    initial_state: Option<Value>,
    /// Normalized request.
    request: FrameRequest,
    /// Current request URL.
    url: Url,
    /// Pressed button recovered from the URL.
    pressed_button: Option<ButtonInformation>,
    /// Message extracted by a client protocol.
    message: Option<FrameMessage>,
    /// Protocol that produced the message.
    client_protocol: Option<ClientProtocolId>,
    /// State derived for this turn.
    state: Option<Value>,
    /// Application-owned slots.
    extensions: BTreeMap<String, Value>,
    /// Log sink for request-scoped events.
    log: Arc<dyn FrameLogSink>,
}

impl FrameContext {
    /// Creates a context for a request.
    #[must_use]
    pub fn new(request: FrameRequest, base_path: impl Into<String>, initial_state: Option<Value>) -> Self {
        let url = request.url.clone();
        Self {
            base_path: base_path.into(),
            initial_state,
            request,
            url,
            pressed_button: None,
            message: None,
            client_protocol: None,
            state: None,
            extensions: BTreeMap::new(),
            log: Arc::new(NoopLogSink),
        }
    }

    /// Replaces the log sink.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn FrameLogSink>) -> Self {
        self.log = log;
        self
    }

    /// Applies a patch, shadowing every slot it writes.
    #[must_use]
    pub fn apply(mut self, patch: ContextPatch) -> Self {
        if let Some(button) = patch.pressed_button {
            self.pressed_button = button;
        }
        if let Some(message) = patch.message {
            self.message = Some(message);
        }
        if let Some(protocol) = patch.client_protocol {
            self.client_protocol = Some(protocol);
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
        self.extensions.extend(patch.extensions);
        self
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Returns the configured initial state.
    #[must_use]
    pub const fn initial_state(&self) -> Option<&Value> {
        self.initial_state.as_ref()
    }

    /// Returns the normalized request.
    #[must_use]
    pub const fn request(&self) -> &FrameRequest {
        &self.request
    }

    /// Returns the current URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the pressed button, if any.
    #[must_use]
    pub const fn pressed_button(&self) -> Option<ButtonInformation> {
        self.pressed_button
    }

    /// Returns the extracted message, if any.
    #[must_use]
    pub const fn message(&self) -> Option<&FrameMessage> {
        self.message.as_ref()
    }

    /// Returns the protocol that produced the message, if any.
    #[must_use]
    pub const fn client_protocol(&self) -> Option<&ClientProtocolId> {
        self.client_protocol.as_ref()
    }

    /// Returns the state derived for this turn.
    #[must_use]
    pub const fn state(&self) -> Option<&Value> {
        self.state.as_ref()
    }

    /// Returns an application-owned slot.
    #[must_use]
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// Returns the current query pairs without the reserved button parameter.
    #[must_use]
    pub fn search_params(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .filter(|(key, _)| key != BUTTON_INFORMATION_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// Records a log event tagged with the request path.
    pub fn log(&self, event: FrameLogEvent) {
        self.log.record(&event.with_path(self.url.path()));
    }

    /// Returns the log sink.
    #[must_use]
    pub fn log_sink(&self) -> Arc<dyn FrameLogSink> {
        Arc::clone(&self.log)
    }
}

impl fmt::Debug for FrameContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameContext")
            .field("base_path", &self.base_path)
            .field("initial_state", &self.initial_state)
            .field("url", &self.url.as_str())
            .field("pressed_button", &self.pressed_button)
            .field("message", &self.message)
            .field("client_protocol", &self.client_protocol)
            .field("state", &self.state)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// crates/frameflow-core/src/middleware/openframes.rs
// ============================================================================
// Module: Client Protocol Middleware
// Description: Pluggable message extraction for client signature schemes.
// Purpose: Claim POST bodies per protocol and advertise accepted protocols.
// Dependencies: async-trait, serde_json
// ============================================================================

//! ## Overview
//! Each registered [`ClientProtocolHandler`] decides whether a POST body
//! belongs to it. A claimed body yields a normalized [`FrameMessage`] that is
//! written to context together with the protocol identifier.
//!
//! Every protocol middleware adds its identifier to the `accepts` set of a
//! frame result, whether or not it matched this turn: `accepts` advertises
//! capability. Chained middlewares do not overwrite each other: once a
//! message is present, later protocol middlewares skip extraction.
//!
//! Security posture: POST bodies are untrusted; parse failures and payloads
//! the handler rejects as malformed degrade to "no message".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::core::context::ContextPatch;
use crate::core::context::FrameContext;
use crate::core::error::FrameError;
use crate::core::identifiers::ClientProtocolId;
use crate::core::message::FrameMessage;
use crate::interfaces::ClientProtocolHandler;
use crate::interfaces::ProtocolError;
use crate::logging::FrameLogEvent;
use crate::logging::LogLevel;
use crate::middleware::Middleware;
use crate::middleware::MiddlewareResult;
use crate::middleware::Next;
use crate::middleware::SharedMiddleware;

// ============================================================================
// SECTION: Claim
// ============================================================================

/// Outcome of offering a request body to a protocol handler.
enum Claim {
    /// The handler did not recognize the body.
    Unclaimed,
    /// The handler owns the body; the message may still be absent.
    Claimed(Option<FrameMessage>),
}

/// Offers the request body to a handler.
async fn claim(
    ctx: &FrameContext,
    protocol: &ClientProtocolId,
    handler: &dyn ClientProtocolHandler,
) -> Result<Claim, FrameError> {
    if !ctx.request().is_post() {
        return Ok(Claim::Unclaimed);
    }
    let Some(body) = ctx.request().json_body() else {
        return Ok(Claim::Unclaimed);
    };
    if !handler.is_valid_payload(&body) {
        return Ok(Claim::Unclaimed);
    }
    match handler.frame_message(&body).await {
        Ok(message) => Ok(Claim::Claimed(message)),
        Err(ProtocolError::InvalidPayload(reason)) => {
            ctx.log(
                FrameLogEvent::new("protocol_payload_invalid", LogLevel::Warn, reason)
                    .with_details(json!({"protocol": protocol.to_string()})),
            );
            Ok(Claim::Claimed(None))
        }
        Err(err) => Err(FrameError::Protocol(format!("{protocol}: {err}"))),
    }
}

/// Builds the patch for a claimed message.
fn message_patch(claim: Claim, protocol: &ClientProtocolId) -> ContextPatch {
    match claim {
        Claim::Claimed(Some(message)) => ContextPatch::new().with_message(message, protocol.clone()),
        Claim::Claimed(None) | Claim::Unclaimed => ContextPatch::new(),
    }
}

// ============================================================================
// SECTION: Single Protocol
// ============================================================================

/// Middleware bound to one client protocol.
pub struct OpenFramesMiddleware {
    /// Protocol identifier advertised in `accepts`.
    protocol: ClientProtocolId,
    /// Protocol handler.
    handler: Arc<dyn ClientProtocolHandler>,
}

#[async_trait]
impl Middleware for OpenFramesMiddleware {
    async fn handle(&self, ctx: FrameContext, next: Next<'_>) -> MiddlewareResult {
        let patch = if ctx.message().is_some() {
            ContextPatch::new()
        } else {
            let claimed = claim(&ctx, &self.protocol, self.handler.as_ref()).await?;
            message_patch(claimed, &self.protocol)
        };
        let mut result = next.run(ctx, patch).await?;
        result.add_accept(&self.protocol);
        Ok(result)
    }
}

/// Returns a middleware registering one client protocol.
#[must_use]
pub fn openframes(
    protocol: ClientProtocolId,
    handler: Arc<dyn ClientProtocolHandler>,
) -> SharedMiddleware {
    Arc::new(OpenFramesMiddleware {
        protocol,
        handler,
    })
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Ordered set of client protocols with first-match-wins extraction.
///
/// # Invariants
/// - Each protocol identifier appears once; re-registering replaces the handler
///   in place.
#[derive(Clone, Default)]
pub struct ClientProtocolRegistry {
    /// Registered protocols in priority order.
    entries: Vec<(ClientProtocolId, Arc<dyn ClientProtocolHandler>)>,
}

impl ClientProtocolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a protocol handler.
    #[must_use]
    pub fn register(
        mut self,
        protocol: ClientProtocolId,
        handler: Arc<dyn ClientProtocolHandler>,
    ) -> Self {
        if let Some(entry) = self.entries.iter_mut().find(|(existing, _)| existing == &protocol) {
            entry.1 = handler;
        } else {
            self.entries.push((protocol, handler));
        }
        self
    }

    /// Returns the registered protocols in priority order.
    #[must_use]
    pub fn protocols(&self) -> Vec<ClientProtocolId> {
        self.entries.iter().map(|(protocol, _)| protocol.clone()).collect()
    }

    /// Returns true when no protocol is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the registry into a middleware.
    #[must_use]
    pub fn into_middleware(self) -> SharedMiddleware {
        Arc::new(RegistryMiddleware {
            registry: self,
        })
    }
}

/// Middleware driving a [`ClientProtocolRegistry`].
struct RegistryMiddleware {
    /// Registered protocols.
    registry: ClientProtocolRegistry,
}

#[async_trait]
impl Middleware for RegistryMiddleware {
    async fn handle(&self, ctx: FrameContext, next: Next<'_>) -> MiddlewareResult {
        let mut patch = ContextPatch::new();
        if ctx.message().is_none() {
            for (protocol, handler) in &self.registry.entries {
                let claimed = claim(&ctx, protocol, handler.as_ref()).await?;
                if matches!(claimed, Claim::Claimed(_)) {
                    patch = message_patch(claimed, protocol);
                    break;
                }
            }
        }
        let mut result = next.run(ctx, patch).await?;
        for (protocol, _) in &self.registry.entries {
            result.add_accept(protocol);
        }
        Ok(result)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only assertions."
    )]

    use bytes::Bytes;
    use hyper::Method;
    use hyper::Request;
    use serde_json::Value;

    use super::*;
    use crate::core::context::FrameRequest;
    use crate::core::frame::FrameDefinition;
    use crate::core::frame::FrameResult;
    use crate::core::identifiers::ButtonIndex;
    use crate::middleware::HandlerMiddleware;
    use crate::middleware::compose_middleware;
    use crate::middleware::run_middleware;

    /// Claims bodies whose `protocol` field equals its id.
    struct TaggedProtocol {
        tag: &'static str,
        reject: bool,
    }

    #[async_trait]
    impl ClientProtocolHandler for TaggedProtocol {
        fn is_valid_payload(&self, body: &Value) -> bool {
            body.get("protocol").and_then(Value::as_str) == Some(self.tag)
        }

        async fn frame_message(&self, body: &Value) -> Result<Option<FrameMessage>, ProtocolError> {
            if self.reject {
                return Err(ProtocolError::Verification("bad signature".to_string()));
            }
            Ok(Some(FrameMessage {
                button_index: ButtonIndex::new(1),
                requester: body.get("from").and_then(Value::as_str).map(str::to_string),
                ..FrameMessage::default()
            }))
        }
    }

    fn protocol(id: &str) -> ClientProtocolId {
        ClientProtocolId::new(id, "vNext").unwrap()
    }

    fn handler_for(tag: &'static str) -> Arc<dyn ClientProtocolHandler> {
        Arc::new(TaggedProtocol {
            tag,
            reject: false,
        })
    }

    fn context(method: Method, body: &str) -> FrameContext {
        let request = Request::builder()
            .method(method)
            .uri("http://frames.test/")
            .body(Bytes::from(body.to_string()))
            .unwrap();
        FrameContext::new(FrameRequest::from_http(request, None).unwrap(), "/", None)
    }

    fn frame_handler() -> SharedMiddleware {
        Arc::new(HandlerMiddleware::new(|ctx: FrameContext| async move {
            let mut frame = FrameDefinition::new("/a.png");
            if let Some(protocol) = ctx.client_protocol() {
                frame = frame.title(protocol.to_string());
            }
            Ok(FrameResult::frame(frame))
        }))
    }

    fn frame_of(result: FrameResult) -> FrameDefinition {
        match result {
            FrameResult::Frame(definition) => *definition,
            _ => panic!("expected frame"),
        }
    }

    #[tokio::test]
    async fn get_requests_advertise_every_protocol_once() {
        let chain = compose_middleware(vec![
            openframes(protocol("foo"), handler_for("foo")),
            openframes(protocol("bar"), handler_for("bar")),
            openframes(protocol("foo"), handler_for("foo")),
            frame_handler(),
        ])
        .unwrap();
        let frame = frame_of(run_middleware(&chain, context(Method::GET, "")).await.unwrap());
        assert_eq!(frame.accepts, vec![protocol("foo"), protocol("bar")]);
        assert_eq!(frame.title, None);
    }

    #[tokio::test]
    async fn first_claiming_protocol_wins() {
        let chain = compose_middleware(vec![
            openframes(protocol("foo"), handler_for("foo")),
            openframes(protocol("also-foo"), handler_for("foo")),
            frame_handler(),
        ])
        .unwrap();
        let ctx = context(Method::POST, r#"{"protocol":"foo","from":"alice"}"#);
        let frame = frame_of(run_middleware(&chain, ctx).await.unwrap());
        assert_eq!(frame.title.as_deref(), Some("foo@vNext"));
    }

    #[tokio::test]
    async fn malformed_bodies_are_not_claimed() {
        let chain =
            compose_middleware(vec![openframes(protocol("foo"), handler_for("foo")), frame_handler()])
                .unwrap();
        let frame =
            frame_of(run_middleware(&chain, context(Method::POST, "{not json")).await.unwrap());
        assert_eq!(frame.title, None);
        assert_eq!(frame.accepts, vec![protocol("foo")]);
    }

    #[tokio::test]
    async fn verification_failures_fail_the_request() {
        let rejecting: Arc<dyn ClientProtocolHandler> = Arc::new(TaggedProtocol {
            tag: "foo",
            reject: true,
        });
        let chain =
            compose_middleware(vec![openframes(protocol("foo"), rejecting), frame_handler()]).unwrap();
        let err = run_middleware(&chain, context(Method::POST, r#"{"protocol":"foo"}"#))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::error::FrameErrorKind::Protocol);
    }

    #[tokio::test]
    async fn registry_matches_in_order_and_advertises_all() {
        let registry = ClientProtocolRegistry::new()
            .register(protocol("bar"), handler_for("bar"))
            .register(protocol("foo"), handler_for("foo"))
            .register(protocol("bar"), handler_for("bar"));
        assert_eq!(registry.protocols(), vec![protocol("bar"), protocol("foo")]);
        let chain = compose_middleware(vec![registry.into_middleware(), frame_handler()]).unwrap();
        let ctx = context(Method::POST, r#"{"protocol":"foo"}"#);
        let frame = frame_of(run_middleware(&chain, ctx).await.unwrap());
        assert_eq!(frame.title.as_deref(), Some("foo@vNext"));
        assert_eq!(frame.accepts, vec![protocol("bar"), protocol("foo")]);
    }
}

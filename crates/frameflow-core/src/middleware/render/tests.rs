// crates/frameflow-core/src/middleware/render/tests.rs
// ============================================================================
// Module: Response Renderer Unit Tests
// Description: Result-to-response transitions and error mapping.
// Purpose: Pin status codes, headers and public error messages.
// Dependencies: frameflow-core, tokio
// ============================================================================

//! ## Overview
//! Drives the renderer with canned handler results.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;

use bytes::Bytes;
use hyper::Method;
use hyper::Request;
use hyper::Response;
use serde_json::Value;
use serde_json::json;

use super::*;
use crate::core::context::FrameRequest;
use crate::image::SvgImageRenderer;
use crate::logging::FrameLogSink;
use crate::logging::MemoryLogSink;
use crate::metadata::parse_meta_tags;
use crate::middleware::HandlerMiddleware;
use crate::middleware::compose_middleware;
use crate::middleware::run_middleware;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn context(accept: Option<&str>, sink: &Arc<MemoryLogSink>) -> FrameContext {
    let mut builder = Request::builder().method(Method::GET).uri("https://frames.test/app?tab=2");
    if let Some(accept) = accept {
        builder = builder.header(ACCEPT, accept);
    }
    let request = FrameRequest::from_http(builder.body(Bytes::new()).unwrap(), None).unwrap();
    FrameContext::new(request, "/app", None).with_log(Arc::clone(sink) as Arc<dyn FrameLogSink>)
}

async fn render_with(
    renderer: RenderResponseMiddleware,
    accept: Option<&str>,
    result: fn() -> MiddlewareResult,
) -> (Response<Bytes>, Arc<MemoryLogSink>) {
    let sink = Arc::new(MemoryLogSink::new());
    let handler: SharedMiddleware = Arc::new(HandlerMiddleware::new(move |_ctx: FrameContext| async move { result() }));
    let chain = compose_middleware(vec![Arc::new(renderer), handler]).unwrap();
    match run_middleware(&chain, context(accept, &sink)).await.unwrap() {
        FrameResult::Response(response) => (response, sink),
        other => panic!("renderer returned {other:?}"),
    }
}

async fn render(result: fn() -> MiddlewareResult) -> Response<Bytes> {
    render_with(RenderResponseMiddleware::new(), None, result).await.0
}

fn body_text(response: &Response<Bytes>) -> String {
    String::from_utf8(response.body().to_vec()).unwrap()
}

fn meta(response: &Response<Bytes>) -> std::collections::BTreeMap<String, String> {
    parse_meta_tags(&body_text(response)).into_iter().collect()
}

fn buttons(count: usize) -> FrameDefinition {
    (1 ..= count).fold(FrameDefinition::new("/img.png"), |frame, n| {
        frame.button(FrameButton::post(format!("Button {n}"), None))
    })
}

// ============================================================================
// SECTION: Frames
// ============================================================================

#[tokio::test]
async fn four_buttons_render() {
    let response = render(|| Ok(buttons(4).into())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], HTML_CONTENT_TYPE);
    let meta = meta(&response);
    assert_eq!(meta["fc:frame:button:4"], "Button 4");
    assert_eq!(meta["fc:frame:button:4:target"], "https://frames.test/app?__bi=4%3Ap");
}

#[tokio::test]
async fn five_buttons_fail_without_partial_output() {
    let response = render(|| Ok(buttons(5).into())).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(&response), "Only 4 buttons are allowed");
}

#[tokio::test]
async fn relative_images_and_targets_resolve_against_base_path() {
    let response = render(|| {
        Ok(FrameDefinition::new("img/a.png")
            .button(FrameButton::post("Go", Some(ButtonTarget::with_query("next", [("page", "2")]))))
            .button(FrameButton::link("Docs", "https://docs.test"))
            .into())
    })
    .await;
    let meta = meta(&response);
    assert_eq!(meta["fc:frame:image"], "https://frames.test/app/img/a.png");
    assert_eq!(meta["fc:frame:post_url"], "https://frames.test/app");
    assert_eq!(meta["fc:frame:button:1:target"], "https://frames.test/app/next?page=2&__bi=1%3Ap");
    assert_eq!(meta["fc:frame:button:2:target"], "https://docs.test");
    assert_eq!(meta["fc:frame:button:2:action"], "link");
}

#[tokio::test]
async fn farcaster_is_always_accepted() {
    let response = render(|| Ok(FrameDefinition::new("/a.png").into())).await;
    let meta = meta(&response);
    assert_eq!(meta["of:accepts:farcaster"], "vNext");
    assert_eq!(meta["of:version"], "vNext");
}

#[tokio::test]
async fn configured_accepts_are_advertised() {
    let renderer =
        RenderResponseMiddleware::new().with_accepts(vec![ClientProtocolId::new("xmtp", "vNext").unwrap()]);
    let (response, _) =
        render_with(renderer, None, || Ok(FrameResult::Dynamic(json!({"image": "/a.png"})))).await;
    assert_eq!(meta(&response)["of:accepts:xmtp"], "vNext");
}

#[tokio::test]
async fn json_accept_selects_json_encoding() {
    let (response, _) = render_with(RenderResponseMiddleware::new(), Some(FRAME_JSON_MEDIA_TYPE), || {
        Ok(FrameDefinition::new("/a.png").state(json!({"n": 1})).into())
    })
    .await;
    assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["fc:frame:state"], r#"{"n":1}"#);
}

#[tokio::test]
async fn frame_init_overrides_status_and_headers() {
    let response = render(|| {
        Ok(FrameDefinition::new("/a.png")
            .status(201)
            .header("cache-control", "no-store")
            .header("content-type", "text/html")
            .into())
    })
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["cache-control"], "no-store");
    assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
}

#[tokio::test]
async fn oversized_state_is_rejected() {
    let response = render(|| {
        Ok(FrameDefinition::new("/a.png").state(json!("x".repeat(MAX_STATE_BYTES))).into())
    })
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(&response), "State must not exceed 4096 bytes when serialized");
}

#[tokio::test]
async fn element_images_use_the_image_renderer() {
    let renderer = RenderResponseMiddleware::new().with_image_renderer(Arc::new(SvgImageRenderer::new()));
    let (response, _) = render_with(renderer, None, || {
        Ok(FrameDefinition::new(crate::core::frame::ImageElement::text("hi")).into())
    })
    .await;
    assert!(meta(&response)["og:image"].starts_with("data:image/svg+xml;base64,"));
}

#[tokio::test]
async fn missing_image_renderer_is_an_image_error() {
    let (response, sink) = render_with(RenderResponseMiddleware::new(), None, || {
        Ok(FrameDefinition::new(crate::core::frame::ImageElement::text("hi")).into())
    })
    .await;
    assert_eq!(body_text(&response), "Failed to render image");
    assert_eq!(sink.events_named("frame_render_failed")[0].level, LogLevel::Error);
}

#[tokio::test]
async fn unrecognized_dynamic_action_reveals_message() {
    let response = render(|| {
        Ok(FrameResult::Dynamic(json!({
            "image": "/a.png",
            "buttons": [{"label": "x", "action": "teleport"}]
        })))
    })
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(&response).contains("teleport"));
}

// ============================================================================
// SECTION: Redirects, Passthrough, Errors
// ============================================================================

#[tokio::test]
async fn redirect_defaults_to_found() {
    let response = render(|| Ok(FrameRedirect::new("https://elsewhere.test/").into())).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "https://elsewhere.test/");
}

#[tokio::test]
async fn redirect_status_can_be_overridden() {
    let response = render(|| Ok(FrameRedirect::new("/moved").status(301).into())).await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
}

#[tokio::test]
async fn raw_responses_pass_through() {
    let response = render(|| {
        let mut response = Response::new(Bytes::from_static(b"teapot"));
        *response.status_mut() = StatusCode::IM_A_TEAPOT;
        Ok(response.into())
    })
    .await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(body_text(&response), "teapot");
}

#[tokio::test]
async fn internal_errors_are_generic_and_logged() {
    let (response, sink) = render_with(RenderResponseMiddleware::new(), None, || {
        Err(FrameError::internal("database password is hunter2"))
    })
    .await;
    assert_eq!(body_text(&response), "Internal Server Error");
    let events = sink.events_named("frame_render_failed");
    assert_eq!(events.len(), 1);
    assert!(events[0].message.contains("hunter2"));
}

#[tokio::test]
async fn json_errors_use_a_json_body() {
    let (response, _) = render_with(RenderResponseMiddleware::new(), Some(FRAME_JSON_MEDIA_TYPE), || {
        Err(FrameError::internal("boom"))
    })
    .await;
    assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body, json!({"error": "Internal Server Error"}));
}

#[tokio::test]
async fn deferred_results_are_internal_errors() {
    let response = render(|| Ok(FrameResult::Deferred)).await;
    assert_eq!(body_text(&response), "Internal Server Error");
}

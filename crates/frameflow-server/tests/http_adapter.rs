// crates/frameflow-server/tests/http_adapter.rs
// ============================================================================
// Module: HTTP Adapter Integration Tests
// Description: Counter frame served over a real TCP listener.
// Purpose: Validate routing, body limits and state round trips over HTTP.
// ============================================================================

//! Integration tests for the axum frame adapter.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;

use bytes::Bytes;
use frameflow_config::FrameflowConfig;
use frameflow_core::FRAME_JSON_MEDIA_TYPE;
use frameflow_core::Frames;
use frameflow_core::metadata::parse_meta_tags;
use frameflow_server::counter_builder;
use frameflow_server::counter_frames;
use frameflow_server::frame_route;
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::HeaderMap;
use hyper::Method;
use hyper::Request;
use hyper::StatusCode;
use hyper::header::ACCEPT;
use hyper::header::CONTENT_TYPE;
use hyper::header::HOST;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use url::Url;

// ============================================================================
// SECTION: Helpers
// ============================================================================

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Reply {
    fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }

    fn meta(&self) -> BTreeMap<String, String> {
        parse_meta_tags(&self.text()).into_iter().collect()
    }
}

fn counter(base_path: &str) -> Frames {
    counter_frames(counter_builder().base_path(base_path)).unwrap()
}

async fn spawn(frames: Frames, max_body_bytes: usize) -> SocketAddr {
    let app = frame_route(frames, max_body_bytes).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn send(
    addr: SocketAddr,
    method: Method,
    path: &str,
    accept: Option<&str>,
    body: Bytes,
) -> Reply {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, connection) =
        hyper::client::conn::http1::handshake(TokioIo::new(stream)).await.unwrap();
    tokio::spawn(connection);
    let mut builder = Request::builder().method(method).uri(path).header(HOST, addr.to_string());
    if let Some(accept) = accept {
        builder = builder.header(ACCEPT, accept);
    }
    if !body.is_empty() {
        builder = builder.header(CONTENT_TYPE, "application/json");
    }
    let response = sender.send_request(builder.body(Full::new(body)).unwrap()).await.unwrap();
    let (parts, body) = response.into_parts();
    Reply {
        status: parts.status,
        headers: parts.headers,
        body: body.collect().await.unwrap().to_bytes(),
    }
}

fn path_and_query(target: &str) -> String {
    let url = Url::parse(target).unwrap();
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn initial_get_renders_counter_frame() {
    let addr = spawn(counter("/counter"), 1024).await;
    let reply = send(addr, Method::GET, "/counter", None, Bytes::new()).await;
    assert_eq!(reply.status, StatusCode::OK);
    let meta = reply.meta();
    assert_eq!(meta["fc:frame:state"], r#"{"count":0}"#);
    assert_eq!(meta["fc:frame:button:3"], "Reset");
    assert_eq!(meta["og:title"], "Frameflow counter");
    assert!(meta["fc:frame:image"].starts_with("data:image/svg+xml;base64,"));
    assert_eq!(meta["fc:frame:post_url"], format!("http://{addr}/counter"));
}

#[tokio::test]
async fn pressing_increment_advances_the_count() {
    let addr = spawn(counter("/counter"), 1024).await;
    let first = send(addr, Method::GET, "/counter", None, Bytes::new()).await;
    let target = path_and_query(&first.meta()["fc:frame:button:1:target"]);
    let reply = send(addr, Method::POST, &target, None, Bytes::from_static(b"{}")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.meta()["fc:frame:state"], r#"{"count":1}"#);
}

#[tokio::test]
async fn hub_native_presses_carry_state_across_turns() {
    let addr = spawn(counter("/counter"), 4096).await;
    let first = send(addr, Method::GET, "/counter", None, Bytes::new()).await;
    let mut meta = first.meta();
    for expected in [r#"{"count":1}"#, r#"{"count":2}"#] {
        let target = path_and_query(&meta["fc:frame:button:1:target"]);
        let body = json!({
            "untrustedData": {
                "fid": 7,
                "url": format!("http://{addr}/counter"),
                "buttonIndex": 1,
                "state": meta["fc:frame:state"],
            },
            "trustedData": {"messageBytes": "00"}
        });
        let reply = send(addr, Method::POST, &target, None, Bytes::from(body.to_string())).await;
        assert_eq!(reply.status, StatusCode::OK);
        meta = reply.meta();
        assert_eq!(meta["fc:frame:state"], expected);
    }
}

#[tokio::test]
async fn nested_paths_reach_the_pipeline() {
    let addr = spawn(counter("/counter"), 1024).await;
    let reply = send(addr, Method::GET, "/counter/deeper/page", None, Bytes::new()).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn paths_outside_the_base_path_are_not_found() {
    let addr = spawn(counter("/counter"), 1024).await;
    let reply = send(addr, Method::GET, "/elsewhere", None, Bytes::new()).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let addr = spawn(counter("/"), 16).await;
    let body = Bytes::from(vec![b' '; 64]);
    let reply = send(addr, Method::POST, "/", None, body).await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(reply.text(), "Payload Too Large");
}

#[tokio::test]
async fn json_accept_returns_json_metadata() {
    let addr = spawn(counter("/"), 1024).await;
    let reply = send(addr, Method::GET, "/", Some(FRAME_JSON_MEDIA_TYPE), Bytes::new()).await;
    assert_eq!(reply.headers[CONTENT_TYPE], "application/json");
    let body: Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(body["fc:frame"], "vNext");
}

#[tokio::test]
async fn configured_pipeline_serves_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frameflow.toml");
    fs::write(
        &path,
        r#"
[server]
public_origin = "https://frames.test"

[frames]
base_path = "/demo"
accepts = ["xmtp@vNext"]
initial_state = { count = 41 }

[logging]
sink = "none"
"#,
    )
    .unwrap();
    let config = FrameflowConfig::load(Some(&path)).unwrap();
    let frames = counter_frames(config.apply(counter_builder()).unwrap()).unwrap();
    let addr = spawn(frames, config.server.max_body_bytes).await;
    let reply = send(addr, Method::GET, "/demo", None, Bytes::new()).await;
    let meta = reply.meta();
    assert_eq!(meta["fc:frame:state"], r#"{"count":41}"#);
    assert_eq!(meta["of:accepts:xmtp"], "vNext");
    assert_eq!(meta["fc:frame:post_url"], "https://frames.test/demo");
}

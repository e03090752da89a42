use arrgate_gateway::server::GatewayServer;
use arrgate_kernel::config::GatewaySettings;
use arrgate_kernel::gateway::{FailureKind, TransportFailure, UpstreamResponse};
use arrgate_testing::MockTransport;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

fn isolated() -> GatewaySettings {
    GatewaySettings {
        isolated: true,
        ..GatewaySettings::default()
    }
}

fn app(settings: GatewaySettings, transport: &MockTransport) -> Router {
    GatewayServer::with_transport(settings, Arc::new(transport.clone())).build_app()
}

async fn post_raw(app: Router, path: &str, body: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .expect("request success");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = serde_json::from_slice(&bytes).expect("gateway always answers JSON");
    (status, value)
}

async fn post_json(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, path, &body.to_string()).await
}

/// Shared sink for formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        self.0
            .lock()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut b) = self.0.lock() {
            b.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_url_is_rejected_without_network_activity() {
    let transport = MockTransport::new();
    let (status, body) = post_json(
        app(isolated(), &transport),
        "/proxy",
        json!({ "method": "GET", "headers": { "X-Api-Key": "abc" } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "URL is required" }));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn malformed_bodies_are_rejected_without_network_activity() {
    let transport = MockTransport::new();

    let (status, body) = post_raw(app(isolated(), &transport), "/proxy", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = post_json(
        app(isolated(), &transport),
        "/proxy",
        json!({ "url": "http://localhost:8989", "method": "BREW" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        app(isolated(), &transport),
        "/proxy",
        json!({ "url": "http://localhost:8989", "headers": { "Bad Header": "x" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid header 'Bad Header'" }));

    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn rejected_calls_are_logged_as_received() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = MockTransport::new();
    let (status, _) = post_json(app(isolated(), &transport), "/proxy", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let output = logs.contents();
    let received = output.find("proxy request received").expect("receipt logged");
    let rejected = output.find("rejected call").expect("rejection logged");
    assert!(received < rejected);
    assert!(!output.contains("proxy call validated"));
}

// ── Resolution ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn isolated_mode_dials_loopback_targets_through_the_bridge() {
    let transport = MockTransport::new();
    let (status, _) = post_json(
        app(isolated(), &transport),
        "/proxy",
        json!({ "url": "http://localhost:8989/api" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let history = transport.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].resolved, "http://host.docker.internal:8989/api");
    assert_eq!(history[0].call.target, "http://localhost:8989/api");
}

#[tokio::test]
async fn isolated_mode_dials_private_addresses_unchanged() {
    let transport = MockTransport::new();
    post_json(
        app(isolated(), &transport),
        "/proxy",
        json!({ "url": "http://192.168.1.50:7878/api" }),
    )
    .await;

    assert_eq!(transport.history()[0].resolved, "http://192.168.1.50:7878/api");
}

#[tokio::test]
async fn direct_mode_dials_targets_unchanged() {
    let transport = MockTransport::new();
    post_json(
        app(GatewaySettings::default(), &transport),
        "/proxy",
        json!({ "url": "http://localhost:8989/api" }),
    )
    .await;

    assert_eq!(transport.history()[0].resolved, "http://localhost:8989/api");
}

#[tokio::test]
async fn configured_timeout_reaches_the_transport() {
    let transport = MockTransport::new();
    let settings = GatewaySettings {
        request_timeout_ms: 1234,
        ..GatewaySettings::default()
    };
    post_json(app(settings, &transport), "/proxy", json!({ "url": "http://x.lan" })).await;

    assert_eq!(transport.history()[0].timeout, Duration::from_millis(1234));
}

// ── Relay ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upstream_statuses_are_relayed_under_200() {
    for code in [100u16, 200, 204, 301, 401, 404, 500, 503, 599] {
        let transport = MockTransport::new();
        transport.respond_with(UpstreamResponse::new(code, ""));

        let (status, body) = post_json(
            app(isolated(), &transport),
            "/proxy",
            json!({ "url": "http://192.168.1.50:7878/api" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "upstream {code}");
        assert_eq!(body["status"], code, "upstream {code}");
    }
}

#[tokio::test]
async fn upstream_not_found_is_relayed_verbatim() {
    let transport = MockTransport::new();
    transport.respond_with(
        UpstreamResponse::new(404, "Not Found")
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"not found"}"#),
    );

    let (status, body) = post_json(
        app(isolated(), &transport),
        "/proxy",
        json!({ "url": "http://localhost:8989/api/v3/series/99" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": 404,
            "statusText": "Not Found",
            "data": { "error": "not found" },
            "headers": { "content-type": "application/json" }
        })
    );
}

// ── Diagnosis ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn refused_connection_yields_502_with_message() {
    let transport = MockTransport::new();
    transport.fail_with(TransportFailure::new(
        FailureKind::ConnectionRefused,
        "tcp connect error: Connection refused (os error 111)",
        "http://host.docker.internal:8989/api",
    ));

    let (status, body) = post_json(
        app(isolated(), &transport),
        "/proxy",
        json!({ "url": "http://localhost:8989/api" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "ECONNREFUSED");
    assert_eq!(body["data"], Value::Null);
    let message = body["message"].as_str().unwrap();
    assert!(!message.is_empty());
    assert!(message.contains("host machine"));
}

#[tokio::test]
async fn timeout_yields_504() {
    let transport = MockTransport::new();
    transport.fail_with(TransportFailure::new(
        FailureKind::Timeout,
        "operation timed out",
        "http://10.0.0.9:32400",
    ));

    let (status, body) = post_json(
        app(isolated(), &transport),
        "/proxy",
        json!({ "url": "http://10.0.0.9:32400" }),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "ETIMEDOUT");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn other_failures_yield_error_envelope() {
    let transport = MockTransport::new();
    transport.fail_with(TransportFailure::new(
        FailureKind::Request,
        "builder error: relative URL without a base",
        "nas/api",
    ));

    let (status, body) = post_json(app(isolated(), &transport), "/proxy", json!({ "url": "nas/api" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "error": "builder error: relative URL without a base",
            "code": "EREQUEST",
            "data": null
        })
    );
}

// ── Surface ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn routes_are_served_bare_and_under_api() {
    let transport = MockTransport::new();

    for path in ["/health", "/api/health"] {
        let response = app(isolated(), &transport)
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({ "status": "ok" }));
    }

    let (status, _) = post_json(
        app(isolated(), &transport),
        "/api/proxy",
        json!({ "url": "http://localhost:8181/api/v2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let transport = MockTransport::new();
    let router = app(isolated(), &transport);

    let mut handles = Vec::new();
    for i in 0..16 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            post_json(
                router,
                "/proxy",
                json!({ "url": format!("http://localhost:{}/api", 9000 + i) }),
            )
            .await
        }));
    }
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(transport.call_count(), 16);
    assert!(
        transport
            .history()
            .iter()
            .all(|c| c.resolved.starts_with("http://host.docker.internal:"))
    );
}

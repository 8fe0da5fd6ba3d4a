//! Router-level tests: REST surface against the core with a scripted
//! transport double

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use lwm2m_api::{create_router, AppState};
use lwm2m_coap::MockTransport;
use lwm2m_core::{
    DeviceRegistry, DeviceSession, OperationKind, RequestDispatcher, TransportError,
};

struct Fixture {
    app: Router,
    transport: Arc<MockTransport>,
}

fn session(endpoint: &str) -> DeviceSession {
    let now = Utc::now();
    DeviceSession {
        endpoint: endpoint.to_string(),
        registration_id: "a1b2c3d4e5".to_string(),
        address: "192.0.2.10:56830".to_string(),
        registered_at: now,
        last_update: now,
        lifetime: 300,
        sms_number: None,
        object_links: vec!["</3/0>".to_string(), "</3303/0>".to_string()],
    }
}

/// Router over a registry holding `endpoints`, dispatching to a fresh mock
fn fixture(endpoints: &[&str]) -> Fixture {
    let registry = Arc::new(DeviceRegistry::new());
    for endpoint in endpoints {
        registry.insert(session(endpoint));
    }
    let transport = Arc::new(MockTransport::new());
    let dispatcher = Arc::new(RequestDispatcher::with_timeout(
        registry.clone(),
        transport.clone(),
        Duration::from_millis(200),
    ));
    Fixture {
        app: create_router(AppState::new(registry, dispatcher)),
        transport,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

async fn post(app: &Router, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

// =============================================================================
// Directory
// =============================================================================

#[tokio::test]
async fn list_clients_links_each_endpoint() {
    let fixture = fixture(&["dev1"]);
    let (status, body) = get(&fixture.app, "/api/clients").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"endpoint": "dev1", "link": "/api/clients/dev1"}]));
}

#[tokio::test]
async fn client_detail_exposes_the_session_record() {
    let fixture = fixture(&["dev1"]);
    let (status, body) = get(&fixture.app, "/api/clients/dev1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoint"], "dev1");
    assert_eq!(body["registrationId"], "a1b2c3d4e5");
    assert_eq!(body["address"], "192.0.2.10:56830");
    assert_eq!(body["lifetime"], 300);
    assert_eq!(body["objectLinks"], json!(["</3/0>", "</3303/0>"]));
    assert!(body["registrationDate"].is_string());
    assert!(body["lastUpdate"].is_string());
}

#[tokio::test]
async fn unknown_client_detail_is_404() {
    let fixture = fixture(&[]);
    let (status, body) = get(&fixture.app, "/api/clients/ghost").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Client not found"}));
}

// =============================================================================
// Read
// =============================================================================

#[tokio::test]
async fn read_success_passes_the_payload_through() {
    let fixture = fixture(&["dev1"]);
    fixture.transport.enqueue_success("23.5");

    let (status, body) = get(&fixture.app, "/api/clients/dev1/read/3/0/1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["path"], "/3/0/1");
    assert_eq!(body["value"], "23.5");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn read_protocol_failure_is_400_with_device_text() {
    let fixture = fixture(&["dev1"]);
    fixture.transport.enqueue_failure("resource not readable");

    let (status, body) = get(&fixture.app, "/api/clients/dev1/read/3/0/1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Failed to read resource: resource not readable"})
    );
}

#[tokio::test]
async fn read_timeout_is_400_and_distinguishable() {
    let fixture = fixture(&["dev1"]);
    fixture.transport.set_latency(Duration::from_secs(5));

    let (status, body) = get(&fixture.app, "/api/clients/dev1/read/3/0/1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Failed to read resource: timeout"}));
}

#[tokio::test]
async fn read_transport_fault_is_500() {
    let fixture = fixture(&["dev1"]);
    fixture
        .transport
        .enqueue(Err(TransportError::SendFailed("socket closed".to_string())));

    let (status, body) = get(&fixture.app, "/api/clients/dev1/read/3/0/1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "Exception reading resource: Send failed: socket closed"})
    );
}

#[tokio::test]
async fn read_unknown_endpoint_never_reaches_the_transport() {
    let fixture = fixture(&[]);
    let (status, body) = get(&fixture.app, "/api/clients/ghost/read/3/0/1").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Client not found"}));
    assert_eq!(fixture.transport.send_count(), 0);
}

// =============================================================================
// Write
// =============================================================================

#[tokio::test]
async fn write_success_echoes_the_written_value() {
    let fixture = fixture(&["dev1"]);
    fixture.transport.enqueue_success("");

    let (status, body) = post(
        &fixture.app,
        "/api/clients/dev1/write/1/0/5",
        Some(json!({"value": 42})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["path"], "/1/0/5");
    assert_eq!(body["writtenValue"], 42);

    let recorded = fixture.transport.last_request().unwrap();
    assert_eq!(recorded.endpoint, "dev1");
    assert_eq!(recorded.kind, OperationKind::Write);
}

#[tokio::test]
async fn write_without_value_is_rejected_before_dispatch() {
    let fixture = fixture(&["dev1"]);

    let (status, body) = post(
        &fixture.app,
        "/api/clients/dev1/write/1/0/5",
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing 'value' field in request body"}));
    assert_eq!(fixture.transport.send_count(), 0);
}

#[tokio::test]
async fn write_null_value_counts_as_missing() {
    let fixture = fixture(&["dev1"]);

    let (status, body) = post(
        &fixture.app,
        "/api/clients/dev1/write/1/0/5",
        Some(json!({"value": null})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing 'value' field in request body"}));
    assert_eq!(fixture.transport.send_count(), 0);
}

#[tokio::test]
async fn write_to_unknown_endpoint_is_404_without_dispatch() {
    let fixture = fixture(&[]);

    let (status, body) = post(
        &fixture.app,
        "/api/clients/ghost/write/1/0/5",
        Some(json!({"value": "on"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Client not found"}));
    assert_eq!(fixture.transport.send_count(), 0);
}

#[tokio::test]
async fn write_protocol_failure_uses_the_write_vocabulary() {
    let fixture = fixture(&["dev1"]);
    fixture.transport.enqueue_failure("resource not writable");

    let (status, body) = post(
        &fixture.app,
        "/api/clients/dev1/write/1/0/5",
        Some(json!({"value": true})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Failed to write resource: resource not writable"})
    );
}

// =============================================================================
// Execute
// =============================================================================

#[tokio::test]
async fn execute_echoes_arguments() {
    let fixture = fixture(&["dev1"]);
    fixture.transport.enqueue_success("");

    let (status, body) = post(
        &fixture.app,
        "/api/clients/dev1/execute/3/0/4",
        Some(json!({"arguments": "delay=5"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["executed"], true);
    assert_eq!(body["arguments"], "delay=5");

    let recorded = fixture.transport.last_request().unwrap();
    assert_eq!(recorded.kind, OperationKind::Execute);
}

#[tokio::test]
async fn execute_body_is_optional() {
    let fixture = fixture(&["dev1"]);
    fixture.transport.enqueue_success("");

    let (status, body) = post(&fixture.app, "/api/clients/dev1/execute/3/0/4", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["executed"], true);
    assert_eq!(body["arguments"], "");
}

//! HTTP transport tests against a mock chat service
//!
//! Tests cover:
//! - Streaming endpoint request shape and body delivery
//! - Error statuses on every endpoint
//! - Health and non-streaming endpoints
//! - A full Conductor session over HTTP

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chat_conductor::{
    ChatRequest, ChatTransport, Conductor, ConductorConfig, HttpTransport, SessionOutcome,
    TransportError,
};

const REPLY_BODY: &str = "data: {\"text\": \"Merhaba\", \"done\": false}\n\n\
                          data: {\"text\": \", nasıl yardımcı olabilirim?\", \"done\": false}\n\n\
                          data: {\"text\": \"\", \"done\": true}\n\n";

fn transport_for(server: &MockServer) -> HttpTransport {
    let config = ConductorConfig::default().with_base_url(server.uri());
    HttpTransport::from_config(&config).unwrap()
}

fn event_stream(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

// =============================================================================
// Streaming endpoint
// =============================================================================

#[tokio::test]
async fn test_open_stream_delivers_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/stream"))
        .and(header("accept", "text/event-stream"))
        .and(body_json(json!({"message": "Merhaba", "user_id": "default_user"})))
        .respond_with(event_stream(REPLY_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let mut stream = transport
        .open_stream(&ChatRequest::new("Merhaba", "default_user"))
        .await
        .unwrap();

    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(String::from_utf8(body).unwrap(), REPLY_BODY);
}

#[tokio::test]
async fn test_open_stream_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/stream"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model unavailable"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let result = transport
        .open_stream(&ChatRequest::new("x", "default_user"))
        .await;

    match result {
        Err(TransportError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "model unavailable");
        }
        Err(other) => panic!("expected status error, got {other:?}"),
        Ok(_) => panic!("expected status error, got a stream"),
    }
}

#[tokio::test]
async fn test_connection_refused() {
    // Nothing listens on the discard port
    let config = ConductorConfig::default().with_base_url("http://127.0.0.1:9");
    let transport = HttpTransport::from_config(&config).unwrap();

    let result = transport
        .open_stream(&ChatRequest::new("x", "default_user"))
        .await;
    assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
}

// =============================================================================
// Health and non-streaming endpoints
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "healthy", "api_key_configured": false})),
        )
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let health = transport.health_check().await.unwrap();
    assert!(health.is_healthy());
    assert!(!health.api_key_configured);
    assert!(transport.is_available().await);
}

#[tokio::test]
async fn test_health_check_invalid_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    assert!(matches!(
        transport.health_check().await,
        Err(TransportError::InvalidBody(_))
    ));
    assert!(!transport.is_available().await);
}

#[tokio::test]
async fn test_send_whole_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"message": "plan", "user_id": "default_user"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Here is your plan.",
            "career_plan": {"goal": "Backend engineer"},
            "schedule": null,
            "resources": [{"title": "The Rust Book"}]
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let reply = transport
        .send(&ChatRequest::new("plan", "default_user"))
        .await
        .unwrap();

    assert_eq!(reply.response, "Here is your plan.");
    assert_eq!(reply.career_plan, Some(json!({"goal": "Backend engineer"})));
    assert_eq!(reply.schedule, None);
    assert_eq!(reply.resources.map(|r| r.len()), Some(1));
}

// =============================================================================
// Conductor over HTTP
// =============================================================================

#[tokio::test]
async fn test_conductor_session_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/stream"))
        .respond_with(event_stream(REPLY_BODY))
        .mount(&server)
        .await;

    let config = ConductorConfig::default()
        .with_base_url(server.uri())
        .with_greeting(None);
    let transport = HttpTransport::from_config(&config).unwrap();
    let (tx, _rx) = mpsc::channel(64);
    let mut conductor = Conductor::new(transport, config, tx);

    match conductor.send_message("Merhaba").await.unwrap() {
        SessionOutcome::Completed { text, stats, .. } => {
            assert_eq!(text, "Merhaba, nasıl yardımcı olabilirim?");
            assert_eq!(stats.deltas, 2);
            assert_eq!(stats.completions, 1);
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert!(!conductor.is_loading());
}

#[tokio::test]
async fn test_conductor_error_status_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/stream"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let config = ConductorConfig::default()
        .with_base_url(server.uri())
        .with_greeting(None)
        .with_fallback_message("Bir hata oluştu.");
    let transport = HttpTransport::from_config(&config).unwrap();
    let (tx, _rx) = mpsc::channel(64);
    let mut conductor = Conductor::new(transport, config, tx);

    let outcome = conductor.send_message("x").await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Failed { .. }));

    let messages = conductor.history().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "Bir hata oluştu.");
    assert!(!conductor.is_loading());
}

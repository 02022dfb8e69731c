use std::time::Duration;

use serde_json::json;
use sprout::session::{
    EngineIoTransport, EventSink, ReconnectPolicy, Transport, TransportError, TransportEvent,
};
use tokio::sync::mpsc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string, body_string_contains, method, path, query_param},
};

// ============================================================================
// Helper Functions
// ============================================================================

const OPEN_PACKET: &str =
    r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

fn policy() -> ReconnectPolicy {
    ReconnectPolicy {
        attempts: 0,
        delay: Duration::from_millis(50),
        connect_timeout: Duration::from_secs(5),
    }
}

/// Open packet for a fresh GET, "ok" for every POST, and an idle noop for
/// session polls nothing else claims.
async fn mount_engine(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OPEN_PACKET))
        .with_priority(10)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .and(query_param("sid", "abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("6")
                .set_delay(Duration::from_millis(100)),
        )
        .with_priority(9)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/socket.io/"))
        .and(query_param("sid", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(server)
        .await;
}

/// Queue one session poll response, served before the idle noop.
async fn mount_poll_once(server: &MockServer, body: &str, priority: u8) {
    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .and(query_param("sid", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .up_to_n_times(1)
        .with_priority(priority)
        .mount(server)
        .await;
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<TransportEvent>) -> TransportEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no transport event within 5s")
        .expect("sink dropped")
}

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_handshake_joins_namespace() {
    let server = MockServer::start().await;
    mount_engine(&server).await;
    mount_poll_once(&server, r#"40/chat,{"sid":"ns-1"}"#, 1).await;

    let transport = EngineIoTransport::new(&server.uri(), "/chat", policy());
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.connect(EventSink::new(tx));

    assert_eq!(next_event(&mut rx).await, TransportEvent::Connected);
    assert!(transport.is_linked());

    let requests = server.received_requests().await.unwrap();
    let join = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("namespace join was posted");
    assert_eq!(String::from_utf8_lossy(&join.body), "40/chat,");

    transport.disconnect().await;
    assert!(!transport.is_linked());
}

#[tokio::test]
async fn test_connect_error_is_reported() {
    let server = MockServer::start().await;
    mount_engine(&server).await;
    mount_poll_once(&server, r#"44/chat,{"message":"unauthorized"}"#, 1).await;

    let transport = EngineIoTransport::new(&server.uri(), "/chat", policy());
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.connect(EventSink::new(tx));

    match next_event(&mut rx).await {
        TransportEvent::ConnectError(message) => assert!(message.contains("unauthorized")),
        other => panic!("expected ConnectError, got {other:?}"),
    }
    assert!(!transport.is_linked());
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_inbound_event_reaches_sink() {
    let server = MockServer::start().await;
    mount_engine(&server).await;
    mount_poll_once(&server, r#"40/chat,{"sid":"ns-1"}"#, 1).await;
    mount_poll_once(
        &server,
        r#"42/chat,["message","{\"answer\":\"Water early.\"}"]"#,
        2,
    )
    .await;

    let transport = EngineIoTransport::new(&server.uri(), "chat", policy());
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.connect(EventSink::new(tx));

    assert_eq!(next_event(&mut rx).await, TransportEvent::Connected);
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Message {
            event: "message".into(),
            payload: json!("{\"answer\":\"Water early.\"}"),
        }
    );

    transport.disconnect().await;
}

#[tokio::test]
async fn test_packets_sharing_the_join_ack_are_handled() {
    let server = MockServer::start().await;
    mount_engine(&server).await;
    mount_poll_once(
        &server,
        "40/chat,{\"sid\":\"ns-1\"}\u{1e}2\u{1e}42/chat,[\"message\",\"{\\\"answer\\\":\\\"Mulch now.\\\"}\"]",
        1,
    )
    .await;

    let transport = EngineIoTransport::new(&server.uri(), "/chat", policy());
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.connect(EventSink::new(tx));

    assert_eq!(next_event(&mut rx).await, TransportEvent::Connected);
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Message {
            event: "message".into(),
            payload: json!("{\"answer\":\"Mulch now.\"}"),
        }
    );

    // the ping ahead of the event was answered
    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .any(|r| r.method.as_str() == "POST" && r.body == b"3")
    );

    transport.disconnect().await;
}

#[tokio::test]
async fn test_stalled_emit_is_bounded() {
    let server = MockServer::start().await;
    mount_engine(&server).await;
    mount_poll_once(&server, r#"40/chat,{"sid":"ns-1"}"#, 1).await;

    Mock::given(method("POST"))
        .and(path("/socket.io/"))
        .and(body_string_contains("42/chat,"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("ok")
                .set_delay(Duration::from_secs(10)),
        )
        .with_priority(1)
        .mount(&server)
        .await;

    let transport = EngineIoTransport::new(
        &server.uri(),
        "/chat",
        ReconnectPolicy {
            connect_timeout: Duration::from_secs(1),
            ..policy()
        },
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.connect(EventSink::new(tx));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Connected);

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        transport.emit("message", json!({"userID": "TEST001", "context": "Hi"})),
    )
    .await
    .expect("emit was not bounded");
    assert!(matches!(outcome, Err(TransportError::Network(_))));

    transport.disconnect().await;
}

#[tokio::test]
async fn test_emit_posts_event_packet() {
    let server = MockServer::start().await;
    mount_engine(&server).await;
    mount_poll_once(&server, r#"40/chat,{"sid":"ns-1"}"#, 1).await;

    Mock::given(method("POST"))
        .and(path("/socket.io/"))
        .and(body_string_contains("42/chat,"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .with_priority(1)
        .mount(&server)
        .await;

    let transport = EngineIoTransport::new(&server.uri(), "/chat", policy());
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.connect(EventSink::new(tx));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Connected);

    transport
        .emit("message", json!({"userID": "TEST001", "context": "Hi"}))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = requests
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).to_string())
        .find(|b| b.starts_with("42/chat,"))
        .unwrap();
    let args: serde_json::Value = serde_json::from_str(&body["42/chat,".len()..]).unwrap();
    assert_eq!(args, json!(["message", {"userID": "TEST001", "context": "Hi"}]));

    transport.disconnect().await;
}

#[tokio::test]
async fn test_disconnect_posts_leave_and_close() {
    let server = MockServer::start().await;
    mount_engine(&server).await;
    mount_poll_once(&server, r#"40/chat,{"sid":"ns-1"}"#, 1).await;

    Mock::given(method("POST"))
        .and(path("/socket.io/"))
        .and(body_string("41/chat,\u{1e}1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .with_priority(1)
        .mount(&server)
        .await;

    let transport = EngineIoTransport::new(&server.uri(), "/chat", policy());
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.connect(EventSink::new(tx));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Connected);

    transport.disconnect().await;
    // `.expect(1)` is verified when the server drops
}

#[tokio::test]
async fn test_emit_without_session_fails() {
    let transport = EngineIoTransport::new("http://127.0.0.1:9", "/chat", policy());
    let err = transport.emit("message", json!({})).await.unwrap_err();
    assert_eq!(err, TransportError::NotConnected);
}

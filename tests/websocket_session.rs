//! End-to-end session over a real WebSocket.
//!
//! A local tokio-tungstenite server plays the hub: it acknowledges the
//! socket with `{"S":1}`, echoes invocations and pushes one message per
//! call. Negotiate and start are answered by a scripted HTTP client.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use signalr_client::transport::{HttpClient, HttpResponse};
use signalr_client::{Client, ConnectionBuilder, Error, HandshakeState, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_util::sync::CancellationToken;
use url::Url;

// ============================================================================
// Fixtures
// ============================================================================

/// Answers negotiate and start, recording every URL.
#[derive(Default)]
struct HubHttp {
    requests: Mutex<Vec<Url>>,
}

#[async_trait]
impl HttpClient for HubHttp {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.requests.lock().push(url.clone());

        let body = if url.path().ends_with("/negotiate") {
            json!({
                "Url": "/signalr",
                "ConnectionToken": "tok/en",
                "ConnectionId": "cid-1",
                "KeepAliveTimeout": 20.0,
                "DisconnectTimeout": 30.0,
                "TryWebSockets": true,
                "ProtocolVersion": "1.5"
            })
        } else if url.path().ends_with("/start") {
            json!({ "Response": "started" })
        } else {
            return Ok(HttpResponse::new(404, "not found"));
        };

        Ok(HttpResponse::new(200, body.to_string()))
    }
}

/// Accepts one socket, sends the init frame, then echoes invocations.
///
/// Resolves `uri_tx` with the upgrade request URI.
async fn hub_server(listener: TcpListener, uri_tx: oneshot::Sender<String>, init: &'static str) {
    let (stream, _) = listener.accept().await.expect("accept");
    let callback = move |request: &Request, response: Response| {
        let _ = uri_tx.send(request.uri().to_string());
        Ok::<Response, ErrorResponse>(response)
    };
    let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
        .await
        .expect("upgrade");

    ws.send(Message::text(init)).await.expect("init");
    // The client may already have hung up after a rejected init
    let _ = ws.send(Message::text("{}")).await;

    while let Some(Ok(message)) = ws.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let request: Value = serde_json::from_str(&text).expect("invocation json");

        let reply = json!({ "I": request["I"].to_string(), "Result": request["A"][0] });
        let push = json!({
            "C": "d-1",
            "M": [{ "H": request["H"], "M": "uE", "A": [request["M"], request["I"]] }]
        });

        if ws.send(Message::text(reply.to_string())).await.is_err()
            || ws.send(Message::text(push.to_string())).await.is_err()
        {
            break;
        }
    }
}

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let host = listener.local_addr().expect("addr").to_string();
    (listener, host)
}

fn builder(host: &str, http: Arc<HubHttp>) -> ConnectionBuilder {
    ConnectionBuilder::new()
        .host(host)
        .insecure()
        .endpoint("/signalr")
        .connection_data(r#"[{"name":"corehub"}]"#)
        .http_client(http)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_full_session_over_websocket() {
    let (listener, host) = listen().await;
    let (uri_tx, uri_rx) = oneshot::channel();
    let server = tokio::spawn(hub_server(listener, uri_tx, r#"{"S":1}"#));

    let http = Arc::new(HubHttp::default());
    let client = Client::connect("corehub", builder(&host, Arc::clone(&http)))
        .await
        .expect("connect");

    // Session metadata
    assert_eq!(client.session().connection_id.as_str(), "cid-1");
    assert_eq!(client.session().connection_token, "tok%2Fen");
    assert!(client.session().negotiate.try_web_sockets);

    // Handshake URLs
    let connect_uri = uri_rx.await.expect("upgrade uri");
    assert!(connect_uri.starts_with("/signalr/connect?"));
    assert!(connect_uri.contains("connectionToken=tok%2Fen"));
    assert!(connect_uri.contains("transport=webSockets"));

    {
        let requests = http.requests.lock();
        assert_eq!(requests.len(), 2);

        let negotiate = &requests[0];
        assert_eq!(negotiate.scheme(), "http");
        assert_eq!(negotiate.path(), "/signalr/negotiate");
        assert!(!negotiate.query().unwrap_or_default().contains("connectionToken"));
        assert!(!negotiate.query().unwrap_or_default().contains("transport"));

        let start = &requests[1];
        assert_eq!(start.path(), "/signalr/start");
        assert!(start.query().unwrap_or_default().contains("connectionToken=tok%2Fen"));
    }

    // Traffic
    let cancel = CancellationToken::new();
    let runner = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { client.run(cancel).await })
    };

    let mut pushes = client.callback("uE").expect("subscribe");

    let echoed: String = client.call("Echo", ("hello",)).await.expect("call");
    assert_eq!(echoed, "hello");

    let (method, id): (String, u64) = pushes.read_args().await.expect("push");
    assert_eq!(method, "Echo");
    assert_eq!(id, 1);

    let second = client.invoke("Echo", (42,)).await.expect("invoke");
    assert_eq!(second.id().as_u64(), 2);
    assert_eq!(second.result().await.expect("result"), json!(42));

    cancel.cancel();
    runner.await.expect("join").expect("run");
    assert!(client.is_closed());

    server.await.expect("server");
}

#[tokio::test]
async fn test_bad_init_frame_fails_handshake() {
    let (listener, host) = listen().await;
    let (uri_tx, _uri_rx) = oneshot::channel();
    let server = tokio::spawn(hub_server(listener, uri_tx, r#"{"S":0}"#));

    let mut handshake = builder(&host, Arc::new(HubHttp::default()))
        .build()
        .expect("build");

    handshake.negotiate().await.expect("negotiate");
    let socket = handshake.connect().await.expect("connect");
    let err = handshake.start(socket).await.unwrap_err();

    assert!(err.is_handshake_error());
    assert_eq!(handshake.state(), HandshakeState::Failed);

    server.await.expect("server");
}

#[tokio::test]
async fn test_server_drop_ends_run() {
    let (listener, host) = listen().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("upgrade");
        ws.send(Message::text(r#"{"S":1}"#)).await.expect("init");
        ws.close(None).await.expect("close");
    });

    let client = Client::connect("corehub", builder(&host, Arc::new(HubHttp::default())))
        .await
        .expect("connect");
    let pending = client.invoke("Never", ()).await;

    let err = client.run(CancellationToken::new()).await.unwrap_err();
    assert!(err.is_connection_error());

    if let Ok(invocation) = pending {
        assert!(matches!(invocation.result().await, Err(Error::Cancelled)));
    }

    server.await.expect("server");
}

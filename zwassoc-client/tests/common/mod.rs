//! In-process stand-in for zwave-js-server.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};
use zwassoc_client::{Client, ConnectionConfig};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MockServer {
    listener: TcpListener,
}

impl MockServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self { listener }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.listener.local_addr().unwrap())
    }

    /// Accepts the next client and completes the WebSocket upgrade.
    pub async fn accept(&self) -> Peer {
        let (stream, _) = tokio::time::timeout(RECV_TIMEOUT, self.listener.accept())
            .await
            .expect("client did not connect")
            .unwrap();
        Peer {
            ws: accept_async(stream).await.unwrap(),
        }
    }
}

/// Server side of one client connection.
pub struct Peer {
    ws: WebSocketStream<TcpStream>,
}

impl Peer {
    pub async fn send_text(&mut self, text: &str) {
        self.ws.send(Message::Text(text.to_string())).await.unwrap();
    }

    pub async fn send_json(&mut self, value: Value) {
        self.send_text(&value.to_string()).await;
    }

    /// Receives the next request, failing the test if none arrives in time.
    pub async fn recv_json(&mut self) -> Value {
        self.try_recv_json(RECV_TIMEOUT)
            .await
            .expect("no request from client")
    }

    /// Receives the next request, or `None` if nothing arrives within `wait`.
    pub async fn try_recv_json(&mut self, wait: Duration) -> Option<Value> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.ws.next()).await.ok()?;
            match frame {
                Some(Ok(Message::Text(text))) => return Some(serde_json::from_str(&text).unwrap()),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("transport error: {}", e),
                None => return None,
            }
        }
    }

    pub async fn reply_ok(&mut self, request: &Value, result: Value) {
        self.send_json(json!({
            "type": "result",
            "messageId": request["messageId"],
            "success": true,
            "result": result,
        }))
        .await;
    }

    pub async fn reply_err(&mut self, request: &Value, error_code: &str) {
        self.send_json(json!({
            "type": "result",
            "messageId": request["messageId"],
            "success": false,
            "errorCode": error_code,
        }))
        .await;
    }

    pub async fn send_version(&mut self, server_version: &str) {
        self.send_json(version_message(server_version)).await;
    }

    /// Answers the schema and listen requests successfully.
    pub async fn complete_handshake(&mut self) {
        let schema = self.recv_json().await;
        assert_eq!(schema["command"], "set_api_schema");
        self.reply_ok(&schema, json!({})).await;

        let listen = self.recv_json().await;
        assert_eq!(listen["command"], "start_listening");
        self.reply_ok(&listen, json!({"state": {"nodes": []}})).await;
    }
}

pub fn version_message(server_version: &str) -> Value {
    json!({
        "type": "version",
        "serverVersion": server_version,
        "driverVersion": "9.0.0",
        "homeId": 123,
        "minSchemaVersion": 0,
        "maxSchemaVersion": 35,
    })
}

/// Starts a client against a fresh mock server and completes the handshake.
pub async fn ready_client(config: impl FnOnce(String) -> ConnectionConfig) -> (Client, Peer) {
    let server = MockServer::bind().await;
    let client = Client::connect(config(server.url()));
    let mut peer = server.accept().await;
    peer.send_version("1.2.3").await;
    peer.complete_handshake().await;
    client.ready().await.unwrap();
    (client, peer)
}

/// [`ready_client`] with the default configuration.
pub async fn connected() -> (Client, Peer) {
    ready_client(|url| ConnectionConfig::new(url)).await
}

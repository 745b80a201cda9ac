//! Connection management.
//!
//! A [`Connection`] owns one WebSocket to the server. Its driver task opens the
//! socket, then runs the read loop and the startup handshake side by side:
//! every inbound frame goes through [`Connection::dispatch`], which resolves the
//! version cell, completes pending requests or hands events to the configured
//! [`EventHandler`].

use crate::error::ClientError;
use crate::events::{DiscardEvents, EventHandler};
use crate::once::OnceSignal;
use crate::pending::PendingRequests;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;
use zwassoc_protocol::{
    Command, Decoder, Encoder, IncomingMessage, Request, VersionInfo, API_SCHEMA_VERSION,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outcome of the startup handshake, shared by every waiter.
type ReadyState = Result<(), Arc<ClientError>>;

/// Connection configuration.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Server URL, e.g. `ws://127.0.0.1:3000`.
    pub url: String,
    /// Receives unsolicited `event` messages.
    pub event_handler: Arc<dyn EventHandler>,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            event_handler: Arc::new(DiscardEvents),
        }
    }

    pub fn with_event_handler(mut self, handler: impl EventHandler) -> Self {
        self.event_handler = Arc::new(handler);
        self
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// A connection to a zwave-js-server instance.
pub struct Connection {
    config: ConnectionConfig,
    /// Write half of the socket; `None` until open and after close.
    writer: Mutex<Option<SplitSink<WsStream, Message>>>,
    /// Requests waiting for a `result` message.
    pending: PendingRequests,
    /// First `version` message received.
    version: OnceSignal<VersionInfo>,
    /// Set once the handshake finishes, successfully or not.
    ready: OnceSignal<ReadyState>,
    connected: AtomicBool,
}

impl Connection {
    /// Creates a new connection (not yet connected).
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            writer: Mutex::new(None),
            pending: PendingRequests::new(),
            version: OnceSignal::new(),
            ready: OnceSignal::new(),
            connected: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Drives the connection: opens the socket, then reads frames while the
    /// handshake runs. Returns when the socket closes.
    ///
    /// If the socket never opens, the version and ready cells stay unset.
    pub async fn run(self: Arc<Self>) {
        let reader = match self.open().await {
            Ok(reader) => reader,
            Err(e) => {
                tracing::error!("Failed to connect to {}: {}", self.config.url, e);
                return;
            }
        };

        let handshake = async {
            let outcome = self.handshake().await;
            match outcome {
                Ok(()) => tracing::debug!("Handshake complete"),
                Err(ref e) => tracing::error!("Handshake failed: {}", e),
            }
            self.ready.set(outcome.map_err(Arc::new));
        };

        tokio::join!(self.read_loop(reader), handshake);
    }

    /// Opens the socket and installs its write half.
    async fn open(&self) -> Result<SplitStream<WsStream>, ClientError> {
        tracing::debug!("Connecting to {}...", self.config.url);
        let (stream, _response) = connect_async(self.config.url.as_str()).await?;
        let (write_half, read_half) = stream.split();

        *self.writer.lock().await = Some(write_half);
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!("WebSocket connected");

        Ok(read_half)
    }

    /// Sets the API schema, then starts listening. The second request is only
    /// sent once the first one's reply has arrived.
    async fn handshake(&self) -> Result<(), ClientError> {
        tracing::debug!("Setting API schema {}", API_SCHEMA_VERSION);
        self.request(Request::new(Command::SetApiSchema {
            schema_version: API_SCHEMA_VERSION,
        }))
        .await?;

        tracing::debug!("Starting to listen");
        self.request(Request::new(Command::StartListening)).await?;

        Ok(())
    }

    /// Reads frames until the socket closes.
    async fn read_loop(&self, mut reader: SplitStream<WsStream>) {
        tracing::debug!("read_loop started");

        while let Some(frame) = reader.next().await {
            let decoded = match frame {
                Ok(Message::Text(text)) => Decoder::decode(&text),
                Ok(Message::Binary(bytes)) => Decoder::decode_bytes(&bytes),
                Ok(Message::Close(close)) => {
                    tracing::debug!("read_loop: server closed connection: {:?}", close);
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!("read_loop: transport error: {}", e);
                    break;
                }
            };

            match decoded {
                Ok(message) => self.dispatch_message(message),
                Err(e) => tracing::warn!("read_loop: dropping malformed message: {}", e),
            }
        }

        self.connected.store(false, Ordering::SeqCst);
        *self.writer.lock().await = None;
        if !self.pending.is_empty() {
            tracing::warn!(
                "Connection closed with {} request(s) still pending",
                self.pending.len()
            );
        }
        tracing::debug!("read_loop finished");
    }

    /// Parses and routes one inbound message.
    pub fn dispatch(&self, raw: &str) -> Result<(), ClientError> {
        let message = Decoder::decode(raw)?;
        self.dispatch_message(message);
        Ok(())
    }

    fn dispatch_message(&self, message: IncomingMessage) {
        match message {
            IncomingMessage::Version(info) => {
                tracing::debug!(
                    "dispatch: server {} driver {}",
                    info.server_version,
                    info.driver_version
                );
                if !info.supports_schema(API_SCHEMA_VERSION) {
                    tracing::warn!(
                        "Server schema range {:?}..={:?} does not include {}",
                        info.min_schema_version,
                        info.max_schema_version,
                        API_SCHEMA_VERSION
                    );
                }
                if !self.version.set(info) {
                    tracing::debug!("dispatch: ignoring repeated version message");
                }
            }
            IncomingMessage::Result(result) => {
                tracing::debug!("dispatch: result id={}", result.message_id);
                self.pending.complete(result);
            }
            IncomingMessage::Event(event) => {
                self.config.event_handler.on_event(event);
            }
            IncomingMessage::Unknown => {
                tracing::warn!("dispatch: unknown message type");
            }
        }
    }

    /// Sends a request and waits for its reply.
    ///
    /// An empty message id is replaced with a fresh UUID. Resolves with the
    /// `result` payload, or fails with the server's error code. A request
    /// already sent when the socket closes never settles; wrap it in a
    /// timeout if that matters.
    pub async fn request(&self, mut request: Request) -> Result<Value, ClientError> {
        if !request.has_message_id() {
            request.message_id = Uuid::new_v4().to_string();
        }
        let id = request.message_id.clone();

        let encoded = Encoder::encode_request(&request)?;
        let rx = self.pending.register(&id)?;

        if let Err(e) = self.write(encoded).await {
            self.pending.cancel(&id);
            return Err(e);
        }
        tracing::debug!(
            "Request id={} command={} sent, waiting for result...",
            id,
            request.command.name()
        );

        match rx.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(failure)) => {
                tracing::debug!("Request id={} failed: {}", id, failure);
                Err(ClientError::Server(failure))
            }
            // Entries leave the table only when answered or cancelled above,
            // so a request on a dead socket waits here until dropped.
            Err(_) => std::future::pending().await,
        }
    }

    async fn write(&self, text: String) -> Result<(), ClientError> {
        let mut writer_guard = self.writer.lock().await;
        let writer = writer_guard.as_mut().ok_or(ClientError::NotConnected)?;
        writer.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Waits for the server's version message.
    pub async fn version(&self) -> VersionInfo {
        self.version.wait().await
    }

    /// Returns the version message if it has arrived.
    pub fn version_now(&self) -> Option<VersionInfo> {
        self.version.get()
    }

    /// Waits for the handshake to finish.
    pub async fn ready(&self) -> Result<(), ClientError> {
        self.ready.wait().await.map_err(ClientError::Handshake)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.ready.get(), Some(Ok(())))
    }

    /// Returns whether the socket is open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns the number of pending requests.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

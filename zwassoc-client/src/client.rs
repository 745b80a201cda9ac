//! High-level client API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use crate::node::Node;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use zwassoc_protocol::{CcApiMethod, Command, NodeId, Request, VersionInfo};

/// Reply payload of `endpoint.supports_cc_api`.
#[derive(Debug, Deserialize)]
struct SupportsCcApiResult {
    #[serde(default)]
    supported: bool,
}

/// High-level client for zwave-js-server.
///
/// Construct one per process with [`Client::connect`] and pass it by
/// reference to whatever needs it. Dropping the client stops its connection.
pub struct Client {
    conn: Arc<Connection>,
    driver: JoinHandle<()>,
}

impl Client {
    /// Starts connecting in the background and returns immediately.
    ///
    /// Must be called from within a Tokio runtime. Await [`Client::ready`]
    /// before issuing node requests.
    pub fn connect(config: ConnectionConfig) -> Self {
        let conn = Arc::new(Connection::new(config));
        let driver = tokio::spawn(conn.clone().run());
        Self { conn, driver }
    }

    /// Waits for the server's version message.
    pub async fn version(&self) -> VersionInfo {
        self.conn.version().await
    }

    /// Waits until the schema/listen handshake has completed.
    pub async fn ready(&self) -> Result<(), ClientError> {
        self.conn.ready().await
    }

    /// Returns whether the socket is open.
    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> Arc<Connection> {
        self.conn.clone()
    }

    /// Returns the number of requests still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.conn.pending_count()
    }

    /// Sends an arbitrary request and returns its `result` payload.
    pub async fn send(&self, request: Request) -> Result<Value, ClientError> {
        self.conn.request(request).await
    }

    // =========================================================================
    // Command class API
    // =========================================================================

    /// Asks whether `node_id` exposes an API for `command_class`.
    pub async fn supports_cc_api(
        &self,
        node_id: NodeId,
        command_class: impl Into<u8>,
    ) -> Result<bool, ClientError> {
        let command = Command::SupportsCcApi {
            node_id,
            command_class: command_class.into(),
        };
        let result = self.send(Request::new(command)).await?;
        let reply: Option<SupportsCcApiResult> = serde_json::from_value(result)?;
        Ok(reply.map_or(false, |r| r.supported))
    }

    /// Invokes a typed command class method and decodes its response.
    pub async fn invoke<M: CcApiMethod>(
        &self,
        node_id: NodeId,
        method: &M,
    ) -> Result<M::Output, ClientError> {
        let response = self.invoke_command(method.to_command(node_id)).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Invokes any command class method by id and name. The response is
    /// returned as-is; `Value::Null` when the server sent none.
    pub async fn invoke_cc_api_raw(
        &self,
        node_id: NodeId,
        command_class: impl Into<u8>,
        method_name: &str,
        args: Vec<Value>,
    ) -> Result<Value, ClientError> {
        self.invoke_command(Command::InvokeCcApi {
            node_id,
            command_class: command_class.into(),
            method_name: method_name.to_string(),
            args,
        })
        .await
    }

    async fn invoke_command(&self, command: Command) -> Result<Value, ClientError> {
        let result = self.send(Request::new(command)).await?;
        Ok(take_response(result))
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Returns a handle for node `node_id`. No request is made.
    pub fn node(&self, node_id: NodeId) -> Node<'_> {
        Node::new(self, node_id)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Extracts the `response` field of an invoke result.
fn take_response(result: Value) -> Value {
    match result {
        Value::Object(mut fields) => fields.remove("response").unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_take_response() {
        assert_eq!(take_response(json!({"response": 3})), json!(3));
        assert_eq!(take_response(json!({})), Value::Null);
        assert_eq!(take_response(Value::Null), Value::Null);
    }

    #[tokio::test]
    async fn test_client_creation() {
        // Nothing listens on port 9; the driver logs the failure and exits.
        let client = Client::connect(ConnectionConfig::new("ws://127.0.0.1:9"));
        assert!(!client.is_connected());
        assert_eq!(client.pending_count(), 0);
        assert_eq!(client.node(5).id(), 5);
    }
}

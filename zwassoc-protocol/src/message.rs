//! JSON message types for zwave-js-server requests and replies.

use crate::cc::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Commands understood by the server.
///
/// Only the subset this tool needs is modelled. Each variant serializes with
/// its wire name in the `command` field and its parameters alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command")]
pub enum Command {
    #[serde(rename = "set_api_schema", rename_all = "camelCase")]
    SetApiSchema { schema_version: u32 },

    #[serde(rename = "start_listening")]
    StartListening,

    #[serde(rename = "endpoint.supports_cc_api", rename_all = "camelCase")]
    SupportsCcApi { node_id: NodeId, command_class: u8 },

    #[serde(rename = "endpoint.invoke_cc_api", rename_all = "camelCase")]
    InvokeCcApi {
        node_id: NodeId,
        command_class: u8,
        method_name: String,
        args: Vec<Value>,
    },
}

impl Command {
    /// Returns the wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetApiSchema { .. } => "set_api_schema",
            Command::StartListening => "start_listening",
            Command::SupportsCcApi { .. } => "endpoint.supports_cc_api",
            Command::InvokeCcApi { .. } => "endpoint.invoke_cc_api",
        }
    }
}

/// Request message envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// Correlation id. Empty means "let the client pick one".
    #[serde(rename = "messageId")]
    pub message_id: String,

    /// Command and its parameters, flattened into the envelope.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    pub fn new(command: Command) -> Self {
        Self {
            message_id: String::new(),
            command,
        }
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = id.into();
        self
    }

    /// Returns whether a correlation id has been assigned.
    pub fn has_message_id(&self) -> bool {
        !self.message_id.is_empty()
    }
}

/// Server and driver identification, sent once right after the socket opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub server_version: String,
    pub driver_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_schema_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_schema_version: Option<u32>,
}

impl VersionInfo {
    /// Returns false only when the server advertises a schema range that
    /// excludes `schema`. Servers that omit the range are assumed compatible.
    pub fn supports_schema(&self, schema: u32) -> bool {
        let above_min = self.min_schema_version.map_or(true, |min| schema >= min);
        let below_max = self.max_schema_version.map_or(true, |max| schema <= max);
        above_min && below_max
    }
}

/// Unsolicited notification. The payload is not interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub event: Value,
}

/// Reply to a previously sent request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMessage {
    pub message_id: String,
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub zwave_error_code: Option<i64>,
}

impl ResultMessage {
    /// Splits the reply into its success payload or failure details.
    ///
    /// A successful reply without a `result` field yields `Value::Null`.
    pub fn into_outcome(self) -> Result<Value, ServerFailure> {
        if self.success {
            Ok(self.result.unwrap_or(Value::Null))
        } else {
            Err(ServerFailure {
                error_code: self.error_code.unwrap_or_else(|| "unknown_error".to_string()),
                message: self.message,
                zwave_error_code: self.zwave_error_code,
            })
        }
    }
}

/// Failure details carried by a `success: false` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFailure {
    pub error_code: String,
    pub message: Option<String>,
    pub zwave_error_code: Option<i64>,
}

impl fmt::Display for ServerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_code)?;
        if let Some(code) = self.zwave_error_code {
            write!(f, " (zwave error {})", code)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Any message the server may send, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IncomingMessage {
    Version(VersionInfo),
    Event(EventMessage),
    Result(ResultMessage),
    /// Message types this client does not know about.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_request_serialization() {
        let req = Request::new(Command::SetApiSchema { schema_version: 5 }).with_message_id("a");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({"messageId": "a", "command": "set_api_schema", "schemaVersion": 5})
        );
    }

    #[test]
    fn test_start_listening_has_no_params() {
        let req = Request::new(Command::StartListening).with_message_id("b");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"messageId": "b", "command": "start_listening"}));
    }

    #[test]
    fn test_invoke_request_serialization() {
        let req = Request::new(Command::InvokeCcApi {
            node_id: 5,
            command_class: 0x85,
            method_name: "getGroup".to_string(),
            args: vec![json!(1)],
        });
        assert!(!req.has_message_id());

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["command"], "endpoint.invoke_cc_api");
        assert_eq!(value["nodeId"], 5);
        assert_eq!(value["commandClass"], 133);
        assert_eq!(value["methodName"], "getGroup");
        assert_eq!(value["args"], json!([1]));
        assert_eq!(value["messageId"], "");
    }

    #[test]
    fn test_command_names() {
        let cmd = Command::SupportsCcApi {
            node_id: 2,
            command_class: 0x59,
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["command"], cmd.name());
        assert_eq!(Command::StartListening.name(), "start_listening");
    }

    #[test]
    fn test_version_deserialization() {
        let msg: IncomingMessage = serde_json::from_value(json!({
            "type": "version",
            "serverVersion": "1.2.3",
            "driverVersion": "9.0.0",
            "homeId": 123
        }))
        .unwrap();

        assert_eq!(
            msg,
            IncomingMessage::Version(VersionInfo {
                server_version: "1.2.3".to_string(),
                driver_version: "9.0.0".to_string(),
                home_id: Some(123),
                min_schema_version: None,
                max_schema_version: None,
            })
        );
    }

    #[test]
    fn test_schema_range() {
        let mut info = VersionInfo {
            server_version: "1".to_string(),
            driver_version: "1".to_string(),
            home_id: None,
            min_schema_version: None,
            max_schema_version: None,
        };
        assert!(info.supports_schema(5));

        info.min_schema_version = Some(0);
        info.max_schema_version = Some(4);
        assert!(!info.supports_schema(5));

        info.max_schema_version = Some(35);
        assert!(info.supports_schema(5));
    }

    #[test]
    fn test_result_outcome() {
        let ok: ResultMessage = serde_json::from_value(json!({
            "type": "result",
            "messageId": "x",
            "success": true,
            "result": {"response": 3}
        }))
        .unwrap();
        assert_eq!(ok.into_outcome().unwrap(), json!({"response": 3}));

        let empty: ResultMessage =
            serde_json::from_value(json!({"messageId": "y", "success": true})).unwrap();
        assert_eq!(empty.into_outcome().unwrap(), Value::Null);

        let failed: ResultMessage = serde_json::from_value(json!({
            "messageId": "z",
            "success": false,
            "errorCode": "zwave_error",
            "zwaveErrorCode": 204,
            "message": "node timed out"
        }))
        .unwrap();
        let failure = failed.into_outcome().unwrap_err();
        assert_eq!(failure.error_code, "zwave_error");
        assert_eq!(failure.zwave_error_code, Some(204));
        assert_eq!(
            failure.to_string(),
            "zwave_error (zwave error 204): node timed out"
        );
    }

    #[test]
    fn test_unknown_type_is_tolerated() {
        let msg: IncomingMessage =
            serde_json::from_value(json!({"type": "heartbeat", "at": 1})).unwrap();
        assert_eq!(msg, IncomingMessage::Unknown);
    }

    #[test]
    fn test_event_payload_is_opaque() {
        let msg: IncomingMessage = serde_json::from_value(json!({
            "type": "event",
            "event": {"source": "node", "event": "wake up", "nodeId": 7}
        }))
        .unwrap();
        match msg {
            IncomingMessage::Event(event) => assert_eq!(event.event["nodeId"], 7),
            other => panic!("expected event, got {:?}", other),
        }
    }
}

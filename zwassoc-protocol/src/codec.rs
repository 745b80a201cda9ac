//! Text codec for WebSocket frames.
//!
//! Every frame carries exactly one JSON document, so there is no framing
//! state to keep between calls.

use crate::error::ProtocolError;
use crate::message::{IncomingMessage, Request};

/// Encodes outgoing requests.
pub struct Encoder;

impl Encoder {
    /// Serializes a request into the text of one frame.
    pub fn encode_request(request: &Request) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(request)?)
    }
}

/// Decodes incoming server messages.
pub struct Decoder;

impl Decoder {
    /// Parses the text of one frame.
    pub fn decode(text: &str) -> Result<IncomingMessage, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses a binary frame, which must hold UTF-8 JSON.
    pub fn decode_bytes(bytes: &[u8]) -> Result<IncomingMessage, ProtocolError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
        Self::decode(text)
    }
}

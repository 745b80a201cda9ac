//! Client error types.

use std::sync::Arc;
use thiserror::Error;
use zwassoc_protocol::{ProtocolError, ServerFailure};

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("not connected")]
    NotConnected,

    #[error("message id already pending: {0}")]
    DuplicateMessageId(String),

    #[error("server error: {0}")]
    Server(ServerFailure),

    #[error("handshake failed: {0}")]
    Handshake(#[source] Arc<ClientError>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns the server's `errorCode` if this error came from a failed reply.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ClientError::Server(failure) => Some(&failure.error_code),
            ClientError::Handshake(inner) => inner.error_code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: &str) -> ServerFailure {
        ServerFailure {
            error_code: code.to_string(),
            message: None,
            zwave_error_code: None,
        }
    }

    #[test]
    fn test_error_code() {
        let err = ClientError::Server(failure("Controller_NotFound"));
        assert_eq!(err.error_code(), Some("Controller_NotFound"));
        assert_eq!(err.to_string(), "server error: Controller_NotFound");

        let inner = ClientError::Server(failure("schema_incompatible"));
        let err = ClientError::Handshake(Arc::new(inner));
        assert_eq!(err.error_code(), Some("schema_incompatible"));
        assert!(err.to_string().starts_with("handshake failed"));

        assert_eq!(ClientError::NotConnected.error_code(), None);
    }
}

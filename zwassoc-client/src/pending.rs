//! Table of requests waiting for a `result` message.

use crate::error::ClientError;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::oneshot;
use zwassoc_protocol::{ResultMessage, ServerFailure};

/// Outcome delivered to a waiting request.
pub type Reply = Result<Value, ServerFailure>;

/// Pending requests keyed by message id.
///
/// Entries are removed exactly once, when their reply arrives, so a request
/// can never be resolved twice.
#[derive(Debug, Default)]
pub struct PendingRequests {
    waiting: Mutex<HashMap<String, oneshot::Sender<Reply>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request and returns the receiver for its reply.
    pub fn register(&self, id: &str) -> Result<oneshot::Receiver<Reply>, ClientError> {
        let mut waiting = self.waiting.lock();
        if waiting.contains_key(id) {
            return Err(ClientError::DuplicateMessageId(id.to_string()));
        }
        let (tx, rx) = oneshot::channel();
        waiting.insert(id.to_string(), tx);
        Ok(rx)
    }

    /// Drops a registration whose request never made it onto the wire.
    pub fn cancel(&self, id: &str) {
        self.waiting.lock().remove(id);
    }

    /// Delivers a reply. Returns false when no request was waiting for it.
    pub fn complete(&self, result: ResultMessage) -> bool {
        let Some(tx) = self.waiting.lock().remove(&result.message_id) else {
            tracing::debug!("no pending request for id={}", result.message_id);
            return false;
        };
        let id = result.message_id.clone();
        if tx.send(result.into_outcome()).is_err() {
            tracing::debug!("request id={} was abandoned before its reply", id);
        }
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.waiting.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.waiting.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.lock().is_empty()
    }
}

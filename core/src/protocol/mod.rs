//! Request/response boundary of the memory store
//!
//! Callers send a [`MemoryRequest`] (or raw JSON) and get back an
//! [`OperationResult`] carrying both a human-readable rendering and the
//! structured outcome. Transports (stdio, WebSocket) wrap these in
//! [`MessageEnvelope`]s.

pub mod descriptor;
pub mod render;
pub mod request;
pub mod wire;

pub use descriptor::{operation_descriptors, OperationDescriptor};
pub use render::Render;
pub use request::MemoryRequest;
pub use wire::{
    ClientInfo, ClientMessage, MessageEnvelope, ServerEvent, ServerInfo, PROTOCOL_VERSION,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{MemoryError, Result};
use crate::memory::MemoryStore;

/// Result of one operation as seen by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationResult {
    Success {
        /// Human-readable rendering
        output: String,
        /// The outcome as JSON
        structured: Option<Value>,
    },
    Error {
        message: String,
        code: String,
        retryable: bool,
    },
}

impl OperationResult {
    pub fn from_error(err: &MemoryError) -> Self {
        Self::Error {
            message: err.user_message(),
            code: err.code().to_string(),
            retryable: err.is_retryable(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Outcome status such as `"pending_confirmation"`, when the outcome has one
    pub fn status(&self) -> Option<&str> {
        match self {
            Self::Success {
                structured: Some(value),
                ..
            } => value.get("status").and_then(Value::as_str),
            _ => None,
        }
    }
}

fn respond<T: Serialize + Render>(outcome: T) -> Result<OperationResult> {
    let structured = serde_json::to_value(&outcome)?;
    Ok(OperationResult::Success {
        output: outcome.render(),
        structured: Some(structured),
    })
}

#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, request: MemoryRequest) -> OperationResult;

    /// Parse and dispatch; parse failures come back as error results.
    async fn handle_value(&self, raw: Value) -> OperationResult {
        match MemoryRequest::from_value(raw) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                debug!("Rejected request: {}", err);
                OperationResult::from_error(&err)
            }
        }
    }
}

#[async_trait]
impl RequestHandler for MemoryStore {
    async fn handle(&self, request: MemoryRequest) -> OperationResult {
        let operation = request.operation();
        debug!("Handling {} request", operation);

        let result = match request {
            MemoryRequest::Read(params) => self.read(params).await.and_then(respond),
            MemoryRequest::Write(params) => self.write(params).await.and_then(respond),
            MemoryRequest::Search(params) => self.search(params).await.and_then(respond),
            MemoryRequest::List(params) => self.list(params).await.and_then(respond),
            MemoryRequest::Delete(params) => self.delete(params).await.and_then(respond),
            MemoryRequest::Prune(params) => self.prune(params).await.and_then(respond),
        };

        result.unwrap_or_else(|err| {
            warn!("{} failed: {}", operation, err);
            OperationResult::from_error(&err)
        })
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{OperationDescriptor, OperationResult};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageEnvelope<T> {
    pub v: u32,
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub request_id: Option<Uuid>,
    #[serde(default)]
    pub event_id: Option<u64>,
    pub payload: T,
}

impl<T> MessageEnvelope<T> {
    pub fn event(payload: T, request_id: Option<Uuid>, event_id: u64) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            msg_type: "event".to_string(),
            request_id,
            event_id: Some(event_id),
            payload,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Hello {
        client: ClientInfo,
    },
    ListOperations,
    /// `request` is parsed with [`super::MemoryRequest::from_value`] so a
    /// malformed call still gets a per-request error back.
    Call {
        request: Value,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    HelloAck {
        server: ServerInfo,
        operations: Vec<&'static str>,
    },
    Operations {
        operations: Vec<OperationDescriptor>,
    },
    Result {
        result: OperationResult,
    },
    Error {
        code: String,
        message: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

//! JSON-RPC envelope data model
//!
//! Outbound calls are plain JSON objects; when a credential session exists an
//! additional `auth` object is merged into the envelope before serialization.
//! Inbound frames carry either a `result` object or an `error` object whose
//! `code` and `message` fields drive the authentication upgrade.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RpcError, RpcResult};

/// Outbound RPC call envelope.
///
/// One envelope is built per connection manager and reused for every poll;
/// only the `auth` fragment changes over the lifetime of a session.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub id: u64,
    pub src: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Value>,
}

impl RpcRequest {
    /// Create a new request envelope for the given RPC method.
    pub fn new(method: &str) -> Self {
        Self {
            id: 1,
            src: "shellyrpc".to_string(),
            method: method.to_string(),
            params: None,
            auth: None,
        }
    }

    /// Set the `params` object of the call.
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Set the `src` identifier reported to the device.
    pub fn with_src(mut self, src: &str) -> Self {
        self.src = src.to_string();
        self
    }

    /// Serialize the envelope to its wire form.
    pub fn serialize(&self) -> RpcResult<String> {
        serde_json::to_string(self)
            .map_err(|e| RpcError::InvalidData(format!("Failed to encode request: {}", e)))
    }
}

/// Inbound response envelope.
///
/// Deserialization is lenient: every field is optional so that partial or
/// vendor-extended responses still parse. Frames that are not JSON at all are
/// handled upstream and never reach this type.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<ErrorObject>,
}

impl RpcResponse {
    /// Try to parse a raw text frame as a response envelope.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// In-band error object of a response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorObject {
    pub code: Option<i64>,
    pub message: Option<String>,
}

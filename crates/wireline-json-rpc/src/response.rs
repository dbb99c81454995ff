use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub result: Value,
}

impl RpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            result,
        }
    }
}

/// An error JSON-RPC response envelope.
///
/// `id` is `None` only when the request was too malformed to carry one;
/// it then serializes as `null`, per JSON-RPC convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: Option<RequestId>,
    pub error: RpcError,
}

impl ErrorResponse {
    pub fn new(id: Option<RequestId>, error: RpcError) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            error: error.normalized(),
        }
    }
}

/// Either a success or an error envelope. Exactly one of `result`/`error`
/// is present on the wire, never both and never neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcMessage {
    Response(RpcResponse),
    Error(ErrorResponse),
}

impl RpcMessage {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Response(RpcResponse::new(id, result))
    }

    pub fn error(id: Option<RequestId>, error: RpcError) -> Self {
        Self::Error(ErrorResponse::new(id, error))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RpcMessage::Error(_))
    }

    /// The echoed request id, if the envelope carries one.
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            RpcMessage::Response(resp) => Some(&resp.id),
            RpcMessage::Error(err) => err.id.as_ref(),
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            RpcMessage::Response(resp) => Some(&resp.result),
            RpcMessage::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&RpcError> {
        match self {
            RpcMessage::Response(_) => None,
            RpcMessage::Error(err) => Some(&err.error),
        }
    }
}

/// Convert a pipeline outcome into the single response envelope.
pub fn serialize(id: RequestId, outcome: Result<Value, RpcError>) -> RpcMessage {
    match outcome {
        Ok(result) => RpcMessage::success(id, result),
        Err(error) => RpcMessage::error(Some(id), error),
    }
}

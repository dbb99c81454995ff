use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{JsonRpcVersion, RequestId};

/// A JSON-RPC request envelope.
///
/// The `jsonrpc` tag is optional on inbound requests (clients of this wire
/// format commonly omit it) but is validated as `"2.0"` when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(
        rename = "jsonrpc",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<JsonRpcVersion>,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            version: Some(JsonRpcVersion::V2_0),
            id,
            method: method.into(),
            params,
        }
    }

    /// Create a request with no parameters.
    pub fn new_no_params(id: RequestId, method: impl Into<String>) -> Self {
        Self::new(id, method, None)
    }

    /// Get a named parameter, if params are an object.
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_without_version_tag() {
        let request: RpcRequest =
            serde_json::from_str(r#"{"id":"1","method":"echo","params":{"test":"x"}}"#).unwrap();

        assert_eq!(request.id, RequestId::String("1".to_string()));
        assert_eq!(request.method, "echo");
        assert_eq!(request.get_param("test"), Some(&json!("x")));
        assert!(request.version.is_none());
    }

    #[test]
    fn parses_with_version_tag() {
        let request: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":3,"method":"status"}"#).unwrap();

        assert_eq!(request.version, Some(JsonRpcVersion::V2_0));
        assert_eq!(request.id, RequestId::Number(3));
        assert!(request.params.is_none());
    }

    #[test]
    fn rejects_unknown_version() {
        let result =
            serde_json::from_str::<RpcRequest>(r#"{"jsonrpc":"1.0","id":"1","method":"echo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn serialization_round_trip() {
        let request = RpcRequest::new_no_params(RequestId::from("r"), "ping");
        let json = serde_json::to_string(&request).unwrap();
        let parsed: RpcRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.method, "ping");
        assert!(parsed.params.is_none());
    }
}

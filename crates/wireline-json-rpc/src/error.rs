use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error codes used by this wire format.
///
/// Unlike classic JSON-RPC reserved codes, this protocol uses HTTP-flavored
/// codes on the envelope; the HTTP status itself stays 200 for all of them.
pub mod codes {
    /// Body failed to parse as a request envelope.
    pub const INVALID_REQUEST: i64 = 400;
    /// A guard denied the request.
    pub const DENIED: i64 = 403;
    /// Method absent from the registry.
    pub const METHOD_NOT_FOUND: i64 = 404;
    /// Any failure without an explicit code.
    pub const INTERNAL: i64 = 500;
}

/// A coded JSON-RPC error: `{code, message, data?}`.
///
/// Handlers and pipeline stages fail with this type; whatever they raise is
/// serialized as-is into the response envelope. Only `message` and `data`
/// ever reach the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("JSON-RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to the error.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    /// Guard denial. 403 is this crate's documented default; guards that
    /// need a different code fail with an explicit `RpcError` instead.
    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(codes::DENIED, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, message)
    }

    /// Apply the default code. A source error that never set a code
    /// (`code == 0`) becomes an internal error.
    pub fn normalized(mut self) -> Self {
        if self.code == 0 {
            self.code = codes::INTERNAL;
        }
        self
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_not_found_shape() {
        let err = RpcError::method_not_found("missing");
        assert_eq!(err.code, 404);
        assert_eq!(err.message, "Method not found: missing");
        assert!(err.data.is_none());
    }

    #[test]
    fn zero_code_normalizes_to_internal() {
        let err = RpcError::new(0, "boom").normalized();
        assert_eq!(err.code, 500);

        let err = RpcError::new(422, "bad params").normalized();
        assert_eq!(err.code, 422);
    }

    #[test]
    fn data_omitted_when_absent() {
        let json = serde_json::to_string(&RpcError::denied("Access denied")).unwrap();
        assert!(!json.contains("data"));

        let json = serde_json::to_string(
            &RpcError::new(403, "RPC EXCEPTION").with_data(json!({"fromService": "Test Service"})),
        )
        .unwrap();
        assert!(json.contains(r#""fromService":"Test Service""#));
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = RpcError::internal("broken pipe");
        assert_eq!(err.to_string(), "JSON-RPC error 500: broken pipe");
    }
}

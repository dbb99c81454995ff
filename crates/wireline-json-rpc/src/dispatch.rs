//! The core dispatch loop: parse → lookup → pipeline → serialize.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::context::RequestContext;
use crate::error::RpcError;
use crate::pipeline;
use crate::registry::MethodRegistry;
use crate::request::RpcRequest;
use crate::response::{RpcMessage, serialize};

/// Dispatches request envelopes against a frozen [`MethodRegistry`].
///
/// Every invocation produces exactly one response envelope; no failure of
/// any kind — malformed body, unknown method, stage error, handler error,
/// handler panic — escapes this boundary. Dispatches are independent and
/// may run concurrently; the only shared state is the read-only registry.
pub struct RequestDispatcher {
    registry: Arc<MethodRegistry>,
}

impl RequestDispatcher {
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self { registry }
    }

    /// Parse a raw body into a request envelope.
    pub fn parse_request(body: &[u8]) -> Result<RpcRequest, RpcError> {
        serde_json::from_slice(body)
            .map_err(|err| RpcError::invalid_request(format!("Invalid request: {}", err)))
    }

    /// Dispatch a raw request body, returning the single response envelope.
    pub async fn dispatch(&self, body: &[u8], ctx: RequestContext) -> RpcMessage {
        let request = match Self::parse_request(body) {
            Ok(request) => request,
            Err(err) => {
                warn!("request body failed to parse: {}", err.message);
                return RpcMessage::error(None, err);
            }
        };
        self.dispatch_request(request, ctx).await
    }

    /// Dispatch an already-parsed request envelope.
    pub async fn dispatch_request(&self, request: RpcRequest, ctx: RequestContext) -> RpcMessage {
        let Some(descriptor) = self.registry.lookup(&request.method) else {
            debug!(method = %request.method, "method not found");
            return RpcMessage::error(
                Some(request.id),
                RpcError::method_not_found(&request.method),
            );
        };

        debug!(method = %request.method, "dispatching request");
        let params = request.params.unwrap_or(Value::Null);

        let outcome = AssertUnwindSafe(pipeline::execute(descriptor, params, &ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let message = panic_message(panic);
                error!(method = %request.method, panic = %message, "handler panicked");
                Err(RpcError::internal(message))
            });

        serialize(request.id, outcome)
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

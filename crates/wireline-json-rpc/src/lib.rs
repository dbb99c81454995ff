//! # JSON-RPC dispatch core
//!
//! Transport-agnostic JSON-RPC server core: envelope types, a frozen method
//! registry, a per-method execution pipeline (pipes → guards → interceptors
//! → handler), and the dispatcher that drives them. No transport code lives
//! here; an HTTP front end is provided by `wireline-http-server`.
//!
//! ## Features
//! - One response envelope per request, always well-formed
//! - Exact-string method lookup against a registry frozen before serving
//! - Configurable per-method pipelines with short-circuit semantics
//! - Async handlers throughout; no cross-request shared state

pub mod context;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod request;
pub mod response;
pub mod types;

pub use context::RequestContext;
pub use dispatch::RequestDispatcher;
pub use error::{RpcError, codes};
pub use pipeline::{Guard, Handler, Interceptor, Next, Pipe, execute, handler_fn, per_request};
pub use registry::{HandlerDescriptor, MethodRegistry, MethodRegistryBuilder};
pub use request::RpcRequest;
pub use response::{ErrorResponse, RpcMessage, RpcResponse, serialize};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC protocol version constant.
pub const JSONRPC_VERSION: &str = "2.0";

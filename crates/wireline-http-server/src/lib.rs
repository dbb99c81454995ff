//! # HTTP transport for wireline JSON-RPC
//!
//! Serves the `wireline-json-rpc` dispatch core over HTTP POST, in two
//! lifecycle modes:
//!
//! - **Hybrid**: the RPC endpoint is mounted on an externally owned
//!   listener via [`HostAdapter`]; the host keeps ownership of the socket.
//! - **Standalone**: the server binds and owns its own listener, and
//!   drains in-flight connections on `close()`.
//!
//! Success and protocol errors are both delivered with HTTP status 200;
//! only the envelope shape signals the outcome. HTTP-level statuses are
//! reserved for transport misuse (wrong path, method, content type, size).

pub mod adapter;
pub mod config;
pub mod server;
pub mod service;

pub use adapter::HostAdapter;
pub use config::{DEFAULT_MAX_BODY_SIZE, ServerMode, ServerOptions};
pub use server::RpcServer;
pub use service::RpcService;

// Re-export foundational types so most servers only need this crate.
pub use wireline_json_rpc::{
    HandlerDescriptor, MethodRegistry, MethodRegistryBuilder, RequestContext, RequestDispatcher,
    RpcError, RpcMessage, handler_fn, per_request,
};

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Transport-level errors. Protocol failures never surface here; they are
/// serialized into response envelopes by the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid server state: {0}")]
    InvalidState(&'static str),
}

use std::fmt;
use std::sync::Arc;

use crate::adapter::HostAdapter;

/// Default cap on request body size (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// How the server obtains its listener.
#[derive(Clone)]
pub enum ServerMode {
    /// Attach to an externally owned listener; the host keeps the socket.
    Hybrid { adapter: Arc<dyn HostAdapter> },
    /// Create and own a listener bound to `port` (and `hostname`, default
    /// 127.0.0.1).
    Standalone {
        port: u16,
        hostname: Option<String>,
    },
}

impl fmt::Debug for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMode::Hybrid { .. } => f.write_str("Hybrid"),
            ServerMode::Standalone { port, hostname } => f
                .debug_struct("Standalone")
                .field("port", port)
                .field("hostname", hostname)
                .finish(),
        }
    }
}

/// Construction-time server configuration: the mount path plus exactly one
/// serving mode. Immutable for the server's lifetime.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub path: String,
    pub mode: ServerMode,
    pub max_body_size: usize,
}

impl ServerOptions {
    pub fn hybrid(path: impl Into<String>, adapter: Arc<dyn HostAdapter>) -> Self {
        Self {
            path: path.into(),
            mode: ServerMode::Hybrid { adapter },
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn standalone(path: impl Into<String>, port: u16) -> Self {
        Self {
            path: path.into(),
            mode: ServerMode::Standalone {
                port,
                hostname: None,
            },
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Set the bind hostname (standalone mode only; ignored for hybrid).
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        if let ServerMode::Standalone { hostname: h, .. } = &mut self.mode {
            *h = Some(hostname.into());
        }
        self
    }

    /// Cap the accepted request body size.
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }
}

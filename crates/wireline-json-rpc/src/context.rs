use std::collections::HashMap;
use std::sync::Arc;

/// Per-request view of transport metadata (e.g. HTTP headers).
///
/// Created by the transport for each inbound request and discarded once the
/// response is written; never shared across requests. Cloning is cheap (the
/// metadata map is shared), so handlers and stages can hold their own copy
/// for the lifetime of the call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    metadata: Arc<HashMap<String, String>>,
}

impl RequestContext {
    /// An empty context, for transports without metadata and for tests.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_metadata(metadata: HashMap<String, String>) -> Self {
        Self {
            metadata: Arc::new(metadata),
        }
    }

    /// Look up a metadata entry by key. For HTTP transports keys are
    /// lowercased header names.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

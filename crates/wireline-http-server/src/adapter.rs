use crate::service::RpcService;

/// An externally owned HTTP listener the server can attach to (hybrid mode).
///
/// The host keeps full ownership of the socket lifecycle: `listen()` only
/// mounts the service, and `close()` on a hybrid server is a no-op. The
/// adapter must route POST requests arriving at `path` into
/// [`RpcService::call`] with a JSON body.
pub trait HostAdapter: Send + Sync {
    /// Attach `service` at `path`. Called exactly once, from `listen()`.
    fn mount(&self, path: &str, service: RpcService);
}

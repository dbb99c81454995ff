//! Serving lifecycle: hybrid mount or standalone listener ownership.

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, error, info};

use wireline_json_rpc::{MethodRegistry, RequestDispatcher};

use crate::config::{ServerMode, ServerOptions};
use crate::service::RpcService;
use crate::{Result, ServerError};

/// Lifecycle controller for the RPC endpoint.
///
/// States: Created → Bound (hybrid) or Created → Listening → Closed
/// (standalone). The registry must be fully populated before `listen()`;
/// it is frozen for the server's lifetime.
pub struct RpcServer {
    options: ServerOptions,
    service: RpcService,
    state: Mutex<ServerState>,
}

enum ServerState {
    Created,
    /// Hybrid: mounted on the host's listener, which owns the socket.
    Bound,
    /// Standalone: accept loop running.
    Listening {
        local_addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        drained: oneshot::Receiver<()>,
    },
    Closed,
}

impl RpcServer {
    pub fn new(options: ServerOptions, registry: Arc<MethodRegistry>) -> Self {
        let dispatcher = Arc::new(RequestDispatcher::new(registry));
        let service = RpcService::new(options.path.clone(), options.max_body_size, dispatcher);
        Self {
            options,
            service,
            state: Mutex::new(ServerState::Created),
        }
    }

    /// The request service, for hosts that want to drive it directly.
    pub fn service(&self) -> RpcService {
        self.service.clone()
    }

    /// Start serving.
    ///
    /// Hybrid mode mounts the service on the host adapter and completes
    /// immediately; no socket is owned. Standalone mode binds the
    /// configured address and completes once bound, with the accept loop
    /// running in the background.
    pub async fn listen(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !matches!(*state, ServerState::Created) {
            return Err(ServerError::InvalidState("listen() already called"));
        }

        match &self.options.mode {
            ServerMode::Hybrid { adapter } => {
                adapter.mount(&self.options.path, self.service.clone());
                info!(path = %self.options.path, "RPC endpoint mounted on host listener");
                *state = ServerState::Bound;
                Ok(())
            }
            ServerMode::Standalone { port, hostname } => {
                let host = hostname.as_deref().unwrap_or("127.0.0.1");
                let listener = TcpListener::bind((host, *port)).await?;
                let local_addr = listener.local_addr()?;
                info!(%local_addr, path = %self.options.path, "RPC server listening");

                let (shutdown_tx, shutdown_rx) = oneshot::channel();
                let (drained_tx, drained_rx) = oneshot::channel();
                tokio::spawn(accept_loop(
                    listener,
                    self.service.clone(),
                    shutdown_rx,
                    drained_tx,
                ));

                *state = ServerState::Listening {
                    local_addr,
                    shutdown: shutdown_tx,
                    drained: drained_rx,
                };
                Ok(())
            }
        }
    }

    /// Stop serving.
    ///
    /// Standalone mode stops accepting connections and waits for in-flight
    /// connections to drain. Hybrid mode is a no-op (the host owns the
    /// listener). Safe to call without a prior `listen()` and safe to call
    /// repeatedly.
    pub async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, ServerState::Closed) {
            ServerState::Listening {
                shutdown, drained, ..
            } => {
                // The accept loop may already be gone; draining still
                // completes either way.
                let _ = shutdown.send(());
                let _ = drained.await;
                info!("RPC server closed");
                Ok(())
            }
            ServerState::Bound => {
                *state = ServerState::Bound;
                Ok(())
            }
            ServerState::Created | ServerState::Closed => Ok(()),
        }
    }

    /// The bound address while listening (standalone mode only).
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state.lock().await {
            ServerState::Listening { local_addr, .. } => Some(*local_addr),
            _ => None,
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    service: RpcService,
    mut shutdown: oneshot::Receiver<()>,
    drained: oneshot::Sender<()>,
) {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => {
                let (stream, peer_addr) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        error!("accept error: {}", err);
                        continue;
                    }
                };
                debug!(%peer_addr, "new connection");

                let io = TokioIo::new(stream);
                let svc = service.clone();
                let conn = http1::Builder::new().serve_connection(
                    io,
                    service_fn(move |req| {
                        let svc = svc.clone();
                        async move {
                            Ok::<_, std::convert::Infallible>(svc.call(req).await)
                        }
                    }),
                );
                let conn = graceful.watch(conn);

                tokio::spawn(async move {
                    if let Err(err) = conn.await {
                        let msg = err.to_string();
                        if msg.contains("connection closed before message completed") {
                            debug!("client disconnected: {}", msg);
                        } else {
                            error!("error serving connection: {}", msg);
                        }
                    }
                });
            }
        }
    }

    // Stop accepting, then wait for in-flight connections to finish.
    drop(listener);
    graceful.shutdown().await;
    let _ = drained.send(());
}

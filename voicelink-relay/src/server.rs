use crate::room::RoomRegistry;
use crate::signaling::{callee_handler, caller_handler};
use anyhow::Result;
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind: SocketAddr,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

pub fn router(registry: RoomRegistry) -> Router {
    Router::new()
        .route("/ws/caller", get(caller_handler))
        .route("/ws/callee", get(callee_handler))
        .with_state(registry)
}

/// A relay running in the background.
pub struct RelayServer {
    addr: SocketAddr,
    registry: RoomRegistry,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RelayServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let registry = RoomRegistry::new();
        let app = router(registry.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                error!("Relay server error: {}", e);
            }
        });

        info!("Relay listening on {}", addr);
        Ok(Self {
            addr,
            registry,
            shutdown_tx,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base url clients connect to.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Sends `roomClosed` to everyone and stops accepting connections.
    pub async fn shutdown(self) {
        self.registry.close_all();
        let _ = self.shutdown_tx.send(());
        if tokio::time::timeout(SHUTDOWN_GRACE, self.task).await.is_err() {
            warn!("Relay did not stop within {:?}", SHUTDOWN_GRACE);
        }
    }
}

/// Runs the relay until Ctrl-C.
pub async fn serve(config: RelayConfig) -> Result<()> {
    let server = RelayServer::bind(config.bind).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down relay");
    server.shutdown().await;
    Ok(())
}

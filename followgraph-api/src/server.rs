//! HTTP server with graceful shutdown

use super::api::build_router;
use super::state::AppState;
use anyhow::Result;
use followgraph_core::shutdown::ShutdownCoordinator;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Follow graph HTTP server
pub struct ApiServer {
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown: Arc<ShutdownCoordinator>,
}

impl ApiServer {
    pub fn new(state: AppState, addr: SocketAddr, shutdown: Arc<ShutdownCoordinator>) -> Self {
        Self {
            state: Arc::new(state),
            addr,
            shutdown,
        }
    }

    /// Serve until shutdown is requested, then drain and close the store
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.run_on(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn run_on(self, listener: TcpListener) -> Result<()> {
        let router = build_router(self.state.clone());
        info!("Follow graph API listening on {}", listener.local_addr()?);

        let graceful = {
            let shutdown = self.shutdown.clone();
            async move { shutdown.wait_for_shutdown().await }
        };
        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(graceful)
            .into_future();

        let deadline = {
            let shutdown = self.shutdown.clone();
            async move {
                shutdown.wait_for_shutdown().await;
                tokio::time::sleep(shutdown.timeout()).await;
            }
        };

        tokio::select! {
            result = serve => result?,
            _ = deadline => warn!("Drain deadline exceeded, abandoning open connections"),
        }

        self.state.service.store().close().await?;
        self.shutdown.complete().await;
        Ok(())
    }
}

//! Testable server startup logic.
//!
//! Provides [`ServerConfig`] and [`ServerHandle`] so integration tests can
//! spin up a real gatehouse server on an ephemeral port, exercise its HTTP
//! endpoints, and shut it down cleanly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::embed::relay::{ChatBackend, HttpChatBackend};
use crate::server::http::{create_router, AppState, HttpConfig};

/// Startup errors.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to build chat backend client: {0}")]
    Backend(#[from] reqwest::Error),
}

/// Everything needed to start a gatehouse server.
pub struct ServerConfig {
    pub http_config: HttpConfig,
    pub bind_address: SocketAddr,
    /// Substitute chat backend; `None` builds the real reqwest-backed
    /// client from `http_config`.
    pub backend: Option<Arc<dyn ChatBackend>>,
}

impl ServerConfig {
    /// Minimal config suitable for integration tests: binds to
    /// `127.0.0.1:0` (OS-assigned port) with the given backend.
    pub fn for_testing(backend: Arc<dyn ChatBackend>) -> Self {
        ServerConfig {
            http_config: HttpConfig::default(),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            backend: Some(backend),
        }
    }
}

/// Handle to a running server. Returned by [`run_server_with_config`].
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    server_task: JoinHandle<Result<(), std::io::Error>>,
}

impl ServerHandle {
    /// The port the server actually bound to (useful when binding to port 0).
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// The full local address (ip + port).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://ip:port` base URL for the running server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Trigger graceful shutdown and await the server task.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        match tokio::time::timeout(Duration::from_secs(5), self.server_task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => error!("Server task returned error: {}", e),
            Ok(Err(e)) => error!("Server task panicked: {}", e),
            Err(_) => warn!("Server task did not finish within 5s timeout"),
        }
    }
}

/// Bind, assemble the router, and serve until shutdown is signalled.
pub async fn run_server_with_config(config: ServerConfig) -> Result<ServerHandle, StartupError> {
    let backend: Arc<dyn ChatBackend> = match config.backend {
        Some(backend) => backend,
        None => Arc::new(HttpChatBackend::new(
            &config.http_config.backend_base_url,
            config.http_config.backend_timeout,
        )?),
    };

    let state = AppState::new(config.http_config, backend);
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address,
            source,
        })?;
    let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
        address: config.bind_address,
        source,
    })?;

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let server_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // Only a true value signals shutdown; the initial false is
                // skipped by waiting for a change first.
                while shutdown_rx.changed().await.is_ok() {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            })
            .await
    });

    Ok(ServerHandle {
        local_addr,
        shutdown_tx,
        server_task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::relay::{ChatReply, ChatRequest, RelayError};
    use async_trait::async_trait;

    struct NullBackend;

    #[async_trait]
    impl ChatBackend for NullBackend {
        async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, RelayError> {
            Err(RelayError::Network("not wired in this test".to_string()))
        }
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port_and_shuts_down() {
        let config = ServerConfig::for_testing(Arc::new(NullBackend));
        let handle = run_server_with_config(config).await.unwrap();

        assert_ne!(handle.port(), 0);
        assert!(handle.base_url().starts_with("http://127.0.0.1:"));

        handle.shutdown().await;
    }
}

//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::dispatcher::Dispatcher;
use super::fanout::FanoutAggregator;
use super::router::{AppState, create_router};
use crate::config::Config;
use crate::failsafe::Failsafe;
use crate::upstream::UpstreamClient;
use crate::{Error, Result};

/// Event gateway server
pub struct Gateway {
    /// Configuration
    config: Config,
}

impl Gateway {
    /// Create a new gateway
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the gateway until a shutdown signal arrives
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let upstream = Arc::new(UpstreamClient::new(&self.config.upstream)?);
        let failsafe = Failsafe::new("upstream", &self.config.failsafe);

        let state = Arc::new(AppState {
            dispatcher: Dispatcher::new(Arc::clone(&upstream), failsafe.clone()),
            fanout: FanoutAggregator::new(Arc::clone(&upstream), failsafe.retry_policy.clone()),
            upstream,
        });

        let app = create_router(state);

        let listener = TcpListener::bind(addr).await?;
        info!(
            addr = %addr,
            upstream = %self.config.upstream.base_url,
            "Server running"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("Shutting down server...");
}

//! Startup orchestration.
//!
//! Config is already loaded and validated by the time [`start`] runs.
//! Order: logging, metrics, HTTP client and relay, listener. Any failure
//! here is fatal.

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::RelayConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Bring the relay up and serve until a shutdown signal arrives.
pub async fn start(config: RelayConfig) -> Result<(), StartupError> {
    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        endpoint = %config.backend.endpoint,
        "csrf-relay starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config)?;

    let address = server.config().listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    // Never triggered here; OS signals stop the server.
    let shutdown = Shutdown::new();
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router mounting the relay under `/api`
//! - Wire up middleware (request ID, tracing)
//! - Build the shared HTTP client, token issuer and transport
//! - Serve on a listener with graceful shutdown

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::{delete, get, patch, post, put, MethodRouter},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::csrf::HttpTokenIssuer;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown_signal;
use crate::observability::spans::make_request_span;
use crate::proxy::relay::{Relay, API_PREFIX};
use crate::proxy::ReqwestTransport;

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a server whose relay talks to `config.backend` over reqwest.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let client = ReqwestTransport::build_client(&config.backend)?;

        let issuer = HttpTokenIssuer::new(
            client.clone(),
            &config.backend.endpoint,
            &config.backend.csrf_path,
        );
        let transport = ReqwestTransport::new(client);

        let relay = Relay::new(
            &config.backend.endpoint,
            Arc::new(issuer),
            Arc::new(transport),
            config.listener.max_body_size,
        );

        Ok(Self::with_relay(config, relay))
    }

    /// Create a server around an already assembled relay.
    pub fn with_relay(config: RelayConfig, relay: Relay) -> Self {
        Self {
            router: build_router(relay),
            config,
        }
    }

    /// Serve until Ctrl+C/SIGTERM or until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {},
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    },
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Mount the relay for GET (and HEAD), POST, PATCH, PUT and DELETE on
/// `/api`, `/api/` and `/api/{*path}`. Other methods get axum's 405.
pub fn build_router(relay: Relay) -> Router {
    Router::new()
        .route(API_PREFIX, relay_methods())
        .route(&format!("{}/", API_PREFIX), relay_methods())
        .route(&format!("{}/{{*path}}", API_PREFIX), relay_methods())
        .with_state(relay)
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(set_request_id_layer())
}

fn relay_methods() -> MethodRouter<Relay> {
    get(relay_handler)
        .post(relay_handler)
        .patch(relay_handler)
        .put(relay_handler)
        .delete(relay_handler)
}

async fn relay_handler(State(relay): State<Relay>, request: Request<Body>) -> Response {
    relay.handle(request).await
}

//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use csrf_relay::config::RelayConfig;
use csrf_relay::{HttpServer, Relay, Shutdown};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

pub const TOKEN: &str = "tok987";

/// What the mock backend saw.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Mock backend: `/csrf/` issues [`TOKEN`], everything else is recorded and
/// answered by path.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub captured: Arc<Mutex<Vec<Captured>>>,
    pub csrf_down: Arc<AtomicBool>,
}

impl MockBackend {
    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }

    pub fn last(&self) -> Captured {
        self.requests().pop().expect("backend saw no request")
    }
}

async fn csrf(State(backend): State<MockBackend>) -> Response {
    if backend.csrf_down.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "issuer down").into_response();
    }
    Json(json!({ "csrfToken": TOKEN })).into_response()
}

async fn api(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    backend.captured.lock().unwrap().push(Captured {
        method,
        uri: uri.clone(),
        headers,
        body: body.clone(),
    });

    match uri.path() {
        "/api/empty/" => (
            StatusCode::NO_CONTENT,
            [("x-marker", "kept"), ("set-cookie", "sessionid=new; Path=/")],
        )
            .into_response(),
        "/api/missing/" => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Not found." })),
        )
            .into_response(),
        "/api/moved/" => (
            StatusCode::FOUND,
            [(header::LOCATION, "/api/elsewhere/")],
        )
            .into_response(),
        "/api/binary/" => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            vec![0u8, 159, 146, 150, 255],
        )
            .into_response(),
        _ => (
            [("set-cookie", "foo=bar"), ("x-backend", "mock")],
            Json(json!({ "path": uri.path(), "echo": String::from_utf8_lossy(&body) })),
        )
            .into_response(),
    }
}

/// Start the mock backend on an ephemeral port.
pub async fn start_mock_backend() -> (String, MockBackend) {
    let backend = MockBackend::default();
    let app = Router::new()
        .route("/csrf/", get(csrf))
        .fallback(api)
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), backend)
}

/// Start a backend that writes `response` verbatim and closes the socket.
pub async fn start_raw_backend(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

/// An address nothing listens on.
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Running relay plus the handle that stops it.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn config_for(endpoint: &str) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backend.endpoint = endpoint.to_string();
    config
}

/// Start the relay built from `config`.
pub async fn start_relay(config: RelayConfig) -> RunningRelay {
    serve(HttpServer::new(config).unwrap()).await
}

/// Start a relay with hand-assembled collaborators.
pub async fn start_relay_with(relay: Relay) -> RunningRelay {
    serve(HttpServer::with_relay(config_for(relay.endpoint()), relay)).await
}

async fn serve(server: HttpServer) -> RunningRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    RunningRelay { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

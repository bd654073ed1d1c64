//! The relay handler: one inbound request in, one response out.
//!
//! ```text
//! request → resolve_target → TokenIssuer::issue → read body
//!         → merge_cookies → OutboundRequest → Transport::send → sanitize
//! ```
//!
//! Every path ends in a response that also expires the caller's CSRF cookie.

use axum::body::Body;
use axum::http::{Request, Uri};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use std::time::Instant;

use crate::csrf::TokenIssuer;
use crate::error::RelayError;
use crate::http::request::request_id;
use crate::http::response::expire_csrf_cookie;
use crate::observability::metrics;
use crate::proxy::cookies::merge_cookies;
use crate::proxy::forwarder::{IncomingRequest, OutboundRequest, Transport};
use crate::proxy::sanitizer::{sanitize, ProxyResponse};
use crate::proxy::target::resolve_target;

/// Path prefix the relay is mounted under.
pub const API_PREFIX: &str = "/api";

/// Request-scoped pipeline with injected collaborators. Cloning is cheap;
/// nothing in here changes after construction.
#[derive(Clone)]
pub struct Relay {
    endpoint: Arc<str>,
    issuer: Arc<dyn TokenIssuer>,
    transport: Arc<dyn Transport>,
    max_body_size: usize,
}

impl Relay {
    pub fn new(
        endpoint: &str,
        issuer: Arc<dyn TokenIssuer>,
        transport: Arc<dyn Transport>,
        max_body_size: usize,
    ) -> Self {
        Self {
            endpoint: Arc::from(endpoint.trim_end_matches('/')),
            issuer,
            transport,
            max_body_size,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Relay one request. Never fails: errors become JSON error responses.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().to_string();
        let request_id = request_id(request.headers()).to_string();

        let mut response = match self.forward(request).await {
            Ok(relayed) => relayed.into_response(),
            Err(e) => {
                match &e {
                    RelayError::TokenUnavailable => {
                        tracing::warn!(request_id = %request_id, "No CSRF token available, request not forwarded");
                        metrics::record_csrf_failure();
                    }
                    RelayError::Transport(_) => {
                        tracing::error!(request_id = %request_id, error = %e, "Error forwarding request");
                        metrics::record_upstream_error();
                    }
                    _ => tracing::error!(request_id = %request_id, error = %e, "Relay failed"),
                }
                e.into_response()
            }
        };

        expire_csrf_cookie(&mut response);
        metrics::record_request(&method, response.status().as_u16(), start);
        response
    }

    async fn forward(&self, request: Request<Body>) -> Result<ProxyResponse, RelayError> {
        let (parts, body) = request.into_parts();
        let path = relay_path(&parts.uri).to_string();
        let target = resolve_target(&self.endpoint, &path, parts.uri.query(), &parts.method);

        let token = self.issuer.issue().await.ok_or(RelayError::TokenUnavailable)?;

        let incoming = IncomingRequest::read(parts, path, body, self.max_body_size).await?;
        let merged = merge_cookies(&incoming.cookies(), &token);

        tracing::debug!(
            request_id = %request_id(&incoming.headers),
            method = %incoming.method,
            path = %incoming.path,
            session = merged.session.is_some(),
            "Forwarding request"
        );

        let outbound = OutboundRequest::assemble(target, incoming, &merged, &token)?;
        let backend = self.transport.send(outbound).await?;

        Ok(sanitize(backend).await?)
    }
}

/// The part of the request path after `/api/`, still percent-encoded.
pub fn relay_path(uri: &Uri) -> &str {
    let path = uri.path();
    path.strip_prefix(API_PREFIX)
        .map(|rest| rest.strip_prefix('/').unwrap_or(rest))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csrf::CsrfToken;
    use crate::proxy::forwarder::{BackendBody, BackendResponse, TransportError};
    use async_trait::async_trait;
    use axum::body::Bytes;
    use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
    use std::sync::Mutex;

    struct FixedIssuer(Option<&'static str>);

    #[async_trait]
    impl TokenIssuer for FixedIssuer {
        async fn issue(&self) -> Option<CsrfToken> {
            self.0.and_then(CsrfToken::new)
        }
    }

    /// Records every outbound request and answers with a canned response.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutboundRequest>>,
        status: Option<StatusCode>,
        fail: bool,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: OutboundRequest) -> Result<BackendResponse, TransportError> {
            self.sent.lock().unwrap().push(request);
            if self.fail {
                return Err(TransportError::Unavailable("connection refused".into()));
            }
            let mut headers = HeaderMap::new();
            headers.insert(header::SET_COOKIE, HeaderValue::from_static("foo=bar"));
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Ok(BackendResponse::new(
                self.status.unwrap_or(StatusCode::OK),
                headers,
                BackendBody::Buffered(Bytes::from_static(b"{\"ok\":true}")),
            ))
        }
    }

    fn relay(issuer: FixedIssuer, transport: Arc<RecordingTransport>) -> Relay {
        Relay::new("http://backend:8000", Arc::new(issuer), transport, 1024)
    }

    fn request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from("payload")).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_relay_path() {
        assert_eq!(relay_path(&"/api/users".parse().unwrap()), "users");
        assert_eq!(relay_path(&"/api/a/b/".parse().unwrap()), "a/b/");
        assert_eq!(relay_path(&"/api/".parse().unwrap()), "");
        assert_eq!(relay_path(&"/api".parse().unwrap()), "");
        assert_eq!(relay_path(&"/api/caf%C3%A9?x=1".parse().unwrap()), "caf%C3%A9");
    }

    #[tokio::test]
    async fn test_get_scenario() {
        let transport = Arc::new(RecordingTransport::default());
        let relay = relay(FixedIssuer(Some("tok987")), transport.clone());

        let response = relay
            .handle(request(Method::GET, "/api/users?active=true", Some("sessionid=abc123")))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let out = &sent[0];
        assert_eq!(out.url, "http://backend:8000/api/users/?active=true&format=json");
        assert_eq!(out.method, Method::GET);
        assert_eq!(out.headers["x-csrftoken"], "tok987");
        assert_eq!(out.headers["x-session-token"], "abc123");
        assert_eq!(out.headers[header::COOKIE], "sessionid=abc123; csrftoken=tok987");
        assert!(out.body.is_none());
    }

    #[tokio::test]
    async fn test_post_keeps_query_and_body() {
        let transport = Arc::new(RecordingTransport::default());
        let relay = relay(FixedIssuer(Some("T")), transport.clone());

        relay.handle(request(Method::POST, "/api/collections?x=1", None)).await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].url, "http://backend:8000/api/collections/?x=1");
        assert_eq!(sent[0].body.as_deref(), Some(&b"payload"[..]));
        assert!(sent[0].headers.get("x-session-token").is_none());
    }

    #[tokio::test]
    async fn test_non_ascii_cookie_keeps_session() {
        let transport = Arc::new(RecordingTransport::default());
        let relay = relay(FixedIssuer(Some("T")), transport.clone());

        let inbound = Request::builder()
            .uri("/api/users")
            .header(
                header::COOKIE,
                HeaderValue::from_bytes("sessionid=abc123; name=Zoë".as_bytes()).unwrap(),
            )
            .header("x-session-token", "forged")
            .body(Body::empty())
            .unwrap();
        assert_eq!(relay.handle(inbound).await.status(), StatusCode::OK);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].headers["x-session-token"], "abc123");
        assert_eq!(
            sent[0].headers[header::COOKIE].as_bytes(),
            "sessionid=abc123; name=Zoë; csrftoken=T".as_bytes()
        );
    }

    #[tokio::test]
    async fn test_caller_session_header_dropped_without_cookie() {
        let transport = Arc::new(RecordingTransport::default());
        let relay = relay(FixedIssuer(Some("T")), transport.clone());

        let inbound = Request::builder()
            .uri("/api/users")
            .header("x-session-token", "forged")
            .body(Body::empty())
            .unwrap();
        relay.handle(inbound).await;

        let sent = transport.sent.lock().unwrap();
        assert!(sent[0].headers.get("x-session-token").is_none());
    }

    #[tokio::test]
    async fn test_missing_token_short_circuits() {
        let transport = Arc::new(RecordingTransport::default());
        let relay = relay(FixedIssuer(None), transport.clone());

        let response = relay.handle(request(Method::GET, "/api/users", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(transport.sent.lock().unwrap().is_empty());

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("csrftoken=;"));

        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "CSRF token is missing or invalid" })
        );
    }

    #[tokio::test]
    async fn test_blank_token_counts_as_missing() {
        let transport = Arc::new(RecordingTransport::default());
        let relay = relay(FixedIssuer(Some("")), transport.clone());

        let response = relay.handle(request(Method::DELETE, "/api/trips/1", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_internal_error() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let relay = relay(FixedIssuer(Some("T")), transport);

        let response = relay.handle(request(Method::PUT, "/api/trips/1", None)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(set_cookies(&response).len(), 1);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Internal Server Error" })
        );
    }

    #[tokio::test]
    async fn test_backend_cookie_replaced_by_expiry() {
        let transport = Arc::new(RecordingTransport::default());
        let relay = relay(FixedIssuer(Some("T")), transport);

        let response = relay.handle(request(Method::PATCH, "/api/me", None)).await;
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(!cookies[0].contains("foo=bar"));
        assert!(cookies[0].starts_with("csrftoken=;"));
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_backend_error_status_relayed() {
        let transport = Arc::new(RecordingTransport {
            status: Some(StatusCode::FORBIDDEN),
            ..Default::default()
        });
        let relay = relay(FixedIssuer(Some("T")), transport);

        let response = relay.handle(request(Method::GET, "/api/admin", None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_oversized_body_is_internal_error() {
        let transport = Arc::new(RecordingTransport::default());
        let relay = Relay::new("http://backend:8000", Arc::new(FixedIssuer(Some("T"))), transport.clone(), 4);

        let response = relay.handle(request(Method::POST, "/api/upload", None)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let relay = Relay::new(
            "http://backend:8000/",
            Arc::new(FixedIssuer(None)),
            Arc::new(RecordingTransport::default()),
            1,
        );
        assert_eq!(relay.endpoint(), "http://backend:8000");
    }
}

//! Outbound request assembly and the backend transport.
//!
//! # Responsibilities
//! - Turn an [`IncomingRequest`] plus merged cookies into an [`OutboundRequest`]
//! - Send it through a [`Transport`] and hand back the raw backend response
//!
//! # Design Decisions
//! - Request bodies are buffered before forwarding, never streamed through
//! - GET and HEAD never carry a body
//! - Backend bodies stay unread until the sanitizer asks for them

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use std::time::Duration;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::csrf::{CsrfToken, CSRF_HEADER};
use crate::proxy::cookies::{CookieHeader, MergedCookies, SESSION_HEADER};
use crate::proxy::headers::outbound_copy;

/// Failure reaching the backend or reading its reply.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// A caller's request, with its path already relative to `/api/`.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IncomingRequest {
    /// Read the body fully (up to `limit` bytes) and keep the rest of the parts.
    pub async fn read(
        parts: Parts,
        path: String,
        body: Body,
        limit: usize,
    ) -> Result<Self, axum::Error> {
        let body = if carries_body(&parts.method) {
            axum::body::to_bytes(body, limit).await?
        } else {
            Bytes::new()
        };

        Ok(Self {
            query: parts.uri.query().map(ToOwned::to_owned),
            method: parts.method,
            path,
            headers: parts.headers,
            body,
        })
    }

    pub fn cookies(&self) -> CookieHeader {
        CookieHeader::from_headers(&self.headers)
    }
}

/// Fully assembled call to the backend.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    /// Copy the caller's headers, then set `Cookie`, `X-CSRFToken` and,
    /// when a session was found, `X-Session-Token`.
    pub fn assemble(
        url: String,
        incoming: IncomingRequest,
        merged: &MergedCookies,
        token: &CsrfToken,
    ) -> Result<Self, header::InvalidHeaderValue> {
        let mut headers = outbound_copy(&incoming.headers);

        headers.insert(header::COOKIE, merged.cookie.to_header_value()?);
        headers.insert(
            HeaderName::from_static(CSRF_HEADER),
            HeaderValue::from_str(token.as_str())?,
        );
        if let Some(session) = &merged.session {
            headers.insert(
                HeaderName::from_static(SESSION_HEADER),
                HeaderValue::from_bytes(session.as_bytes())?,
            );
        }

        let body = carries_body(&incoming.method).then_some(incoming.body);

        Ok(Self {
            method: incoming.method,
            url,
            headers,
            body,
        })
    }
}

fn carries_body(method: &Method) -> bool {
    method != Method::GET && method != Method::HEAD
}

/// Backend body, either already in memory or still on the wire.
pub enum BackendBody {
    Buffered(Bytes),
    Pending(reqwest::Response),
}

/// Raw backend reply before sanitization.
pub struct BackendResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    body: BackendBody,
}

impl BackendResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: BackendBody) -> Self {
        Self { status, headers, body }
    }

    /// Read the remaining body. Binary-safe.
    pub async fn into_bytes(self) -> Result<Bytes, TransportError> {
        match self.body {
            BackendBody::Buffered(bytes) => Ok(bytes),
            BackendBody::Pending(response) => Ok(response.bytes().await?),
        }
    }
}

/// The primitive used to reach the backend.
///
/// Timeouts and cancellation belong to the implementation; dropping the
/// returned future abandons the call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse, TransportError>;
}

/// [`Transport`] over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Client tuned for relaying: transport-level timeouts, no redirect
    /// following (3xx goes back to the caller as-is), no proxy lookup.
    pub fn build_client(config: &BackendConfig) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        Ok(BackendResponse::new(status, headers, BackendBody::Pending(response)))
    }
}

//! Request spans for tower-http's `TraceLayer`.

use axum::http::Request;
use tracing::Span;

use crate::http::request::request_id;

/// One `request` span per inbound request, carrying its ID.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request.headers()),
    )
}

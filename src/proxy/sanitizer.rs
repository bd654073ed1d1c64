//! Backend response relaying.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::proxy::forwarder::{BackendResponse, TransportError};
use crate::proxy::headers::sanitize_backend_headers;

/// What the caller gets back from a successful relay.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Relay status, headers and body, minus backend cookies.
///
/// A 204 is answered without touching the backend body at all. Any other
/// status is buffered in full. Error statuses from the backend are relayed
/// like any other.
pub async fn sanitize(response: BackendResponse) -> Result<ProxyResponse, TransportError> {
    let status = response.status;
    let mut headers = response.headers.clone();
    sanitize_backend_headers(&mut headers);

    let body = if status == StatusCode::NO_CONTENT {
        Bytes::new()
    } else {
        response.into_bytes().await?
    };

    Ok(ProxyResponse { status, headers, body })
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

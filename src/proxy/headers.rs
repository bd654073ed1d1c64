//! Header hygiene shared by both directions of the relay.
//!
//! - Hop-by-hop headers describe one connection and never cross the relay
//! - `host` and `content-length` are recomputed by the transport
//! - `x-csrftoken` and `x-session-token` only ever come from the relay
//! - Backend `set-cookie` is never relayed to the caller

use axum::http::{
    header::{self, HeaderName},
    HeaderMap,
};

use crate::csrf::CSRF_HEADER;
use crate::proxy::cookies::SESSION_HEADER;

/// Connection-scoped headers (RFC 9110 §7.6.1).
pub static HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Inbound headers as they should leave for the backend.
pub fn outbound_copy(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(CSRF_HEADER);
    headers.remove(SESSION_HEADER);
    headers
}

/// Backend headers as they should reach the caller.
pub fn sanitize_backend_headers(headers: &mut HeaderMap) {
    strip_hop_by_hop(headers);
    headers.remove(header::SET_COOKIE);
}

//! Responses the relay produces itself.
//!
//! # Responsibilities
//! - JSON error bodies of the form `{"error": "..."}`
//! - Expire the caller's CSRF cookie on every response
//!
//! # Design Decisions
//! - The expiry is appended, so it survives alongside any other
//!   `Set-Cookie` the relay adds
//! - Backend cookies are already gone by the time this runs

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::Cookie;
use serde::Serialize;

use crate::csrf::CSRF_COOKIE;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// `status` with a `{"error": message}` body.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

/// Tell the caller to drop its `csrftoken` cookie.
pub fn expire_csrf_cookie(response: &mut Response) {
    let mut cookie = Cookie::build((CSRF_COOKIE, "")).path("/").build();
    cookie.make_removal();

    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode CSRF expiry cookie"),
    }
}

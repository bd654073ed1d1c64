//! Relay error taxonomy.
//!
//! Every variant is answered locally; nothing propagates past the handler.
//! Backend error statuses are not errors here, they are relayed.

use axum::http::{header::InvalidHeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response::error_response;
use crate::proxy::forwarder::TransportError;

pub const TOKEN_UNAVAILABLE_MESSAGE: &str = "CSRF token is missing or invalid";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Errors that end a relay before a backend response exists.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The token issuer produced nothing usable.
    #[error("CSRF token unavailable")]
    TokenUnavailable,

    /// The backend could not be reached or its body could not be read.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The caller's body could not be read.
    #[error("failed to read request body: {0}")]
    InboundBody(#[from] axum::Error),

    /// A value could not be placed into an outbound header.
    #[error("invalid outbound header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::TokenUnavailable => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing message. Internal details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::TokenUnavailable => TOKEN_UNAVAILABLE_MESSAGE,
            _ => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.public_message())
    }
}

//! CSRF token acquisition.
//!
//! # Data Flow
//! ```text
//! relay handler
//!     → TokenIssuer::issue (awaited, one call per request)
//!     → Some(CsrfToken) → cookie merge + X-CSRFToken header
//!     → None            → 400, nothing forwarded
//! ```

pub mod issuer;
pub mod token;

pub use issuer::{HttpTokenIssuer, TokenIssuer};
pub use token::{CsrfToken, CSRF_COOKIE, CSRF_HEADER};

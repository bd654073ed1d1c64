//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, /api routes)
//!     → request.rs (request ID)
//!     → proxy::Relay (token, cookies, forward, sanitize)
//!     → response.rs (JSON errors, CSRF cookie expiry)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use server::{build_router, HttpServer};

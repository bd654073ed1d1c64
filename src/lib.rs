//! CSRF-refreshing API relay library.
//!
//! Sits between a browser-facing front end and a backend API: every request
//! under `/api/` gets a freshly issued CSRF token, a merged `Cookie` header
//! and the caller's session mirrored into `X-Session-Token`, then the
//! backend's answer is relayed without its cookies.

pub mod config;
pub mod csrf;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use config::RelayConfig;
pub use error::RelayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::Relay;

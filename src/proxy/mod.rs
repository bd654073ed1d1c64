//! Credential-translating relay core.
//!
//! # Data Flow
//! ```text
//! Inbound request (method, /api/{path}, query, headers, body)
//!     → target.rs     (outbound URL + method-specific query)
//!     → csrf          (fresh token, or 400)
//!     → cookies.rs    (merged Cookie header, session identifier)
//!     → forwarder.rs  (OutboundRequest → Transport)
//!     → sanitizer.rs  (status, headers minus set-cookie, body)
//!     → relay.rs      (cookie expiry, metrics, error mapping)
//! ```
//!
//! # Design Decisions
//! - No state survives a request: every call re-acquires its token
//! - Collaborators (issuer, transport) are injected as trait objects
//! - No retries; a transport failure is final for that request

pub mod cookies;
pub mod forwarder;
pub mod headers;
pub mod relay;
pub mod sanitizer;
pub mod target;

pub use cookies::{merge_cookies, CookieHeader, MergedCookies, SessionId};
pub use forwarder::{
    BackendBody, BackendResponse, IncomingRequest, OutboundRequest, ReqwestTransport, Transport,
    TransportError,
};
pub use relay::Relay;
pub use sanitizer::{sanitize, ProxyResponse};
pub use target::{resolve_target, QueryPolicy};

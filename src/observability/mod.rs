//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! relay handler / server produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → spans.rs (one span per request, keyed by request ID)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Tokens and cookie values are never logged

pub mod logging;
pub mod metrics;
pub mod spans;

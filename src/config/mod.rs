//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → PUBLIC_SERVER_URL, then command-line overrides
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → injected into the HTTP server at construction
//! ```
//!
//! # Design Decisions
//! - Read once at startup; no hot reload
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigOverrides};
pub use schema::{BackendConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig};

//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Returns every problem found,
//! not just the first.

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend.endpoint '{value}' is not a valid http(s) URL")]
    InvalidEndpoint { value: String },

    #[error("backend.csrf_path '{value}' must start with '/'")]
    InvalidCsrfPath { value: String },

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Validate a configuration. Pure function, runs before the config is accepted.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let endpoint_ok = Url::parse(&config.backend.endpoint)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false);
    if !endpoint_ok {
        errors.push(ValidationError::InvalidEndpoint {
            value: config.backend.endpoint.clone(),
        });
    }

    if !config.backend.csrf_path.starts_with('/') {
        errors.push(ValidationError::InvalidCsrfPath {
            value: config.backend.csrf_path.clone(),
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_body_size" });
    }
    if config.backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "backend.connect_timeout_secs" });
    }
    if config.backend.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "backend.request_timeout_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

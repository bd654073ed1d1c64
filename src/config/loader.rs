//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `backend.endpoint`.
pub const ENDPOINT_ENV: &str = "PUBLIC_SERVER_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values supplied on the command line. They win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub endpoint: Option<String>,
}

/// Load, override, normalize and validate configuration.
///
/// Precedence: defaults < file < `PUBLIC_SERVER_URL` < command line.
pub fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => RelayConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok());
    apply_overrides(&mut config, overrides);
    normalize(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without applying any overrides.
pub fn parse_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides through `lookup`, so tests never touch the
/// process environment.
pub fn apply_env<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
        config.backend.endpoint = endpoint;
    }
}

fn apply_overrides(config: &mut RelayConfig, overrides: &ConfigOverrides) {
    if let Some(bind) = &overrides.bind_address {
        config.listener.bind_address = bind.clone();
    }
    if let Some(endpoint) = &overrides.endpoint {
        config.backend.endpoint = endpoint.clone();
    }
}

fn normalize(config: &mut RelayConfig) {
    let trimmed = config.backend.endpoint.trim().trim_end_matches('/');
    config.backend.endpoint = trimmed.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DEFAULT_ENDPOINT;

    #[test]
    fn test_env_overrides_file() {
        let mut config = RelayConfig::default();
        apply_env(&mut config, |key| {
            (key == ENDPOINT_ENV).then(|| "https://backend.example".to_string())
        });
        assert_eq!(config.backend.endpoint, "https://backend.example");
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let mut config = RelayConfig::default();
        apply_env(&mut config, |_| Some("  ".to_string()));
        assert_eq!(config.backend.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_cli_overrides_win_and_trailing_slash_is_trimmed() {
        let mut config = RelayConfig::default();
        apply_env(&mut config, |_| Some("http://from-env:8000".to_string()));
        apply_overrides(
            &mut config,
            &ConfigOverrides {
                bind_address: Some("127.0.0.1:4000".into()),
                endpoint: Some("http://from-cli:8000/".into()),
            },
        );
        normalize(&mut config);

        assert_eq!(config.backend.endpoint, "http://from-cli:8000");
        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = parse_file(Path::new("/nonexistent/relay.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/relay.toml"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![
            ValidationError::Zero { field: "a" },
            ValidationError::Zero { field: "b" },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: a must be greater than zero, b must be greater than zero"
        );
    }
}

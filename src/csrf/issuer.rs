//! CSRF token issuers.
//!
//! The relay only needs "give me a fresh token, or tell me there is none".
//! [`HttpTokenIssuer`] asks the backend's CSRF endpoint for one.

use async_trait::async_trait;
use serde::Deserialize;

use crate::csrf::token::CsrfToken;

/// Source of fresh CSRF tokens.
///
/// Implementations must not cache: every call yields a token for one
/// outbound request. Failure is reported as `None`, never as an error.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self) -> Option<CsrfToken>;
}

#[derive(Debug, Deserialize)]
struct CsrfTokenBody {
    #[serde(rename = "csrfToken")]
    csrf_token: Option<String>,
}

/// Fetches tokens from `GET {endpoint}{csrf_path}`, which answers with
/// `{"csrfToken": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpTokenIssuer {
    client: reqwest::Client,
    url: String,
}

impl HttpTokenIssuer {
    pub fn new(client: reqwest::Client, endpoint: &str, csrf_path: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", endpoint, csrf_path),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TokenIssuer for HttpTokenIssuer {
    async fn issue(&self) -> Option<CsrfToken> {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "CSRF token request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %self.url, status = %status, "CSRF endpoint returned an error");
            return None;
        }

        match response.json::<CsrfTokenBody>().await {
            Ok(body) => body.csrf_token.and_then(CsrfToken::new),
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "CSRF endpoint returned an unreadable body");
                None
            }
        }
    }
}

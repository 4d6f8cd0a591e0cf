use std::time::Duration;

use chrono::{DateTime, Utc};
use http::StatusCode;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::settings::HttpConfig;
use crate::errors::{AuthError, InitError};
use crate::identity::auth::AuthMethod;
use crate::identity::catalog::ServiceCatalog;
use crate::utils::constants::{AUTH_TOKEN_HEADER, SUBJECT_TOKEN_HEADER, TOKENS_PATH};

/// Token issued by `POST /auth/tokens`.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub value: String,
    pub catalog: ServiceCatalog,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Provider answer for `HEAD /auth/tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Invalid,
    /// The session token in `X-Auth-Token` was not accepted.
    SessionRejected,
    Unexpected(StatusCode),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    catalog: ServiceCatalog,
}

/// Thin Identity v3 client over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: Client,
}

impl IdentityClient {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    pub fn from_settings(http_config: &HttpConfig) -> Result<Self, InitError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(http_config.timeout_ms))
            .build()
            .map_err(InitError::Client)?;
        Ok(Self::new(http))
    }

    /// Exchange credentials for a token at `{endpoint}/auth/tokens`.
    pub async fn create_token(&self, endpoint: &str, method: &AuthMethod) -> Result<IssuedToken, AuthError> {
        let url = tokens_url(endpoint);
        debug!(url = %url, method = method.kind(), "requesting token");

        let response = self
            .http
            .post(&url)
            .json(&method.to_request_body())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "identity provider rejected authentication");
            return Err(AuthError::Rejected { status, body });
        }

        let value = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .ok_or(AuthError::MissingSubjectToken)?
            .to_str()
            .map_err(|e| AuthError::Malformed(format!("{} header: {}", SUBJECT_TOKEN_HEADER, e)))?
            .to_owned();

        let body = response.text().await?;
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::Malformed(e.to_string()))?;

        Ok(IssuedToken {
            value,
            catalog: parsed.token.catalog,
            expires_at: parsed.token.expires_at,
        })
    }

    /// Ask `{endpoint}/auth/tokens` whether `subject_token` is valid, acting
    /// as `session_token`.
    pub async fn check_token(
        &self,
        endpoint: &str,
        session_token: &str,
        subject_token: &str,
    ) -> Result<TokenStatus, reqwest::Error> {
        let response = self
            .http
            .head(tokens_url(endpoint))
            .header(AUTH_TOKEN_HEADER, session_token)
            .header(SUBJECT_TOKEN_HEADER, subject_token)
            .send()
            .await?;

        Ok(match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => TokenStatus::Valid,
            StatusCode::NOT_FOUND => TokenStatus::Invalid,
            StatusCode::UNAUTHORIZED => TokenStatus::SessionRejected,
            other => TokenStatus::Unexpected(other),
        })
    }
}

fn tokens_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), TOKENS_PATH)
}

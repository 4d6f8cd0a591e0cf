use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::credentials::ServiceConfig;
use crate::errors::{EndpointNotFound, InitError, ValidationError};
use crate::helpers::time::get_instant;
use crate::identity::auth::AuthOptions;
use crate::identity::catalog::EndpointFilter;
use crate::identity::client::{IdentityClient, TokenStatus};
use crate::identity::session::{Session, SessionToken};
use crate::observability::metrics::get_metrics;

static VALID_MSG: &str = "valid";
static INVALID_MSG: &str = "invalid";
static ERROR_MSG: &str = "error";

/// Answers "is this external token currently valid?" using the shared session.
#[derive(Debug)]
pub struct TokenValidator {
    session: Arc<Session>,
    endpoint: String,
}

impl TokenValidator {
    /// Bind to the endpoint `filter` selects from the session's current catalog.
    pub async fn new(session: Arc<Session>, filter: &EndpointFilter) -> Result<Self, EndpointNotFound> {
        let endpoint = session.locate_endpoint(filter).await?;
        info!(endpoint = %endpoint, filter = %filter, "validation endpoint resolved");
        Ok(Self { session, endpoint })
    }

    /// Authenticate with the configured credentials and resolve the
    /// validation endpoint.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self, InitError> {
        let client = IdentityClient::from_settings(&config.settings.http)?;
        let options = AuthOptions::from(&config.global);
        let auth_endpoint = config
            .settings
            .identity_endpoint
            .as_deref()
            .unwrap_or(&config.global.auth_url);

        let session = Session::authenticate(client, &options, auth_endpoint).await?;
        let validator = Self::new(Arc::new(session), &config.settings.endpoint).await?;
        Ok(validator)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// `Ok(false)` means the provider answered that the token is not valid.
    ///
    /// A rejected session token causes one reauthentication and one retry.
    /// A second rejection is returned as [`ValidationError::SessionRejected`].
    pub async fn validate(&self, token: &str) -> Result<bool, ValidationError> {
        let metrics = get_metrics().await;
        let start = get_instant();

        let result = self.validate_once_with_reauth(token).await;

        metrics.validation_duration.observe(start.elapsed().as_secs_f64());
        match &result {
            Ok(true) => metrics.validations.with_label_values(&[VALID_MSG]).inc(),
            Ok(false) => metrics.validations.with_label_values(&[INVALID_MSG]).inc(),
            Err(e) => {
                metrics.validations.with_label_values(&[ERROR_MSG]).inc();
                metrics.validation_failures.with_label_values(&[failure_reason(e)]).inc();
                warn!(error = %e, "token validation failed");
            }
        }
        result
    }

    /// Like [`validate`](Self::validate), bounded by `timeout`.
    pub async fn validate_with_timeout(&self, token: &str, timeout: Duration) -> Result<bool, ValidationError> {
        tokio::time::timeout(timeout, self.validate(token))
            .await
            .map_err(|_| ValidationError::Timeout)?
    }

    async fn validate_once_with_reauth(&self, token: &str) -> Result<bool, ValidationError> {
        let session_token = self.session.token().await;
        match self.check(&session_token, token).await? {
            TokenStatus::SessionRejected => {}
            status => return interpret(status),
        }

        let refreshed = self
            .session
            .reauthenticate(&session_token)
            .await
            .map_err(ValidationError::Reauth)?;
        debug!(generation = refreshed.generation, "retrying validation with refreshed session");

        match self.check(&refreshed, token).await? {
            TokenStatus::SessionRejected => Err(ValidationError::SessionRejected),
            status => interpret(status),
        }
    }

    async fn check(&self, session_token: &SessionToken, token: &str) -> Result<TokenStatus, ValidationError> {
        Ok(self
            .session
            .client()
            .check_token(&self.endpoint, &session_token.value, token)
            .await?)
    }
}

fn interpret(status: TokenStatus) -> Result<bool, ValidationError> {
    match status {
        TokenStatus::Valid => Ok(true),
        TokenStatus::Invalid => Ok(false),
        TokenStatus::SessionRejected => Err(ValidationError::SessionRejected),
        TokenStatus::Unexpected(code) => Err(ValidationError::UnexpectedStatus(code)),
    }
}

fn failure_reason(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::Transport(_) => "transport",
        ValidationError::UnexpectedStatus(_) => "status",
        ValidationError::SessionRejected => "session_rejected",
        ValidationError::Reauth(_) => "reauth",
        ValidationError::Timeout => "timeout",
    }
}

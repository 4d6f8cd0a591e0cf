use std::sync::Arc;

use http::StatusCode;

use crate::identity::catalog::EndpointFilter;

/// Configuration missing, unreadable or malformed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse failed: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("config is not valid: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// The provider rejected the credentials or the exchange itself failed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authentication transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider rejected credentials: {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("identity provider response has no X-Subject-Token header")]
    MissingSubjectToken,

    #[error("malformed identity provider response: {0}")]
    Malformed(String),

    #[error("reauthentication not permitted: {0}")]
    ReauthNotPermitted(&'static str),
}

#[derive(Debug, thiserror::Error)]
#[error("no catalog endpoint matches {filter}")]
pub struct EndpointNotFound {
    pub filter: EndpointFilter,
}

/// Failure while asking the provider about a token. A token reported as
/// invalid is not an error.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("validation transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected validation response status: {0}")]
    UnexpectedStatus(StatusCode),

    #[error("session token rejected after reauthentication")]
    SessionRejected,

    #[error("reauthentication failed: {0}")]
    Reauth(#[source] AuthError),

    #[error("validation timed out")]
    Timeout,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("initial authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Endpoint(#[from] EndpointNotFound),

    #[error("http client build failed: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("validator initialization failed: {0}")]
    Init(Arc<InitError>),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<Arc<InitError>> for ValidatorError {
    fn from(err: Arc<InitError>) -> Self {
        ValidatorError::Init(err)
    }
}

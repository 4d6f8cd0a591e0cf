use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::credentials::ServiceConfig;
use crate::errors::{InitError, ValidatorError};
use crate::utils::config_loader;
use crate::validator::token_validator::TokenValidator;

pub type SharedValidator = Result<Arc<TokenValidator>, Arc<InitError>>;

/// Construct-once handle for a [`TokenValidator`].
///
/// The first caller runs the builder; concurrent callers wait for it and every
/// caller, now or later, receives the same validator or the same error.
/// A failed construction is never retried.
pub struct ValidatorCell {
    cell: OnceCell<SharedValidator>,
}

impl ValidatorCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    pub async fn get_or_init<F, Fut>(&self, build: F) -> SharedValidator
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenValidator, InitError>>,
    {
        self.cell
            .get_or_init(|| async move {
                match build().await {
                    Ok(validator) => {
                        info!(endpoint = %validator.endpoint(), "token validator ready");
                        Ok(Arc::new(validator))
                    }
                    Err(e) => {
                        error!("token validator construction failed: {}", e);
                        Err(Arc::new(e))
                    }
                }
            })
            .await
            .clone()
    }

    /// Build from the config at `config_path` on first use.
    /// Later calls reuse the stored result regardless of the path they pass.
    pub async fn get_or_load(&self, config_path: &str) -> SharedValidator {
        self.get_or_init(|| async move {
            let config = config_loader::run(config_path).await?;
            TokenValidator::from_config(&config).await
        })
        .await
    }

    pub fn get(&self) -> Option<&SharedValidator> {
        self.cell.get()
    }
}

impl Default for ValidatorCell {
    fn default() -> Self {
        Self::new()
    }
}

static VALIDATOR: ValidatorCell = ValidatorCell::new();

/// Process-wide validator built from the config at `config_path` on first use.
pub async fn get_validator(config_path: &str) -> SharedValidator {
    VALIDATOR.get_or_load(config_path).await
}

/// Process-wide validator built from an already loaded config.
pub async fn init_validator(config: &ServiceConfig) -> SharedValidator {
    VALIDATOR
        .get_or_init(|| TokenValidator::from_config(config))
        .await
}

/// Validate `token` through the process-wide validator.
pub async fn validate_token(config_path: &str, token: &str) -> Result<bool, ValidatorError> {
    let validator = get_validator(config_path).await?;
    Ok(validator.validate(token).await?)
}

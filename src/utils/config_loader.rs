use std::path::Path;

use tracing::error;

use crate::config::credentials::ServiceConfig;
use crate::config::proc_loader::file_to_config;
use crate::errors::ConfigError;

pub async fn run(config_path: &str) -> Result<ServiceConfig, ConfigError> {
    let path = Path::new(config_path);
    file_to_config(path)
        .await
        .inspect_err(|e| error!("invalid config '{}': {}", config_path, e))
}

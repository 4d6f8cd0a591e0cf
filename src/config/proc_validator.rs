//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * credentials: auth URL, user identity, domain, password
//!   * endpoint override and catalog filter
//!   * http / server / metrics / logging settings

use tracing::{error, info};

use crate::config::credentials::{Credentials, ServiceConfig};
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_credentials(&cfg.global, &mut errors);
    validate_settings(&cfg.settings, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// CREDENTIALS VALIDATION
fn validate_credentials(global: &Credentials, errors: &mut Vec<String>) {
    if global.auth_url.is_empty() {
        errors.push("global.auth_url is empty".to_string());
    } else if !is_http_url(&global.auth_url) {
        errors.push(format!(
            "global.auth_url '{}' must be an http(s) URL",
            global.auth_url
        ));
    }

    if global.user_id.is_empty() {
        if global.username.is_empty() {
            errors.push("global: either user_id or username is required".to_string());
        } else if global.domain_id.is_empty() && global.domain_name.is_empty() {
            errors.push(format!(
                "global.username '{}' requires domain_id or domain_name",
                global.username
            ));
        }
    }

    if global.password.is_empty() {
        errors.push("global.password is empty".to_string());
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(endpoint) = &settings.identity_endpoint {
        if !is_http_url(endpoint) {
            errors.push(format!(
                "settings.identity_endpoint '{}' must be an http(s) URL",
                endpoint
            ));
        }
    }

    if settings.endpoint.service_type.is_empty() {
        errors.push("settings.endpoint.service_type is empty".to_string());
    }

    if settings.http.timeout_ms == 0 {
        errors.push("settings.http.timeout_ms must be greater than 0".to_string());
    }

    if settings.server.host.is_empty() {
        errors.push(format!(
            "settings.server.host '{}' must be valid",
            settings.server.host
        ));
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

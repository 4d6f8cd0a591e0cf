use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::validate::ValidateState;
use crate::validator::token_validator::TokenValidator;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub validate_state: ValidateState,
}

impl AppState {
    pub fn new(metrics: &Metrics, validator: Arc<TokenValidator>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            validate_state: ValidateState::new(validator),
        }
    }
}

pub async fn router(settings_config: &SettingsConfig, validator: Arc<TokenValidator>) -> Router {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, validator);

    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.validate_state.router())
        .with_state(state)
}

/// Serve validation and metrics routes until the listener fails.
pub async fn start(settings_config: &SettingsConfig, validator: Arc<TokenValidator>) -> Result<()> {
    let app = router(settings_config, validator).await;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);

    get_metrics().await.up.set(1);
    axum::serve(listener, app).await.context("http server failed")?;

    Ok(())
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::debug;

use crate::server::server::AppState;
use crate::utils::constants::SUBJECT_TOKEN_HEADER;
use crate::validator::token_validator::TokenValidator;

pub const VALIDATE_PATH: &str = "/v1/validate";

#[derive(Clone)]
pub struct ValidateState {
    validator: Arc<TokenValidator>,
}

impl ValidateState {
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }

    pub fn router(&self) -> Router<AppState> {
        Router::new().route(VALIDATE_PATH, get(handle_validate))
    }
}

/// `GET /v1/validate` with the token to check in `X-Subject-Token`.
async fn handle_validate(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = match headers
        .get(SUBJECT_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    {
        Some(token) => token,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("missing {} header", SUBJECT_TOKEN_HEADER) })),
            )
                .into_response()
        }
    };

    match state.validate_state.validator.validate(token).await {
        Ok(valid) => {
            debug!(valid, "validation served");
            (StatusCode::OK, Json(json!({ "valid": valid }))).into_response()
        }
        Err(e) => (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::{
    auth::{
        dto::{GrantQuery, LoginRequest, RefreshRequest, TokenResponse},
        services,
    },
    error::AppError,
    extractors::{AppJson, AppQuery},
    response::{success, ApiResponse},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/oauth/login", post(token))
}

fn parse_body<T: DeserializeOwned>(
    body: Result<AppJson<serde_json::Value>, AppError>,
) -> Result<T, AppError> {
    let AppJson(value) = body?;
    serde_json::from_value(value).map_err(|e| AppError::validation(e.to_string()))
}

/// Token endpoint; `grant_type` selects password login or refresh.
#[instrument(skip(state, body))]
pub async fn token(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<GrantQuery>,
    body: Result<AppJson<serde_json::Value>, AppError>,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    match q.grant_type.as_deref() {
        Some("password") => {
            let req: LoginRequest = parse_body(body)?;
            let pair = services::login(&state, &req.email, &req.password).await?;
            Ok(success(pair.into(), "Login successful"))
        }
        Some("refresh_token") => {
            let req: RefreshRequest = parse_body(body)?;
            let pair = services::refresh(&state, &req.refresh_token).await?;
            Ok(success(pair.into(), "Token refreshed successfully"))
        }
        _ => Err(AppError::validation("invalid grant_type")),
    }
}

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::auth::{claims::Principal, jwt::JwtKeys};
use crate::error::AppError;

/// Validated bearer access token, resolved to the principal in its snapshot.
/// Take `Result<AuthUser, AppError>` to let the guard decide what an
/// anonymous caller may do.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

/// The header must be exactly `<scheme> <token>` with scheme `Bearer`.
pub(crate) fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let value = header.ok_or(AppError::MissingToken)?;
    let mut segments = value.split_whitespace();
    match (segments.next(), segments.next(), segments.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AppError::MissingToken),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtKeys>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<JwtKeys>::from_ref(state);
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = bearer_token(header)?;

        let principal = keys.verify_access(token).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            e
        })?;
        Ok(AuthUser(principal))
    }
}

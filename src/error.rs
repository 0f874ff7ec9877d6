use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::response::ApiResponse;

/// Every failure the API can surface. Authentication and authorization
/// kinds map onto 401/403; validation onto 400.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token claims")]
    MalformedClaims,
    #[error("invalid credentials")]
    InvalidCredential,
    #[error("account is not active")]
    AccountNotActive,
    #[error("authentication required")]
    Unauthorized,
    #[error("insufficient permission")]
    Forbidden,
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("{0}")]
    ValidationFailed(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("movie metadata service unavailable")]
    MetadataUnavailable,
    #[error("storage unavailable")]
    StoreUnavailable(#[from] sqlx::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken
            | Self::MalformedToken(_)
            | Self::InvalidSignature
            | Self::Expired
            | Self::MalformedClaims
            | Self::InvalidCredential
            | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AccountNotActive | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::DuplicateEmail | Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MetadataUnavailable => StatusCode::BAD_GATEWAY,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn envelope_status(&self) -> &'static str {
        match self.status_code() {
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "forbidden",
            _ => "error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::StoreUnavailable(e) => error!(error = %e, "storage call failed"),
            Self::Internal(e) => error!(error = %e, "internal error"),
            _ => {}
        }
        let body = ApiResponse::<()> {
            status: self.envelope_status(),
            message: self.to_string(),
            data: None,
            metadata: None,
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_401_and_403() {
        assert_eq!(AppError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Expired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::AccountNotActive.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::DuplicateEmail.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failures_are_not_reported_as_absence() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppError::MetadataUnavailable.status_code(), StatusCode::BAD_GATEWAY);
    }
}

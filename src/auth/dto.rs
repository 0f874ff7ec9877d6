use serde::{Deserialize, Serialize};

use crate::auth::token_store::TokenPair;

#[derive(Debug, Deserialize)]
pub struct GrantQuery {
    pub grant_type: Option<String>,
}

/// Body for `grant_type=password`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for `grant_type=refresh_token`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(p: TokenPair) -> Self {
        Self {
            access_token: p.access_token,
            refresh_token: p.refresh_token,
        }
    }
}

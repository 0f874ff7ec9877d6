use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::{AccountStatus, Role, User};

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// User attributes frozen into a token at issuance. Trusted until the
/// token expires, even if the account changes in the meantime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimSnapshot {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub status: AccountStatus,
    pub role: Role,
}

impl From<&User> for ClaimSnapshot {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            status: u.status,
            role: u.role,
        }
    }
}

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,          // user ID
    pub iat: i64,           // issued at (unix timestamp)
    pub exp: i64,           // expires at (unix timestamp)
    pub kind: TokenKind,    // token type
    pub data: ClaimSnapshot,
}

/// Authenticated caller, drawn from a validated access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub phone: String,
    pub status: AccountStatus,
    pub role: Role,
}

impl From<ClaimSnapshot> for Principal {
    fn from(s: ClaimSnapshot) -> Self {
        Self {
            id: s.id,
            email: s.email,
            phone: s.phone,
            status: s.status,
            role: s.role,
        }
    }
}

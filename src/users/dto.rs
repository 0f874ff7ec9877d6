use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// `PUT /users` query: `action=update_status&status=..&id=..` or
/// `action=reset_password`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuery {
    pub action: Option<String>,
    pub status: Option<String>,
    pub id: Option<Uuid>,
}

/// Without `email` the caller's own account is reset.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
    pub current_password: String,
    pub new_password: String,
}

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{
        extractors::AuthUser,
        guard::{authorize, Action, Target},
    },
    error::AppError,
    extractors::{AppJson, AppPath, AppQuery},
    response::{success, ApiResponse},
    state::AppState,
    users::{
        dto::{ListQuery, PasswordResetRequest, RegisterQuery, RegisterRequest, UpdateQuery},
        repo_types::{AccountStatus, Role, User},
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register).put(update_user))
        .route("/users/:id", get(get_user).delete(delete_user))
}

fn parse_status(raw: &str) -> Result<AccountStatus, AppError> {
    raw.parse().map_err(AppError::ValidationFailed)
}

/// Self-service signup, or `?action=create_admin` for a superadmin.
#[instrument(skip(state, auth, body))]
pub async fn register(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<RegisterQuery>,
    auth: Result<AuthUser, AppError>,
    body: Result<AppJson<RegisterRequest>, AppError>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let role = match q.action.as_deref() {
        None => Role::User,
        Some("create_admin") => {
            let AuthUser(principal) = auth?;
            authorize(Some(&principal), Action::RegisterAdmin, &Target::none())?;
            Role::Admin
        }
        Some(other) => return Err(AppError::validation(format!("unknown action: {other}"))),
    };
    let AppJson(req) = body?;
    let user = services::register(&state, req, role).await?;
    Ok(success(user, "User registered successfully"))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    AppQuery(q): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let status = parse_status(q.status.as_deref().unwrap_or("active"))?;
    let users = services::list_users(&state, &principal, status).await?;
    Ok(success(users, "Operation Successful"))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = services::get_user(&state, &principal, id).await?;
    Ok(success(user, "Operation Successful"))
}

/// `?action=update_status&status=..&id=..` or `?action=reset_password`.
#[instrument(skip(state, auth, body))]
pub async fn update_user(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<UpdateQuery>,
    auth: Result<AuthUser, AppError>,
    body: Result<AppJson<PasswordResetRequest>, AppError>,
) -> Result<Json<ApiResponse<Option<User>>>, AppError> {
    match q.action.as_deref() {
        Some("update_status") => {
            let AuthUser(principal) = auth?;
            let id = q.id.ok_or_else(|| AppError::validation("id is required"))?;
            let status = parse_status(
                q.status
                    .as_deref()
                    .ok_or_else(|| AppError::validation("status is required"))?,
            )?;
            let user = services::change_status(&state, &principal, id, status).await?;
            Ok(success(Some(user), "Status updated successfully"))
        }
        Some("reset_password") => {
            let AppJson(req) = body?;
            let principal = auth.ok().map(|AuthUser(p)| p);
            services::reset_password(&state, principal.as_ref(), req).await?;
            Ok(success(None, "Password reset successfully"))
        }
        _ => Err(AppError::validation("invalid action")),
    }
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = services::soft_delete(&state, &principal, id).await?;
    Ok(success(user, "User deleted successfully"))
}

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{
    claims::Principal,
    guard::{authorize, Action, Target},
    password::{check_strength, hash_password, verify_password},
};
use crate::config::BootstrapAdmin;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::{
    dto::{PasswordResetRequest, RegisterRequest},
    repo_types::{AccountStatus, Role, User},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates an active account with `role`. Callers decide who may create
/// which role.
pub async fn register(state: &AppState, req: RegisterRequest, role: Role) -> Result<User, AppError> {
    let email = normalize_email(&req.email);
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(AppError::validation("first and last name are required"));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::validation("email is not valid"));
    }
    check_strength(&req.password)?;

    if let Some(existing) = state.users.find_by_email(&email).await? {
        if existing.status != AccountStatus::Deleted {
            warn!(%email, "email already registered");
            return Err(AppError::DuplicateEmail);
        }
    }

    let now = OffsetDateTime::now_utc();
    let user = User {
        id: Uuid::new_v4(),
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email,
        phone: req.phone.trim().to_string(),
        password_hash: hash_password(&req.password)?,
        status: AccountStatus::Active,
        role,
        created_at: now,
        updated_at: now,
    };
    state.users.insert(&user).await?;

    info!(user_id = %user.id, role = %role, "user registered");
    Ok(user)
}

/// Seeds the configured superadmin unless some account already holds the email.
pub async fn bootstrap_superadmin(state: &AppState, admin: &BootstrapAdmin) -> Result<(), AppError> {
    if state
        .users
        .find_by_email(&normalize_email(&admin.email))
        .await?
        .is_some()
    {
        debug!("superadmin already present");
        return Ok(());
    }
    let req = RegisterRequest {
        first_name: admin.first_name.clone(),
        last_name: admin.last_name.clone(),
        email: admin.email.clone(),
        phone: admin.phone.clone(),
        password: admin.password.clone(),
    };
    register(state, req, Role::Superadmin).await?;
    Ok(())
}

pub async fn get_user(state: &AppState, principal: &Principal, id: Uuid) -> Result<User, AppError> {
    authorize(Some(principal), Action::ViewUser, &Target::owned_by(id))?;
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("user"))
}

pub async fn list_users(
    state: &AppState,
    principal: &Principal,
    status: AccountStatus,
) -> Result<Vec<User>, AppError> {
    authorize(Some(principal), Action::ListUsers, &Target::none())?;
    if status == AccountStatus::Deleted {
        return Err(AppError::validation("status must be active or inactive"));
    }
    state.users.list_by_status(status).await
}

async fn apply_status(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    next: AccountStatus,
    action: Action,
) -> Result<User, AppError> {
    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    authorize(Some(principal), action, &Target::account(user.id, user.role))?;

    let status = user.status.transition(next)?;
    if status != user.status {
        state.users.update_status(user.id, status).await?;
        info!(user_id = %user.id, by = %principal.id, from = %user.status, to = %status, "account status changed");
        user.status = status;
    }
    Ok(user)
}

pub async fn change_status(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    next: AccountStatus,
) -> Result<User, AppError> {
    // deletion goes through soft_delete and its own permission
    if next == AccountStatus::Deleted {
        return Err(AppError::validation("status must be active or inactive"));
    }
    apply_status(state, principal, id, next, Action::ChangeUserStatus).await
}

/// Marks the account deleted. Records are never removed.
pub async fn soft_delete(state: &AppState, principal: &Principal, id: Uuid) -> Result<User, AppError> {
    apply_status(state, principal, id, AccountStatus::Deleted, Action::DeleteUser).await
}

/// Resets the password of the account named by `req.email`, or of the
/// caller's own account when no email is given.
pub async fn reset_password(
    state: &AppState,
    principal: Option<&Principal>,
    req: PasswordResetRequest,
) -> Result<(), AppError> {
    check_strength(&req.new_password)?;

    let user = match req.email.as_deref() {
        Some(email) => state
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredential)?,
        None => {
            authorize(principal, Action::ResetOwnPassword, &Target::none())?;
            let id = principal.map(|p| p.id).ok_or(AppError::Unauthorized)?;
            state
                .users
                .find_by_id(id)
                .await?
                .ok_or(AppError::Unauthorized)?
        }
    };

    if !user.status.can_authenticate() {
        return Err(AppError::AccountNotActive);
    }
    if !verify_password(&req.current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "password reset with wrong current password");
        return Err(AppError::InvalidCredential);
    }

    let hash = hash_password(&req.new_password)?;
    state.users.update_password(user.id, &hash).await?;
    info!(user_id = %user.id, "password reset");
    Ok(())
}

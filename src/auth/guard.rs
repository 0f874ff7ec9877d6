//! Role and ownership policy. Every authorization decision in the API goes
//! through [`authorize`]; handlers never compare roles themselves.

use tracing::warn;
use uuid::Uuid;

use crate::auth::claims::Principal;
use crate::error::AppError;
use crate::users::repo_types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Authenticated,
    SelfOrElevated,
    ElevatedOnly,
    SuperadminOnly,
    OwnerOrElevated,
    /// Admins may change the status of `user` accounts only.
    StatusChangeCeiling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewUser,
    ListUsers,
    RegisterAdmin,
    ChangeUserStatus,
    DeleteUser,
    ResetOwnPassword,
    PostReview,
    DeleteReview,
    PostComment,
    DeleteComment,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::ViewUser,
        Action::ListUsers,
        Action::RegisterAdmin,
        Action::ChangeUserStatus,
        Action::DeleteUser,
        Action::ResetOwnPassword,
        Action::PostReview,
        Action::DeleteReview,
        Action::PostComment,
        Action::DeleteComment,
    ];

    pub const fn policy(self) -> Policy {
        match self {
            Action::ViewUser => Policy::SelfOrElevated,
            Action::ListUsers => Policy::ElevatedOnly,
            Action::RegisterAdmin => Policy::SuperadminOnly,
            Action::ChangeUserStatus | Action::DeleteUser => Policy::StatusChangeCeiling,
            Action::ResetOwnPassword | Action::PostReview | Action::PostComment => {
                Policy::Authenticated
            }
            Action::DeleteReview | Action::DeleteComment => Policy::OwnerOrElevated,
        }
    }
}

/// What the action is applied to. For user accounts `owner_id` is the
/// account id itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Target {
    pub owner_id: Option<Uuid>,
    pub role: Option<Role>,
}

impl Target {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn account(id: Uuid, role: Role) -> Self {
        Self {
            owner_id: Some(id),
            role: Some(role),
        }
    }

    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
            role: None,
        }
    }
}

fn allows(policy: Policy, p: &Principal, target: &Target) -> bool {
    let is_owner = target.owner_id == Some(p.id);
    match policy {
        Policy::Authenticated => true,
        Policy::SelfOrElevated | Policy::OwnerOrElevated => is_owner || p.role.is_elevated(),
        Policy::ElevatedOnly => p.role.is_elevated(),
        Policy::SuperadminOnly => p.role == Role::Superadmin,
        Policy::StatusChangeCeiling => match p.role {
            Role::Superadmin => true,
            Role::Admin => target.role == Some(Role::User),
            Role::User => false,
        },
    }
}

pub fn authorize(principal: Option<&Principal>, action: Action, target: &Target) -> Result<(), AppError> {
    let Some(p) = principal else {
        return Err(AppError::Unauthorized);
    };
    if allows(action.policy(), p, target) {
        Ok(())
    } else {
        warn!(user_id = %p.id, role = %p.role, ?action, "forbidden");
        Err(AppError::Forbidden)
    }
}

//! Account status state machine.
//!
//! ```text
//! active <-> inactive
//! active  -> deleted (terminal)
//! ```

use crate::error::AppError;

use super::repo_types::AccountStatus;

impl AccountStatus {
    /// Only active accounts may log in or refresh tokens.
    pub fn can_authenticate(self) -> bool {
        self == AccountStatus::Active
    }

    /// Validates a transition and returns the resulting status.
    /// Re-applying the current status of a live account is a no-op.
    pub fn transition(self, next: AccountStatus) -> Result<AccountStatus, AppError> {
        use AccountStatus::*;
        match (self, next) {
            (Active, Active) | (Inactive, Active) => Ok(Active),
            (Active, Inactive) | (Inactive, Inactive) => Ok(Inactive),
            (Active, Deleted) => Ok(Deleted),
            (Deleted, _) => Err(AppError::validation("account is deleted")),
            (Inactive, Deleted) => Err(AppError::validation(
                "only active accounts can be deleted",
            )),
        }
    }
}

use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub review_id: Uuid,
    pub comment: String,
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.comment.trim().is_empty() {
            return Err(AppError::validation("comment is not provided"));
        }
        Ok(())
    }
}

use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub movie_id: Uuid,
    pub review_title: String,
    pub description: String,
}

impl CreateReviewRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.review_title.trim().is_empty() {
            return Err(AppError::validation("review title is not provided"));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::validation("review description is not provided"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub title: Option<String>,
}

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub movie_id: Uuid,
    // copied from the catalog when posted
    pub movie_title: String,
    pub reviewer_id: Uuid,
    pub reviewer_email: String,
    pub review_title: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

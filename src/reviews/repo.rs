use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::AppError;
use crate::reviews::repo_types::Review;

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert(&self, review: &Review) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, AppError>;
    /// Newest first; `title` matches the movie title case-insensitively.
    /// Returns the page and the total number of matches.
    async fn search(
        &self,
        title: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), AppError>;
    /// Also removes the review's comments. `false` when nothing matched.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn insert(&self, review: &Review) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO reviews
                (id, movie_id, movie_title, reviewer_id, reviewer_email, review_title, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(review.id)
        .bind(&review.movie_id)
        .bind(&review.movie_title)
        .bind(review.reviewer_id)
        .bind(&review.reviewer_email)
        .bind(&review.review_title)
        .bind(&review.description)
        .bind(review.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, movie_id, movie_title, reviewer_id, reviewer_email, review_title, description, created_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn search(
        &self,
        title: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), AppError> {
        let title = title.unwrap_or("");
        let rows = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, movie_id, movie_title, reviewer_id, reviewer_email, review_title, description, created_at
            FROM reviews
            WHERE strpos(lower(movie_title), lower($1)) > 0
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(title)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reviews WHERE strpos(lower(movie_title), lower($1)) > 0",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await?;
        Ok((rows, total))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        // comments go with it through ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::comments::repo_types::Comment;
use crate::db::PgStore;
use crate::error::AppError;

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert(&self, comment: &Comment) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, AppError>;
    /// Oldest first, with the total count for the review.
    async fn list_by_review(
        &self,
        review_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Comment>, i64), AppError>;
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
impl CommentStore for PgStore {
    async fn insert(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO comments
                (id, movie_id, review_id, commenter_id, commenter_email, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(comment.id)
        .bind(&comment.movie_id)
        .bind(comment.review_id)
        .bind(comment.commenter_id)
        .bind(&comment.commenter_email)
        .bind(&comment.comment)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, movie_id, review_id, commenter_id, commenter_email, comment, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn list_by_review(
        &self,
        review_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Comment>, i64), AppError> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, movie_id, review_id, commenter_id, commenter_email, comment, created_at
            FROM comments
            WHERE review_id = $1
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(review_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = $1")
            .bind(review_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((rows, total))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::AppError;

/// The latest pair issued to a user. Overwriting it does not revoke the
/// previous pair; those tokens stay verifiable until their own expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TokenPair {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Atomic replace keyed by user id; concurrent writers are last-write-wins.
    async fn upsert(&self, pair: &TokenPair) -> Result<(), AppError>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<TokenPair>, AppError>;
}

#[async_trait]
impl TokenStore for PgStore {
    async fn upsert(&self, pair: &TokenPair) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO token_pairs (user_id, access_token, refresh_token, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(pair.user_id)
        .bind(&pair.access_token)
        .bind(&pair.refresh_token)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<TokenPair>, AppError> {
        let pair = sqlx::query_as::<_, TokenPair>(
            "SELECT user_id, access_token, refresh_token FROM token_pairs WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pair)
    }
}

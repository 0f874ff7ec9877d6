use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::token_store::{TokenPair, TokenStore};
use crate::comments::{repo::CommentStore, repo_types::Comment};
use crate::error::AppError;
use crate::movies::{repo::MovieStore, repo_types::Movie};
use crate::reviews::{repo::ReviewStore, repo_types::Review};
use crate::users::{
    repo::UserStore,
    repo_types::{AccountStatus, User},
};

/// In-process implementation of every store trait.
///
/// Used with `STORAGE=memory` and in tests. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    tokens: RwLock<HashMap<Uuid, TokenPair>>,
    reviews: RwLock<HashMap<Uuid, Review>>,
    comments: RwLock<HashMap<Uuid, Comment>>,
    movies: RwLock<HashMap<Uuid, Movie>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let rows = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (rows, total)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        let found = users
            .values()
            .filter(|u| u.email == email)
            .min_by_key(|u| {
                (
                    u.status == AccountStatus::Deleted,
                    std::cmp::Reverse(u.created_at),
                )
            })
            .cloned();
        Ok(found)
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn list_by_status(&self, status: AccountStatus) -> Result<Vec<User>, AppError> {
        let mut list: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.status == status)
            .cloned()
            .collect();
        list.sort_by_key(|u| u.created_at);
        Ok(list)
    }

    async fn update_status(&self, id: Uuid, status: AccountStatus) -> Result<(), AppError> {
        if let Some(u) = self.users.write().await.get_mut(&id) {
            u.status = status;
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        if let Some(u) = self.users.write().await.get_mut(&id) {
            u.password_hash = password_hash.to_string();
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn upsert(&self, pair: &TokenPair) -> Result<(), AppError> {
        self.tokens.write().await.insert(pair.user_id, pair.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<TokenPair>, AppError> {
        Ok(self.tokens.read().await.get(&user_id).cloned())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert(&self, review: &Review) -> Result<(), AppError> {
        self.reviews.write().await.insert(review.id, review.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        Ok(self.reviews.read().await.get(&id).cloned())
    }

    async fn search(
        &self,
        title: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), AppError> {
        let needle = title.unwrap_or("").to_lowercase();
        let mut hits: Vec<Review> = self
            .reviews
            .read()
            .await
            .values()
            .filter(|r| r.movie_title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(hits, limit, offset))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let removed = self.reviews.write().await.remove(&id).is_some();
        if removed {
            self.comments.write().await.retain(|_, c| c.review_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert(&self, comment: &Comment) -> Result<(), AppError> {
        self.comments.write().await.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, AppError> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn list_by_review(
        &self,
        review_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Comment>, i64), AppError> {
        let mut list: Vec<Comment> = self
            .comments
            .read()
            .await
            .values()
            .filter(|c| c.review_id == review_id)
            .cloned()
            .collect();
        list.sort_by_key(|c| c.created_at);
        Ok(page(list, limit, offset))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.comments.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, AppError> {
        Ok(self.movies.read().await.get(&id).cloned())
    }

    async fn insert_if_absent(&self, movie: &Movie) -> Result<bool, AppError> {
        let mut movies = self.movies.write().await;
        let title = movie.title.to_lowercase();
        if movies.values().any(|m| m.title.to_lowercase() == title) {
            return Ok(false);
        }
        movies.insert(movie.id, movie.clone());
        Ok(true)
    }

    async fn search(
        &self,
        title: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Movie>, i64), AppError> {
        let needle = title.unwrap_or("").to_lowercase();
        let mut hits: Vec<Movie> = self
            .movies
            .read()
            .await
            .values()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by_key(|m| m.title.to_lowercase());
        Ok(page(hits, limit, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;
    use time::macros::datetime;

    fn user(email: &str, status: AccountStatus, created_at: OffsetDateTime) -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            phone: "0000".into(),
            password_hash: "x".into(),
            status,
            role: Role::User,
            created_at,
            updated_at: created_at,
        }
    }

    fn review(title: &str, created_at: OffsetDateTime) -> Review {
        Review {
            id: Uuid::new_v4(),
            movie_id: Uuid::new_v4(),
            movie_title: title.into(),
            reviewer_id: Uuid::new_v4(),
            reviewer_email: "r@example.com".into(),
            review_title: "t".into(),
            description: "d".into(),
            created_at,
        }
    }

    #[tokio::test]
    async fn email_lookup_prefers_live_account_over_deleted() {
        let store = MemoryStore::new();
        let old = user("a@example.com", AccountStatus::Deleted, datetime!(2024-01-02 0:00 UTC));
        let live = user("a@example.com", AccountStatus::Inactive, datetime!(2024-01-01 0:00 UTC));
        UserStore::insert(&store, &old).await.unwrap();
        UserStore::insert(&store, &live).await.unwrap();

        let found = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, live.id);
        assert!(store.find_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn token_upsert_overwrites_previous_pair() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let first = TokenPair { user_id, access_token: "a1".into(), refresh_token: "r1".into() };
        let second = TokenPair { user_id, access_token: "a2".into(), refresh_token: "r2".into() };
        store.upsert(&first).await.unwrap();
        store.upsert(&second).await.unwrap();
        assert_eq!(store.find_by_user(user_id).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_newest_first_and_paged() {
        let store = MemoryStore::new();
        let a = review("The Matrix", datetime!(2024-01-01 0:00 UTC));
        let b = review("Matrix Reloaded", datetime!(2024-01-02 0:00 UTC));
        let c = review("Heat", datetime!(2024-01-03 0:00 UTC));
        for r in [&a, &b, &c] {
            ReviewStore::insert(&store, r).await.unwrap();
        }

        let (rows, total) = ReviewStore::search(&store, Some("matrix"), 10, 0).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![b.id, a.id]);

        let (rows, total) = ReviewStore::search(&store, None, 1, 1).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows[0].id, b.id);
    }

    #[tokio::test]
    async fn deleting_review_drops_its_comments() {
        let store = MemoryStore::new();
        let r = review("Heat", datetime!(2024-01-01 0:00 UTC));
        ReviewStore::insert(&store, &r).await.unwrap();
        let comment = Comment {
            id: Uuid::new_v4(),
            movie_id: r.movie_id,
            review_id: r.id,
            commenter_id: Uuid::new_v4(),
            commenter_email: "c@example.com".into(),
            comment: "agreed".into(),
            created_at: datetime!(2024-01-02 0:00 UTC),
        };
        CommentStore::insert(&store, &comment).await.unwrap();

        assert!(ReviewStore::delete(&store, r.id).await.unwrap());
        assert!(CommentStore::find_by_id(&store, comment.id).await.unwrap().is_none());
        assert!(!ReviewStore::delete(&store, r.id).await.unwrap());
    }
}

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::AuthUser,
        guard::{authorize, Action, Target},
    },
    comments::{dto::CreateCommentRequest, repo_types::Comment},
    error::AppError,
    extractors::{AppJson, AppPath},
    response::{success, ApiResponse},
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", post(post_comment))
        .route("/comments/:id", get(get_comment).delete(delete_comment))
}

#[instrument(skip(state))]
pub async fn get_comment(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Comment>>, AppError> {
    let comment = state
        .comments
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    Ok(success(comment, "Operation Successful"))
}

#[instrument(skip(state, body))]
pub async fn post_comment(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    AppJson(body): AppJson<CreateCommentRequest>,
) -> Result<Json<ApiResponse<Comment>>, AppError> {
    authorize(Some(&principal), Action::PostComment, &Target::none())?;
    body.validate()?;

    let review = state
        .reviews
        .find_by_id(body.review_id)
        .await?
        .ok_or(AppError::NotFound("review"))?;

    let comment = Comment {
        id: Uuid::new_v4(),
        movie_id: review.movie_id,
        review_id: review.id,
        commenter_id: principal.id,
        commenter_email: principal.email.clone(),
        comment: body.comment,
        created_at: OffsetDateTime::now_utc(),
    };
    state.comments.insert(&comment).await?;

    info!(comment_id = %comment.id, review_id = %review.id, user_id = %principal.id, "comment posted");
    Ok(success(comment, "Comment posted successfully"))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    let comment = state
        .comments
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    authorize(
        Some(&principal),
        Action::DeleteComment,
        &Target::owned_by(comment.commenter_id),
    )?;

    if !state.comments.delete(id).await? {
        return Err(AppError::NotFound("comment"));
    }
    info!(comment_id = %id, user_id = %principal.id, "comment deleted");
    Ok(success(id, "Comment deleted successfully"))
}

#[cfg(test)]
mod tests {
    use crate::app::tests::{bearer, call};
    use crate::auth::services::tests::seed_user;
    use crate::movies::{repo_types::Movie, services::tests::seed_movie};
    use crate::state::AppState;
    use crate::users::repo_types::{AccountStatus, Role, User};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    async fn post_review(state: &AppState, author: &User, movie: &Movie) -> String {
        let (_, body) = call(
            state,
            Method::POST,
            "/api/v1/reviews",
            Some(bearer(state, author)),
            Some(json!({
                "movie_id": movie.id,
                "review_title": "Tense",
                "description": "The bank scene."
            })),
        )
        .await;
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn post_comment(state: &AppState, author: &User, review_id: &str, movie: &Movie) -> String {
        let (status, body) = call(
            state,
            Method::POST,
            "/api/v1/comments",
            Some(bearer(state, author)),
            Some(json!({"review_id": review_id, "comment": "agreed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["movie_id"], movie.id.to_string());
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn comment_deletion_follows_ownership() {
        let state = AppState::fake();
        let a = seed_user(&state, "a@example.com", "password1", Role::User, AccountStatus::Active).await;
        let b = seed_user(&state, "b@example.com", "password1", Role::User, AccountStatus::Active).await;
        let admin = seed_user(&state, "mod@example.com", "password1", Role::Admin, AccountStatus::Active).await;
        let heat = seed_movie(&state, "Heat").await;
        let review_id = post_review(&state, &a, &heat).await;

        let own = post_comment(&state, &a, &review_id, &heat).await;
        let (status, _) = call(&state, Method::DELETE, &format!("/api/v1/comments/{own}"), Some(bearer(&state, &a)), None).await;
        assert_eq!(status, StatusCode::OK);

        let theirs = post_comment(&state, &b, &review_id, &heat).await;
        let uri = format!("/api/v1/comments/{theirs}");
        let (status, _) = call(&state, Method::DELETE, &uri, Some(bearer(&state, &a)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&state, Method::DELETE, &uri, Some(bearer(&state, &admin)), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn comments_need_an_existing_review_and_list_oldest_first() {
        let state = AppState::fake();
        let a = seed_user(&state, "a@example.com", "password1", Role::User, AccountStatus::Active).await;

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/v1/comments",
            Some(bearer(&state, &a)),
            Some(json!({"review_id": uuid::Uuid::new_v4(), "comment": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let heat = seed_movie(&state, "Heat").await;
        let review_id = post_review(&state, &a, &heat).await;
        let first = post_comment(&state, &a, &review_id, &heat).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        post_comment(&state, &a, &review_id, &heat).await;

        let (status, body) = call(&state, Method::GET, &format!("/api/v1/reviews/{review_id}/comments"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_metadata"]["total_count"], 2);
        assert_eq!(body["data"][0]["id"], first.as_str());

        let (status, body) = call(&state, Method::POST, "/api/v1/comments", Some(bearer(&state, &a)), Some(json!({"comment": "no review"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }
}

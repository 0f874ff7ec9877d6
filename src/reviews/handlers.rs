use axum::{
    extract::{OriginalUri, State},
    routing::get,
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
    comments::repo_types::Comment,
    error::AppError,
    extractors::{AppJson, AppPath, AppQuery},
    response::{paged, success, ApiResponse, MetaData, Pagination},
    reviews::{
        dto::{CreateReviewRequest, SearchQuery},
        repo_types::Review,
    },
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(search_reviews).post(post_review))
        .route("/reviews/:id", get(get_review).delete(delete_review))
        .route("/reviews/:id/comments", get(list_review_comments))
}

#[instrument(skip(state, uri))]
pub async fn search_reviews(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    AppQuery(q): AppQuery<SearchQuery>,
    AppQuery(p): AppQuery<Pagination>,
) -> Result<Json<ApiResponse<Vec<Review>>>, AppError> {
    let p = p.clamped();
    let title = q.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let (reviews, total) = state.reviews.search(title, p.limit, p.offset()).await?;

    let filters: Vec<(&str, &str)> = title.map(|t| ("title", t)).into_iter().collect();
    let meta = MetaData::build(uri.path(), &filters, &p, total, reviews.len() as i64);
    Ok(paged(reviews, meta))
}

#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Review>>, AppError> {
    let review = state
        .reviews
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("review"))?;
    Ok(success(review, "Operation Successful"))
}

#[instrument(skip(state, body))]
pub async fn post_review(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    AppJson(body): AppJson<CreateReviewRequest>,
) -> Result<Json<ApiResponse<Review>>, AppError> {
    authorize(Some(&principal), Action::PostReview, &Target::none())?;
    body.validate()?;
    let movie = state
        .movies
        .find_by_id(body.movie_id)
        .await?
        .ok_or(AppError::NotFound("movie"))?;

    let review = Review {
        id: Uuid::new_v4(),
        movie_id: movie.id,
        movie_title: movie.title,
        reviewer_id: principal.id,
        reviewer_email: principal.email.clone(),
        review_title: body.review_title,
        description: body.description,
        created_at: OffsetDateTime::now_utc(),
    };
    state.reviews.insert(&review).await?;

    info!(review_id = %review.id, user_id = %principal.id, "review posted");
    Ok(success(review, "Review posted successfully"))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    let review = state
        .reviews
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("review"))?;
    authorize(Some(&principal), Action::DeleteReview, &Target::owned_by(review.reviewer_id))?;

    if !state.reviews.delete(id).await? {
        return Err(AppError::NotFound("review"));
    }
    info!(review_id = %id, user_id = %principal.id, "review deleted");
    Ok(success(id, "Review deleted successfully"))
}

#[instrument(skip(state, uri))]
pub async fn list_review_comments(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    AppPath(id): AppPath<Uuid>,
    AppQuery(p): AppQuery<Pagination>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, AppError> {
    let p = p.clamped();
    state
        .reviews
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("review"))?;

    let (comments, total) = state.comments.list_by_review(id, p.limit, p.offset()).await?;
    let meta = MetaData::build(uri.path(), &[], &p, total, comments.len() as i64);
    Ok(paged(comments, meta))
}

#[cfg(test)]
mod tests {
    use crate::app::tests::{bearer, call};
    use crate::auth::services::tests::seed_user;
    use crate::movies::services::tests::seed_movie;
    use crate::state::AppState;
    use crate::users::repo_types::{AccountStatus, Role};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn review(movie_id: Uuid) -> Value {
        json!({
            "movie_id": movie_id,
            "review_title": "Still holds up",
            "description": "Great effects."
        })
    }

    #[tokio::test]
    async fn posting_requires_a_bearer() {
        let state = AppState::fake();
        let movie = seed_movie(&state, "The Matrix").await;
        let (status, _) = call(&state, Method::POST, "/api/v1/reviews", None, Some(review(movie.id))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn search_pages_with_metadata() {
        let state = AppState::fake();
        let ann = seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Active).await;
        let token = bearer(&state, &ann);
        for title in ["The Matrix", "Matrix Reloaded", "Heat"] {
            let movie = seed_movie(&state, title).await;
            let (status, body) = call(&state, Method::POST, "/api/v1/reviews", Some(token.clone()), Some(review(movie.id))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["reviewer_email"], "ann@example.com");
            assert_eq!(body["data"]["movie_title"], title);
        }

        let (status, body) = call(&state, Method::GET, "/api/v1/reviews?title=MATRIX&limit=1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["_metadata"]["total_count"], 2);
        assert_eq!(body["_metadata"]["per_page"], 1);
        assert_eq!(body["_metadata"]["links"][1]["next"], "/api/v1/reviews?title=MATRIX&page=1&limit=1");
    }

    #[tokio::test]
    async fn review_needs_a_catalogued_movie() {
        let state = AppState::fake();
        let ann = seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Active).await;
        let (status, body) = call(&state, Method::POST, "/api/v1/reviews", Some(bearer(&state, &ann)), Some(review(Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "movie not found");
    }

    #[tokio::test]
    async fn bad_input_gets_the_error_envelope() {
        let state = AppState::fake();
        let ann = seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Active).await;

        let (status, body) = call(&state, Method::POST, "/api/v1/reviews", Some(bearer(&state, &ann)), Some(json!({"movie_id": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["data"].is_null());

        for uri in ["/api/v1/reviews/not-a-uuid", "/api/v1/reviews?page=abc", "/api/v1/reviews?limit=-"] {
            let (status, body) = call(&state, Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["status"], "error", "{uri}");
        }
    }

    #[tokio::test]
    async fn huge_page_is_an_empty_page() {
        let state = AppState::fake();
        let (status, body) = call(&state, Method::GET, "/api/v1/reviews?page=9223372036854775807&limit=10", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn only_owner_or_elevated_deletes() {
        let state = AppState::fake();
        let ann = seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Active).await;
        let bob = seed_user(&state, "bob@example.com", "password1", Role::User, AccountStatus::Active).await;
        let admin = seed_user(&state, "mod@example.com", "password1", Role::Admin, AccountStatus::Active).await;
        let movie = seed_movie(&state, "Heat").await;

        let (_, body) = call(&state, Method::POST, "/api/v1/reviews", Some(bearer(&state, &ann)), Some(review(movie.id))).await;
        let uri = format!("/api/v1/reviews/{}", body["data"]["id"].as_str().unwrap());

        let (status, _) = call(&state, Method::DELETE, &uri, Some(bearer(&state, &bob)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&state, Method::DELETE, &uri, Some(bearer(&state, &admin)), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&state, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

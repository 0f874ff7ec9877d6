use axum::{
    extract::{OriginalUri, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::AppError,
    extractors::{AppPath, AppQuery},
    movies::{dto::MovieSearchQuery, repo_types::Movie, services},
    response::{paged, success, ApiResponse, MetaData, Pagination},
    state::AppState,
};

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(search_movies))
        .route("/movies/:id", get(get_movie))
}

#[instrument(skip(state, uri))]
pub async fn search_movies(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    AppQuery(q): AppQuery<MovieSearchQuery>,
    AppQuery(p): AppQuery<Pagination>,
) -> Result<Json<ApiResponse<Vec<Movie>>>, AppError> {
    let p = p.clamped();
    let title = q.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let (movies, total) = services::search_movies(&state, title, &p).await?;

    let filters: Vec<(&str, &str)> = title.map(|t| ("title", t)).into_iter().collect();
    let meta = MetaData::build(uri.path(), &filters, &p, total, movies.len() as i64);
    Ok(paged(movies, meta))
}

#[instrument(skip(state))]
pub async fn get_movie(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Movie>>, AppError> {
    let movie = services::get_movie(&state, id).await?;
    Ok(success(movie, "Success"))
}

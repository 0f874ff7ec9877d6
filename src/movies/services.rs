use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::movies::repo_types::Movie;
use crate::response::Pagination;
use crate::state::AppState;

pub async fn get_movie(state: &AppState, id: Uuid) -> Result<Movie, AppError> {
    state
        .movies
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("movie"))
}

/// Searches the stored catalog. A title with no stored match is looked up
/// with the metadata provider, stored, and searched again; `NotFound` when
/// the provider does not know it either.
pub async fn search_movies(
    state: &AppState,
    title: Option<&str>,
    p: &Pagination,
) -> Result<(Vec<Movie>, i64), AppError> {
    let (rows, total) = state.movies.search(title, p.limit, p.offset()).await?;
    let Some(title) = title else {
        return Ok((rows, total));
    };
    if total > 0 {
        return Ok((rows, total));
    }

    import_by_title(state, title).await?;
    state.movies.search(Some(title), p.limit, p.offset()).await
}

async fn import_by_title(state: &AppState, title: &str) -> Result<(), AppError> {
    let Some(details) = state.metadata.lookup_title(title).await? else {
        debug!(%title, "no metadata for title");
        return Err(AppError::NotFound("movie"));
    };
    let movie = Movie::from_details(details, OffsetDateTime::now_utc());
    if state.movies.insert_if_absent(&movie).await? {
        info!(movie_id = %movie.id, title = %movie.title, "movie imported");
    }
    Ok(())
}

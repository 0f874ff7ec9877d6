use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::AppError;
use crate::movies::repo_types::Movie;

#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, AppError>;
    /// Inserts unless a movie with the same title (ignoring case) exists.
    /// Returns whether a row was written.
    async fn insert_if_absent(&self, movie: &Movie) -> Result<bool, AppError>;
    /// Case-insensitive substring match on the title, ordered by title.
    async fn search(
        &self,
        title: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Movie>, i64), AppError>;
}

const MOVIE_COLUMNS: &str = "id, title, year, released, runtime, genre, director, writer, actors, \
     plot, language, country, awards, poster, metascore, imdb_rating, imdb_votes, kind, \
     box_office, website, created_at";

#[async_trait]
impl MovieStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, AppError> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn insert_if_absent(&self, m: &Movie) -> Result<bool, AppError> {
        // movies_title_key is a unique index on lower(title)
        let res = sqlx::query(&format!(
            r#"
            INSERT INTO movies ({MOVIE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            ON CONFLICT DO NOTHING
            "#
        ))
        .bind(m.id)
        .bind(&m.title)
        .bind(&m.year)
        .bind(&m.released)
        .bind(&m.runtime)
        .bind(&m.genre)
        .bind(&m.director)
        .bind(&m.writer)
        .bind(&m.actors)
        .bind(&m.plot)
        .bind(&m.language)
        .bind(&m.country)
        .bind(&m.awards)
        .bind(&m.poster)
        .bind(&m.metascore)
        .bind(&m.imdb_rating)
        .bind(&m.imdb_votes)
        .bind(&m.kind)
        .bind(&m.box_office)
        .bind(&m.website)
        .bind(m.created_at)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn search(
        &self,
        title: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Movie>, i64), AppError> {
        let title = title.unwrap_or("");
        let rows = sqlx::query_as::<_, Movie>(&format!(
            r#"
            SELECT {MOVIE_COLUMNS}
            FROM movies
            WHERE strpos(lower(title), lower($1)) > 0
            ORDER BY title
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(title)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM movies WHERE strpos(lower(title), lower($1)) > 0",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await?;
        Ok((rows, total))
    }
}

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Descriptive fields as the metadata provider reports them. Values the
/// provider does not know are kept as it sends them (usually `N/A`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieDetails {
    pub title: String,
    pub year: String,
    pub released: String,
    pub runtime: String,
    pub genre: String,
    pub director: String,
    pub writer: String,
    pub actors: String,
    pub plot: String,
    pub language: String,
    pub country: String,
    pub awards: String,
    pub poster: String,
    pub metascore: String,
    pub imdb_rating: String,
    pub imdb_votes: String,
    pub kind: String,
    pub box_office: String,
    pub website: String,
}

/// A catalog entry. Reviews point at these by id.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub year: String,
    pub released: String,
    pub runtime: String,
    pub genre: String,
    pub director: String,
    pub writer: String,
    pub actors: String,
    pub plot: String,
    pub language: String,
    pub country: String,
    pub awards: String,
    pub poster: String,
    pub metascore: String,
    pub imdb_rating: String,
    pub imdb_votes: String,
    pub kind: String,
    pub box_office: String,
    pub website: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Movie {
    pub fn from_details(d: MovieDetails, created_at: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: d.title,
            year: d.year,
            released: d.released,
            runtime: d.runtime,
            genre: d.genre,
            director: d.director,
            writer: d.writer,
            actors: d.actors,
            plot: d.plot,
            language: d.language,
            country: d.country,
            awards: d.awards,
            poster: d.poster,
            metascore: d.metascore,
            imdb_rating: d.imdb_rating,
            imdb_votes: d.imdb_votes,
            kind: d.kind,
            box_office: d.box_office,
            website: d.website,
            created_at,
        }
    }
}

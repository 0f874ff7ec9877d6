//! Boundary to the external movie-metadata provider (OMDb).

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::MetadataConfig;
use crate::error::AppError;
use crate::movies::repo_types::MovieDetails;

#[async_trait]
pub trait MovieMetadata: Send + Sync {
    /// `Ok(None)` when the provider has no movie with that title.
    async fn lookup_title(&self, title: &str) -> Result<Option<MovieDetails>, AppError>;
}

/// Used when no provider is configured; only the stored catalog is searched.
#[derive(Debug, Default)]
pub struct NoMetadata;

#[async_trait]
impl MovieMetadata for NoMetadata {
    async fn lookup_title(&self, _title: &str) -> Result<Option<MovieDetails>, AppError> {
        Ok(None)
    }
}

pub struct OmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(cfg: &MetadataConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("build metadata http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
        })
    }
}

#[async_trait]
impl MovieMetadata for OmdbClient {
    async fn lookup_title(&self, title: &str) -> Result<Option<MovieDetails>, AppError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("t", title)])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "metadata request failed");
                AppError::MetadataUnavailable
            })?;

        if !res.status().is_success() {
            warn!(status = %res.status(), "metadata provider returned an error");
            return Err(AppError::MetadataUnavailable);
        }
        let body = res.json::<OmdbMovie>().await.map_err(|e| {
            warn!(error = %e, "metadata response did not parse");
            AppError::MetadataUnavailable
        })?;
        debug!(%title, found = body.response == "True", "metadata lookup");
        Ok(body.into_details())
    }
}

/// OMDb `?t=` response. A miss is `{"Response":"False","Error":"..."}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct OmdbMovie {
    response: String,
    title: String,
    year: String,
    released: String,
    runtime: String,
    genre: String,
    director: String,
    writer: String,
    actors: String,
    plot: String,
    language: String,
    country: String,
    awards: String,
    poster: String,
    metascore: String,
    #[serde(rename = "imdbRating")]
    imdb_rating: String,
    #[serde(rename = "imdbVotes")]
    imdb_votes: String,
    #[serde(rename = "Type")]
    kind: String,
    box_office: String,
    website: String,
}

impl OmdbMovie {
    fn into_details(self) -> Option<MovieDetails> {
        if self.response != "True" || self.title.trim().is_empty() {
            return None;
        }
        Some(MovieDetails {
            title: self.title,
            year: self.year,
            released: self.released,
            runtime: self.runtime,
            genre: self.genre,
            director: self.director,
            writer: self.writer,
            actors: self.actors,
            plot: self.plot,
            language: self.language,
            country: self.country,
            awards: self.awards,
            poster: self.poster,
            metascore: self.metascore,
            imdb_rating: self.imdb_rating,
            imdb_votes: self.imdb_votes,
            kind: self.kind,
            box_office: self.box_office,
            website: self.website,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves details from a fixed table, keyed by lowercase title.
    #[derive(Default)]
    pub(crate) struct StaticMetadata {
        pub(crate) movies: HashMap<String, MovieDetails>,
        pub(crate) calls: AtomicUsize,
    }

    impl StaticMetadata {
        pub(crate) fn with(titles: &[&str]) -> Self {
            let movies = titles
                .iter()
                .map(|t| {
                    let details = MovieDetails {
                        title: t.to_string(),
                        year: "1999".into(),
                        ..MovieDetails::default()
                    };
                    (t.to_lowercase(), details)
                })
                .collect();
            Self { movies, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl MovieMetadata for StaticMetadata {
        async fn lookup_title(&self, title: &str) -> Result<Option<MovieDetails>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.movies.get(&title.to_lowercase()).cloned())
        }
    }

    #[test]
    fn omdb_hit_maps_to_details() {
        let raw = r#"{
            "Title": "The Matrix", "Year": "1999", "Rated": "R", "Runtime": "136 min",
            "Genre": "Action, Sci-Fi", "Director": "Lana Wachowski, Lilly Wachowski",
            "imdbRating": "8.7", "imdbVotes": "2,000,000", "Type": "movie",
            "BoxOffice": "$172,076,928", "Response": "True"
        }"#;
        let details = serde_json::from_str::<OmdbMovie>(raw).unwrap().into_details().unwrap();
        assert_eq!(details.title, "The Matrix");
        assert_eq!(details.imdb_rating, "8.7");
        assert_eq!(details.kind, "movie");
        assert_eq!(details.box_office, "$172,076,928");
        assert_eq!(details.plot, "");
    }

    #[test]
    fn omdb_miss_is_none() {
        let raw = r#"{"Response": "False", "Error": "Movie not found!"}"#;
        assert!(serde_json::from_str::<OmdbMovie>(raw).unwrap().into_details().is_none());
    }
}

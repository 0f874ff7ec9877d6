use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MovieSearchQuery {
    pub title: Option<String>,
}

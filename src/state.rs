use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{jwt::JwtKeys, token_store::TokenStore};
use crate::comments::repo::CommentStore;
use crate::config::{AppConfig, StorageKind};
use crate::db::PgStore;
use crate::memory::MemoryStore;
use crate::movies::{
    metadata::{MovieMetadata, NoMetadata, OmdbClient},
    repo::MovieStore,
};
use crate::reviews::repo::ReviewStore;
use crate::users::repo::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: Arc<JwtKeys>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub comments: Arc<dyn CommentStore>,
    pub movies: Arc<dyn MovieStore>,
    pub metadata: Arc<dyn MovieMetadata>,
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let keys = Arc::new(JwtKeys::from_config(&config.jwt)?);
        let metadata: Arc<dyn MovieMetadata> = match &config.movie_metadata {
            Some(cfg) => Arc::new(OmdbClient::new(cfg)?),
            None => {
                tracing::warn!("OMDB_API_KEY is not set; movie search covers the stored catalog only");
                Arc::new(NoMetadata)
            }
        };

        match config.storage {
            StorageKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
                let store = Arc::new(PgStore::connect(url).await?);
                store.migrate().await?;
                Ok(Self::with_store(config, keys, store, metadata))
            }
            StorageKind::Memory => {
                tracing::warn!("using in-memory storage; data is lost on restart");
                Ok(Self::with_store(config, keys, Arc::new(MemoryStore::new()), metadata))
            }
        }
    }

    /// Wires one backend in for every store.
    pub fn with_store<S>(
        config: Arc<AppConfig>,
        keys: Arc<JwtKeys>,
        store: Arc<S>,
        metadata: Arc<dyn MovieMetadata>,
    ) -> Self
    where
        S: UserStore + TokenStore + ReviewStore + CommentStore + MovieStore + 'static,
    {
        Self {
            config,
            keys,
            users: store.clone(),
            tokens: store.clone(),
            reviews: store.clone(),
            comments: store.clone(),
            movies: store,
            metadata,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::auth::jwt::tests::{PRIVATE_PEM, PUBLIC_PEM};
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            storage: StorageKind::Memory,
            database_url: None,
            jwt: JwtConfig {
                private_key_pem: PRIVATE_PEM.into(),
                public_key_pem: PUBLIC_PEM.into(),
                access_ttl: std::time::Duration::from_secs(60),
            },
            bootstrap_admin: None,
            movie_metadata: None,
        });
        let keys = Arc::new(JwtKeys::from_config(&config.jwt).expect("test keys parse"));
        Self::with_store(config, keys, Arc::new(MemoryStore::new()), Arc::new(NoMetadata))
    }
}

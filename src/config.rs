use std::time::Duration;

use anyhow::Context;

/// Which persistence backend the process runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub private_key_pem: String,
    pub public_key_pem: String,
    pub access_ttl: Duration,
}

/// External movie-metadata provider; enabled by `OMDB_API_KEY`.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Superadmin seeded once at startup when no account holds the email.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub movie_metadata: Option<MetadataConfig>,
}

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let storage = match std::env::var("STORAGE")
            .unwrap_or_else(|_| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StorageKind::Postgres,
            "memory" => StorageKind::Memory,
            other => anyhow::bail!("unknown STORAGE backend: {other}"),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if storage == StorageKind::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required for the postgres backend");
        }

        let jwt = JwtConfig {
            private_key_pem: read_pem("JWT_PRIVATE_KEY")?,
            public_key_pem: read_pem("JWT_PUBLIC_KEY")?,
            access_ttl: token_lifetime(std::env::var("TOKEN_LIFETIME_MS").ok().as_deref())?,
        };

        Ok(Self {
            storage,
            database_url,
            jwt,
            bootstrap_admin: bootstrap_admin_from_env(),
            movie_metadata: metadata_from_env(),
        })
    }
}

/// Access-token lifetime in milliseconds; unset means one hour.
fn token_lifetime(raw: Option<&str>) -> anyhow::Result<Duration> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TOKEN_LIFETIME);
    };
    let ms: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("TOKEN_LIFETIME_MS is not a number of milliseconds: {raw:?}"))?;
    let ttl = Duration::from_millis(ms);
    if ttl.is_zero() {
        anyhow::bail!("TOKEN_LIFETIME_MS must be positive");
    }
    if ttl > MAX_TOKEN_LIFETIME {
        anyhow::bail!(
            "TOKEN_LIFETIME_MS must not exceed {} ms",
            MAX_TOKEN_LIFETIME.as_millis()
        );
    }
    Ok(ttl)
}

fn metadata_from_env() -> Option<MetadataConfig> {
    let api_key = std::env::var("OMDB_API_KEY").ok().filter(|k| !k.is_empty())?;
    Some(MetadataConfig {
        base_url: std::env::var("OMDB_URL").unwrap_or_else(|_| "https://www.omdbapi.com/".into()),
        api_key,
        timeout: Duration::from_secs(5),
    })
}

/// Reads a PEM either inline from `NAME` or from the file named by `NAME_FILE`.
fn read_pem(name: &str) -> anyhow::Result<String> {
    if let Ok(inline) = std::env::var(name) {
        // single-line env values carry escaped newlines
        return Ok(inline.replace("\\n", "\n"));
    }
    let path_var = format!("{name}_FILE");
    let path = std::env::var(&path_var)
        .with_context(|| format!("either {name} or {path_var} must be set"))?;
    std::fs::read_to_string(&path).with_context(|| format!("read {path_var} at {path}"))
}

fn bootstrap_admin_from_env() -> Option<BootstrapAdmin> {
    let email = std::env::var("SUPERADMIN_EMAIL").ok()?;
    let password = std::env::var("SUPERADMIN_PASSWORD").ok()?;
    Some(BootstrapAdmin {
        first_name: std::env::var("SUPERADMIN_FIRST_NAME").unwrap_or_else(|_| "Super".into()),
        last_name: std::env::var("SUPERADMIN_LAST_NAME").unwrap_or_else(|_| "Admin".into()),
        email,
        phone: std::env::var("SUPERADMIN_PHONE").unwrap_or_default(),
        password,
    })
}

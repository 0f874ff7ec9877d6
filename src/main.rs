mod app;
mod auth;
mod comments;
mod config;
mod db;
mod error;
mod extractors;
mod memory;
mod movies;
mod response;
mod reviews;
mod state;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "cinereview=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    if let Some(admin) = app_state.config.bootstrap_admin.clone() {
        users::services::bootstrap_superadmin(&app_state, &admin)
            .await
            .map_err(|e| anyhow::anyhow!("bootstrap superadmin: {e}"))?;
    }

    app::serve(app::build_app(app_state)).await
}

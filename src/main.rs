use anyhow::Context;

mod app;
mod auth;
mod config;
mod error;
mod food;
mod inference;
mod notify;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "caltrack=debug,axum=info,tower_http=info".to_string());
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

    // Fatal on failure, like the database connection inside init(): the
    // process must not come up in a degraded state.
    let app_state = state::AppState::init().await?;
    tokio::fs::create_dir_all(&app_state.config.upload_dir)
        .await
        .context("create upload directory")?;

    let app = app::build_app(app_state);
    app::serve(app).await
}

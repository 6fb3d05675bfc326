use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod export;
pub mod handlers;
pub mod history;
pub mod ingest;
pub mod ledger;
pub mod totals;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/history", get(handlers::history))
        .route("/history/download", get(handlers::download))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}

use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::json;
use tracing::instrument;

use crate::{auth::jwt::AuthUser, error::ApiError, state::AppState};

use super::{
    dto::{AnalyzeResponse, DownloadQuery, HistoryQuery},
    export::{export_rows, write_csv},
    history::{daily_view, monthly_view, parse_date, parse_month},
    ingest::analyze_image,
    ledger::LedgerStore,
};

#[instrument(skip(state, multipart))]
pub async fn analyze(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut image: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid upload: {e}")))?
    {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Invalid upload: {e}")))?;
            image = Some(data);
            break;
        }
    }
    let image = image.ok_or_else(|| ApiError::Validation("Please upload an image.".into()))?;

    let outcome = analyze_image(&state, user_id, image).await?;
    Ok(Json(AnalyzeResponse {
        meal: outcome.meal,
        exceeded: outcome.exceeded,
        message: outcome
            .exceeded
            .then(|| "Daily calorie limit exceeded!".to_string()),
    }))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    match (query.kind.as_deref(), &query.date, &query.month) {
        (Some("daily"), Some(date), _) => {
            let date = parse_date(date)?;
            let view = daily_view(state.ledger.as_ref(), user_id, date).await?;
            Ok(Json(view).into_response())
        }
        (Some("monthly"), _, Some(month)) => {
            let (year, month) = parse_month(month)?;
            let summaries = monthly_view(state.ledger.as_ref(), user_id, year, month).await?;
            Ok(Json(summaries).into_response())
        }
        _ => Err(ApiError::Validation("Invalid history request.".into())),
    }
}

#[instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let start = query.start_date.as_deref().map(parse_date).transpose()?;
    let end = query.end_date.as_deref().map(parse_date).transpose()?;

    let days = state.ledger.find_range(user_id, start, end).await?;
    if days.is_empty() {
        return Ok(
            Json(json!({ "message": "No history found for the specified period." }))
                .into_response(),
        );
    }

    let csv = write_csv(&export_rows(&days))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"history.csv\""),
    );
    Ok((headers, csv).into_response())
}

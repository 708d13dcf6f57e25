//! Analytics reads: heatmaps, trends, keystroke errors, and the overview.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::extractors::AuthUser;
use crate::response::{ok, AppError};
use crate::services::analytics;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/heatmap/exercise", get(exercise_heatmap))
        .route("/heatmap/words", get(word_heatmap))
        .route("/trends/wpm", get(wpm_trend))
        .route("/trends/accuracy", get(accuracy_trend))
        .route("/key-errors", get(key_errors))
        .route("/overview", get(overview))
}

#[derive(Debug, Deserialize)]
struct WindowQuery {
    start: NaiveDate,
    end: NaiveDate,
}

async fn exercise_heatmap(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let cells =
        analytics::exercise_heatmap(&state.store, &user.user_id, query.start, query.end)?;
    Ok(ok(cells))
}

async fn word_heatmap(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let cells = analytics::word_heatmap(&state.store, &user.user_id, query.start, query.end)?;
    Ok(ok(cells))
}

async fn wpm_trend(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let points = analytics::wpm_trend(&state.store, &user.user_id, query.start, query.end)?;
    Ok(ok(points))
}

async fn accuracy_trend(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let points = analytics::accuracy_trend(&state.store, &user.user_id, query.start, query.end)?;
    Ok(ok(points))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    #[serde(default)]
    limit: Option<usize>,
}

async fn key_errors(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let top = analytics::top_key_errors(&state.store, &user.user_id, limit)?;
    Ok(ok(top))
}

async fn overview(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let summary = analytics::overview(&state.store, &user.user_id, query.start, query.end)?;
    Ok(ok(summary))
}

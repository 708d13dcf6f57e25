//! Daily stats reads plus an explicit recompute hook.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::extractors::{AuthUser, JsonBody};
use crate::response::{ok, AppError};
use crate::services::stats;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/daily", get(daily))
        .route("/range", get(range))
        .route("/recompute", post(recompute))
}

#[derive(Debug, Deserialize)]
struct DailyQuery {
    #[serde(default)]
    date: Option<NaiveDate>,
}

async fn daily(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DailyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    // Absent rows read as an idle day, not a 404.
    let row = match state.store.get_daily_stats(&user.user_id, date)? {
        Some(row) => row,
        None => stats::recompute_daily_stats(&state.store, &state.events, &user.user_id, date)?,
    };
    Ok(ok(row))
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    start: NaiveDate,
    end: NaiveDate,
}

async fn range(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state
        .store
        .list_daily_stats_range(&user.user_id, query.start, query.end)?;
    Ok(ok(rows))
}

#[derive(Debug, Deserialize)]
struct RecomputeBody {
    #[serde(default)]
    date: Option<NaiveDate>,
}

async fn recompute(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<RecomputeBody>,
) -> Result<impl IntoResponse, AppError> {
    let date = body.date.unwrap_or_else(|| Utc::now().date_naive());
    let row = stats::recompute_daily_stats(&state.store, &state.events, &user.user_id, date)?;
    Ok(ok(row))
}

//! Practice ingestion and progress reads.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::extractors::{AuthUser, JsonBody};
use crate::response::{created, ok, paginated, AppError};
use crate::routes::items::page_bounds;
use crate::services::ingest::{self, SubmitAttempt};
use crate::state::AppState;
use crate::store::operations::attempts::Attempt;
use crate::store::operations::progress::Progress;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/attempts", post(submit_attempt))
        .route("/attempts/recent", get(recent_attempts))
        .route("/progress", get(list_progress))
        .route("/due", get(due_reviews))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    attempt: Attempt,
    progress: Option<Progress>,
}

async fn submit_attempt(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<SubmitAttempt>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = ingest::submit_attempt(&state.store, &state.events, &user.user_id, &body)?;
    Ok(created(SubmitResponse {
        attempt: outcome.attempt,
        progress: outcome.progress,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LimitQuery {
    #[serde(default)]
    limit: Option<usize>,
}

async fn recent_attempts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let attempts = state.store.list_recent_attempts(&user.user_id, limit)?;
    Ok(ok(attempts))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    #[serde(default)]
    page: Option<u64>,
    #[serde(default)]
    per_page: Option<u64>,
}

async fn list_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);
    let offset = ((page - 1) * per_page) as usize;
    let rows = state
        .store
        .list_user_progress(&user.user_id, per_page as usize, offset)?;
    let total = state.store.progress_word_ids(&user.user_id)?.len() as u64;
    Ok(paginated(rows, total, page, per_page))
}

async fn due_reviews(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let due = state
        .store
        .get_due_progress(&user.user_id, Utc::now(), limit)?;
    Ok(ok(due))
}

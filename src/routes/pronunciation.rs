use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::extractors::{AuthUser, JsonBody};
use crate::response::{created, ok, AppError};
use crate::services::pronunciation::{self, EvaluateRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/evaluate", post(evaluate))
        .route("/recent", get(recent))
}

async fn evaluate(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<EvaluateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let attempt =
        pronunciation::evaluate(&state.store, &state.adapters, &user.user_id, &body).await?;
    Ok(created(attempt))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    #[serde(default)]
    limit: Option<usize>,
}

async fn recent(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let attempts = state
        .store
        .list_recent_pronunciation_attempts(&user.user_id, limit)?;
    Ok(ok(attempts))
}

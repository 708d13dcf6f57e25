use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::extractors::AuthUser;
use crate::response::{ok, AppError};
use crate::services::planner;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/plan", get(todays_plan))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanQuery {
    #[serde(default)]
    plan_id: Option<String>,
}

async fn todays_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PlanQuery>,
) -> Result<impl IntoResponse, AppError> {
    let plan = planner::plan_daily_session(
        &state.store,
        &user.user_id,
        query.plan_id.as_deref(),
        Utc::now(),
    )?;
    Ok(ok(plan))
}

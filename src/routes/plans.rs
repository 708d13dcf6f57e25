use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::extractors::{AuthUser, JsonBody};
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::plans::{LearningPlan, ReviewFrequency};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_plan).get(list_plans))
        .route("/active", get(active_plan))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlan {
    daily_word_target: u32,
    #[serde(default)]
    daily_expression_target: u32,
    review_frequency: ReviewFrequency,
    start_date: NaiveDate,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

async fn create_plan(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<CreatePlan>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let plan = LearningPlan {
        id: Uuid::new_v4().to_string(),
        user_id: user.user_id,
        daily_word_target: body.daily_word_target,
        daily_expression_target: body.daily_expression_target,
        review_frequency: body.review_frequency,
        start_date: body.start_date,
        end_date: body.end_date,
        active: body.active,
        created_at: now,
        updated_at: now,
    };
    state.store.create_plan(&plan)?;
    Ok(created(plan))
}

async fn list_plans(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let plans = state.store.list_plans(&user.user_id)?;
    Ok(ok(plans))
}

#[derive(Debug, Deserialize)]
struct ActiveQuery {
    #[serde(default)]
    date: Option<NaiveDate>,
}

async fn active_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ActiveQuery>,
) -> Result<impl IntoResponse, AppError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let plan = state.store.active_plan_for_date(&user.user_id, date)?;
    Ok(ok(plan))
}

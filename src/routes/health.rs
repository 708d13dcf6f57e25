use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::adapters::ProviderStatus;
use crate::response::ok;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    uptime_secs: u64,
    providers: Vec<ProviderStatus>,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    ok(Health {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        providers: state.adapters.statuses(),
    })
}

//! Recomputes yesterday's and today's stats rows for every user who was
//! active on the respective day. Covering both days keeps rows written just
//! after midnight from going stale.
//!
//! Rows are rebuilt from scratch, so re-running after a crash or a clock
//! hiccup converges to the same result.

use chrono::{Duration, Utc};

use crate::services::stats::{day_window, recompute_daily_stats};
use crate::state::AppState;
use crate::store::StoreError;

pub async fn run(state: &AppState) -> Result<(), StoreError> {
    let today = Utc::now().date_naive();

    for date in [today - Duration::days(1), today] {
        let (start, end) = day_window(date);
        let users = state.store.users_active_within(start, end)?;
        let user_count = users.len();

        for user_id in users {
            recompute_daily_stats(&state.store, &state.events, &user_id, date)?;
        }

        tracing::info!(%date, users = user_count, "Daily stats aggregated");
    }
    Ok(())
}

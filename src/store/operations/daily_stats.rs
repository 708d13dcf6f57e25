use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// Derived per-(user, date) counters. Rows are only ever replaced whole;
/// `recompute_daily_stats` rebuilds every field from attempts and progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub user_id: String,
    pub date: NaiveDate,
    pub words_learned: u32,
    pub words_reviewed: u32,
    pub expressions_learned: u32,
    pub news_read: u32,
    pub attempts: u32,
    pub study_time_minutes: u32,
    /// Average attempt score for the day, in [0, 100]; 0 when idle.
    pub accuracy_rate: f64,
    /// Average WPM over typing attempts; 0 when none.
    pub avg_wpm: f64,
    pub updated_at: DateTime<Utc>,
}

fn date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl Store {
    pub fn upsert_daily_stats(&self, stats: &DailyStats) -> Result<(), StoreError> {
        let key = keys::daily_stats_key(&stats.user_id, &date_str(stats.date));
        self.daily_stats
            .insert(key.as_bytes(), Self::serialize(stats)?)?;
        Ok(())
    }

    pub fn get_daily_stats(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyStats>, StoreError> {
        let key = keys::daily_stats_key(user_id, &date_str(date));
        match self.daily_stats.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Rows within `[start, end]` inclusive, date ascending. A reversed range
    /// yields nothing. The `YYYY-MM-DD` key encoding makes the scan ordered.
    pub fn list_daily_stats_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyStats>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }

        let lower = keys::daily_stats_key(user_id, &date_str(start));
        let upper = keys::daily_stats_key(user_id, &date_str(end));

        let mut out = Vec::new();
        for entry in self
            .daily_stats
            .range(lower.as_bytes()..=upper.as_bytes())
        {
            let (_, value) = entry?;
            out.push(Self::deserialize::<DailyStats>(&value)?);
        }
        Ok(out)
    }
}

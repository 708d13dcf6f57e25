//! Read-side analytics over the derived daily stats and progress rows.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::constants::HEATMAP_BUCKETS;
use crate::services::stats::day_window;
use crate::store::operations::daily_stats::DailyStats;
use crate::store::operations::key_errors::KeyErrorCounter;
use crate::store::operations::progress::ProgressStatus;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub count: u64,
    /// Intensity bucket 0..=4; 0 exactly when the count is 0.
    pub level: u8,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// The queried window, echoed back.
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_attempts: u64,
    pub distinct_items: u64,
    pub avg_wpm: f64,
    pub avg_accuracy: f64,
    pub total_words: u64,
    pub mastered: u64,
    pub learning: u64,
    pub need_review: u64,
    pub not_learned: u64,
    pub study_days: u64,
    pub current_streak_days: u64,
}

pub fn heatmap_level(count: u64) -> u8 {
    if count == 0 {
        return 0;
    }
    for (i, bound) in HEATMAP_BUCKETS.iter().enumerate() {
        if count <= *bound {
            return (i + 1) as u8;
        }
    }
    4
}

/// Stats rows for `[start, end]` with idle days filled in as zero rows, so
/// callers always see one cell per calendar day. Reversed ranges are empty.
fn dense_stats(
    store: &Store,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(NaiveDate, Option<DailyStats>)>, StoreError> {
    if start > end {
        return Ok(Vec::new());
    }

    let rows = store.list_daily_stats_range(user_id, start, end)?;
    let mut by_date = rows
        .into_iter()
        .map(|row| (row.date, row))
        .collect::<std::collections::HashMap<_, _>>();

    let mut out = Vec::new();
    let mut date = start;
    while date <= end {
        out.push((date, by_date.remove(&date)));
        date += Duration::days(1);
    }
    Ok(out)
}

/// One cell per day counting graded attempts.
pub fn exercise_heatmap(
    store: &Store,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<HeatmapCell>, StoreError> {
    Ok(dense_stats(store, user_id, start, end)?
        .into_iter()
        .map(|(date, row)| {
            let count = row.map_or(0, |r| u64::from(r.attempts));
            HeatmapCell {
                date,
                count,
                level: heatmap_level(count),
            }
        })
        .collect())
}

/// One cell per day counting distinct items attempted.
pub fn word_heatmap(
    store: &Store,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<HeatmapCell>, StoreError> {
    if start > end {
        return Ok(Vec::new());
    }

    let from = day_window(start).0;
    let to = day_window(end).1;
    let mut per_day: HashMap<NaiveDate, HashSet<String>> = HashMap::new();
    for attempt in store.list_attempts_window(user_id, from, to)? {
        per_day
            .entry(attempt.created_at.date_naive())
            .or_default()
            .insert(attempt.item.id);
    }

    let mut out = Vec::new();
    let mut date = start;
    while date <= end {
        let count = per_day.get(&date).map_or(0, |items| items.len() as u64);
        out.push(HeatmapCell {
            date,
            count,
            level: heatmap_level(count),
        });
        date += Duration::days(1);
    }
    Ok(out)
}

/// Average typing speed per day; idle days carry 0.
pub fn wpm_trend(
    store: &Store,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TrendPoint>, StoreError> {
    Ok(dense_stats(store, user_id, start, end)?
        .into_iter()
        .map(|(date, row)| TrendPoint {
            date,
            value: row.map_or(0.0, |r| r.avg_wpm),
        })
        .collect())
}

/// Average attempt score per day; idle days carry 0.
pub fn accuracy_trend(
    store: &Store,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TrendPoint>, StoreError> {
    Ok(dense_stats(store, user_id, start, end)?
        .into_iter()
        .map(|(date, row)| TrendPoint {
            date,
            value: row.map_or(0.0, |r| r.accuracy_rate),
        })
        .collect())
}

pub fn top_key_errors(
    store: &Store,
    user_id: &str,
    limit: usize,
) -> Result<Vec<KeyErrorCounter>, StoreError> {
    store.top_key_errors(user_id, limit)
}

/// Window-bounded rollup: attempt totals and averages for `[start, end]`,
/// plus the account-wide progress status breakdown. A reversed window echoes
/// back with zero activity.
pub fn overview(
    store: &Store,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Overview, StoreError> {
    let rows = store.list_user_progress(user_id, usize::MAX, 0)?;
    let mut mastered = 0u64;
    let mut learning = 0u64;
    let mut need_review = 0u64;
    let mut not_learned = 0u64;
    for row in &rows {
        match row.status {
            ProgressStatus::Mastered => mastered += 1,
            ProgressStatus::Learning => learning += 1,
            ProgressStatus::NeedReview => need_review += 1,
            ProgressStatus::NotLearned => not_learned += 1,
        }
    }

    let (total_attempts, distinct_items) = if start <= end {
        let from = day_window(start).0;
        let to = day_window(end).1;
        let attempts = store.list_attempts_window(user_id, from, to)?;
        let items: std::collections::HashSet<&str> =
            attempts.iter().map(|a| a.item.id.as_str()).collect();
        (attempts.len() as u64, items.len() as u64)
    } else {
        (0, 0)
    };

    let stats = if start <= end {
        store.list_daily_stats_range(user_id, start, end)?
    } else {
        Vec::new()
    };
    let study_days = stats.iter().filter(|r| r.attempts > 0).count() as u64;

    let typing_days: Vec<f64> = stats
        .iter()
        .filter(|r| r.avg_wpm > 0.0)
        .map(|r| r.avg_wpm)
        .collect();
    let avg_wpm = if typing_days.is_empty() {
        0.0
    } else {
        typing_days.iter().sum::<f64>() / typing_days.len() as f64
    };

    let active_days: Vec<f64> = stats
        .iter()
        .filter(|r| r.attempts > 0)
        .map(|r| r.accuracy_rate)
        .collect();
    let avg_accuracy = if active_days.is_empty() {
        0.0
    } else {
        active_days.iter().sum::<f64>() / active_days.len() as f64
    };

    let active: std::collections::HashSet<NaiveDate> = stats
        .iter()
        .filter(|r| r.attempts > 0)
        .map(|r| r.date)
        .collect();
    let mut current_streak_days = 0u64;
    let mut date = end;
    while active.contains(&date) {
        current_streak_days += 1;
        date -= Duration::days(1);
    }

    Ok(Overview {
        start,
        end,
        total_attempts,
        distinct_items,
        avg_wpm,
        avg_accuracy,
        total_words: rows.len() as u64,
        mastered,
        learning,
        need_review,
        not_learned,
        study_days,
        current_streak_days,
    })
}

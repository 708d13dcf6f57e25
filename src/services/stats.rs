//! Daily stats aggregation. The recompute is a pure function of the day's
//! attempts and progress rows, written back as a whole row, so running it
//! twice is a no-op.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::events::{AuditEvent, EventBus};
use crate::store::operations::daily_stats::DailyStats;
use crate::store::operations::items::ItemVariant;
use crate::store::{Store, StoreError};

/// UTC day window: `[00:00, next day 00:00)`.
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Rebuilds the stats row for one (user, date) from scratch.
pub fn recompute_daily_stats(
    store: &Store,
    events: &EventBus,
    user_id: &str,
    date: NaiveDate,
) -> Result<DailyStats, StoreError> {
    let (start, end) = day_window(date);
    let attempts = store.list_attempts_window(user_id, start, end)?;

    let mut expressions: HashSet<&str> = HashSet::new();
    let mut news: HashSet<&str> = HashSet::new();
    let mut score_sum = 0.0;
    let mut time_spent_secs: u64 = 0;
    let mut wpm_sum = 0.0;
    let mut wpm_count = 0u32;

    for attempt in &attempts {
        score_sum += attempt.score;
        time_spent_secs += u64::from(attempt.time_spent_secs);
        match attempt.item.variant {
            ItemVariant::Expression => {
                expressions.insert(attempt.item.id.as_str());
            }
            ItemVariant::NewsArticle => {
                news.insert(attempt.item.id.as_str());
            }
            _ => {}
        }
        if let Some(typing) = &attempt.typing {
            if typing.typing_speed_wpm > 0.0 {
                wpm_sum += typing.typing_speed_wpm;
                wpm_count += 1;
            }
        }
    }

    // A word counts as learned on the day its progress row was created and
    // as reviewed on any later day it was touched.
    let mut words_learned = 0u32;
    let mut words_reviewed = 0u32;
    for progress in store.progress_reviewed_within(user_id, start, end)? {
        if progress.created_at >= start && progress.created_at < end {
            words_learned += 1;
        } else {
            words_reviewed += 1;
        }
    }

    let attempt_count = attempts.len() as u32;
    let stats = DailyStats {
        user_id: user_id.to_string(),
        date,
        words_learned,
        words_reviewed,
        expressions_learned: expressions.len() as u32,
        news_read: news.len() as u32,
        attempts: attempt_count,
        study_time_minutes: (time_spent_secs / 60) as u32,
        accuracy_rate: if attempt_count > 0 {
            score_sum / f64::from(attempt_count)
        } else {
            0.0
        },
        avg_wpm: if wpm_count > 0 {
            wpm_sum / f64::from(wpm_count)
        } else {
            0.0
        },
        updated_at: Utc::now(),
    };

    store.upsert_daily_stats(&stats)?;
    events.emit(AuditEvent::StatsRecomputed {
        user_id: user_id.to_string(),
        date,
        at: stats.updated_at,
    });
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::store::operations::attempts::tests::sample_attempt;
    use crate::store::operations::attempts::{Attempt, ItemRef, TypingMetrics};
    use crate::store::operations::progress::tests::mock_progress;

    use super::*;

    fn setup() -> (tempfile::TempDir, Store, EventBus) {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        (dir, store, EventBus::new())
    }

    fn noon(date: NaiveDate) -> DateTime<Utc> {
        date.and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn aggregates_attempt_counters_and_accuracy() {
        let (_dir, store, events) = setup();
        let date = d("2026-03-10");
        let at = noon(date);

        store
            .create_attempt(&sample_attempt("a1", "u1", "w1", true, at))
            .unwrap();
        store
            .create_attempt(&sample_attempt("a2", "u1", "w2", false, at))
            .unwrap();

        let stats = recompute_daily_stats(&store, &events, "u1", date).unwrap();
        assert_eq!(stats.attempts, 2);
        assert!((stats.accuracy_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn recompute_is_idempotent() {
        let (_dir, store, events) = setup();
        let date = d("2026-03-10");

        store
            .create_attempt(&sample_attempt("a1", "u1", "w1", true, noon(date)))
            .unwrap();

        let first = recompute_daily_stats(&store, &events, "u1", date).unwrap();
        let second = recompute_daily_stats(&store, &events, "u1", date).unwrap();
        assert_eq!(first.attempts, second.attempts);
        assert_eq!(first.accuracy_rate, second.accuracy_rate);
        assert_eq!(first.words_learned, second.words_learned);
    }

    #[test]
    fn attempts_outside_the_day_are_excluded() {
        let (_dir, store, events) = setup();
        let date = d("2026-03-10");

        store
            .create_attempt(&sample_attempt("a1", "u1", "w1", true, noon(date)))
            .unwrap();
        store
            .create_attempt(&sample_attempt(
                "a2",
                "u1",
                "w1",
                true,
                noon(d("2026-03-11")),
            ))
            .unwrap();

        let stats = recompute_daily_stats(&store, &events, "u1", date).unwrap();
        assert_eq!(stats.attempts, 1);
    }

    #[test]
    fn learned_and_reviewed_split_on_progress_creation_day() {
        let (_dir, store, events) = setup();
        let date = d("2026-03-10");
        let at = noon(date);

        let mut learned = mock_progress("u1", "w1", 1);
        learned.created_at = at;
        learned.last_review_at = Some(at);
        store.put_progress(&learned).unwrap();

        let mut reviewed = mock_progress("u1", "w2", 1);
        reviewed.created_at = noon(d("2026-03-01"));
        reviewed.last_review_at = Some(at);
        store.put_progress(&reviewed).unwrap();

        let stats = recompute_daily_stats(&store, &events, "u1", date).unwrap();
        assert_eq!(stats.words_learned, 1);
        assert_eq!(stats.words_reviewed, 1);
    }

    #[test]
    fn typing_attempts_average_wpm() {
        let (_dir, store, events) = setup();
        let date = d("2026-03-10");
        let at = noon(date);

        for (id, wpm) in [("a1", 40.0), ("a2", 60.0)] {
            let mut attempt: Attempt = sample_attempt(id, "u1", "t1", true, at);
            attempt.item = ItemRef {
                variant: ItemVariant::TypingWord,
                id: "t1".to_string(),
            };
            attempt.typing = Some(TypingMetrics {
                typing_speed_wpm: wpm,
                ..TypingMetrics::default()
            });
            store.create_attempt(&attempt).unwrap();
        }

        let stats = recompute_daily_stats(&store, &events, "u1", date).unwrap();
        assert!((stats.avg_wpm - 50.0).abs() < 1e-9);
    }

    #[test]
    fn idle_day_yields_zero_row() {
        let (_dir, store, events) = setup();
        let stats = recompute_daily_stats(&store, &events, "u1", d("2026-03-10")).unwrap();
        assert_eq!(stats.attempts, 0);
        assert_eq!(stats.accuracy_rate, 0.0);
        assert_eq!(stats.avg_wpm, 0.0);
    }
}

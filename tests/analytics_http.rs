mod common;

use axum::http::StatusCode;
use chrono::{Duration, NaiveDate, Utc};

use vocab_backend::store::operations::daily_stats::DailyStats;

use common::app::{spawn_app, TestApp};
use common::fixtures::{create_word, submit_attempt};
use common::http;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn seed_stats(app: &TestApp, user: &str, date: NaiveDate, attempts: u32, wpm: f64, accuracy: f64) {
    app.state
        .store
        .upsert_daily_stats(&DailyStats {
            user_id: user.to_string(),
            date,
            words_learned: attempts / 2,
            words_reviewed: attempts / 2,
            expressions_learned: 0,
            news_read: 0,
            attempts,
            study_time_minutes: attempts * 2,
            accuracy_rate: accuracy,
            avg_wpm: wpm,
            updated_at: Utc::now(),
        })
        .expect("seed stats");
}

#[tokio::test]
async fn heatmap_levels_match_the_bucket_bounds() {
    let app = spawn_app();
    let counts = [0u32, 1, 3, 4, 7, 8, 12];
    let start = d("2026-03-01");
    for (i, count) in counts.iter().enumerate() {
        if *count > 0 {
            seed_stats(&app, "u1", start + Duration::days(i as i64), *count, 0.0, 80.0);
        }
    }

    let (status, body) = http::get(
        &app.router,
        "/api/analytics/heatmap/exercise?start=2026-03-01&end=2026-03-07",
        "u1",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let cells = body["data"].as_array().unwrap();
    assert_eq!(cells.len(), 7);
    let levels: Vec<u64> = cells.iter().map(|c| c["level"].as_u64().unwrap()).collect();
    assert_eq!(levels, vec![0, 1, 1, 2, 2, 3, 4]);
    assert_eq!(cells[0]["count"], 0);
    assert_eq!(cells[6]["count"], 12);
}

#[tokio::test]
async fn reversed_window_yields_no_cells() {
    let app = spawn_app();
    seed_stats(&app, "u1", d("2026-03-01"), 5, 0.0, 80.0);

    let (status, body) = http::get(
        &app.router,
        "/api/analytics/heatmap/exercise?start=2026-03-07&end=2026-03-01",
        "u1",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn trends_fill_idle_days_with_zero() {
    let app = spawn_app();
    seed_stats(&app, "u1", d("2026-03-01"), 4, 48.0, 75.0);

    let (_, wpm) = http::get(
        &app.router,
        "/api/analytics/trends/wpm?start=2026-03-01&end=2026-03-03",
        "u1",
    )
    .await;
    let points = wpm["data"].as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert!((points[0]["value"].as_f64().unwrap() - 48.0).abs() < 1e-9);
    assert_eq!(points[1]["value"], 0.0);

    let (_, accuracy) = http::get(
        &app.router,
        "/api/analytics/trends/accuracy?start=2026-03-01&end=2026-03-01",
        "u1",
    )
    .await;
    let points = accuracy["data"].as_array().unwrap();
    assert!((points[0]["value"].as_f64().unwrap() - 75.0).abs() < 1e-9);
}

#[tokio::test]
async fn heatmaps_are_per_user() {
    let app = spawn_app();
    seed_stats(&app, "u1", d("2026-03-01"), 9, 0.0, 80.0);

    let (_, body) = http::get(
        &app.router,
        "/api/analytics/heatmap/exercise?start=2026-03-01&end=2026-03-01",
        "u2",
    )
    .await;
    assert_eq!(body["data"][0]["count"], 0);
    assert_eq!(body["data"][0]["level"], 0);
}

#[tokio::test]
async fn overview_reports_window_totals_and_streak() {
    let app = spawn_app();
    let today = Utc::now().date_naive();
    seed_stats(&app, "u1", today, 3, 0.0, 90.0);
    seed_stats(&app, "u1", today - Duration::days(1), 2, 0.0, 70.0);

    let start = today - Duration::days(7);
    let uri = format!("/api/analytics/overview?start={start}&end={today}");
    let (status, body) = http::get(&app.router, &uri, "u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["start"], start.to_string());
    assert_eq!(body["data"]["end"], today.to_string());
    assert_eq!(body["data"]["studyDays"], 2);
    assert_eq!(body["data"]["currentStreakDays"], 2);
    // Averaged over the two active days.
    assert!((body["data"]["avgAccuracy"].as_f64().unwrap() - 80.0).abs() < 1e-9);
}

#[tokio::test]
async fn overview_attempt_totals_come_from_the_window() {
    let app = spawn_app();
    let apple = create_word(&app.router, "apple", 1).await;
    submit_attempt(&app.router, "u1", &apple, "apple").await;
    submit_attempt(&app.router, "u1", &apple, "wrong").await;

    let today = Utc::now().date_naive();
    let uri = format!("/api/analytics/overview?start={today}&end={today}");
    let (_, body) = http::get(&app.router, &uri, "u1").await;
    assert_eq!(body["data"]["totalAttempts"], 2);
    assert_eq!(body["data"]["distinctItems"], 1);

    // A window before any activity is empty.
    let early = today - Duration::days(10);
    let uri = format!("/api/analytics/overview?start={early}&end={early}");
    let (_, body) = http::get(&app.router, &uri, "u1").await;
    assert_eq!(body["data"]["totalAttempts"], 0);
}

#[tokio::test]
async fn word_heatmap_counts_distinct_items() {
    let app = spawn_app();
    let apple = create_word(&app.router, "apple", 1).await;
    let pear = create_word(&app.router, "pear", 2).await;

    // Two attempts on the same word still count it once.
    submit_attempt(&app.router, "u1", &apple, "apple").await;
    submit_attempt(&app.router, "u1", &apple, "wrong").await;
    submit_attempt(&app.router, "u1", &pear, "pear").await;

    let today = Utc::now().date_naive();
    let uri = format!("/api/analytics/heatmap/words?start={today}&end={today}");
    let (_, body) = http::get(&app.router, &uri, "u1").await;
    let cell = &body["data"][0];
    assert_eq!(cell["count"], 2);
    assert_eq!(cell["level"], 1);
    assert_eq!(cell["date"], today.to_string());
}

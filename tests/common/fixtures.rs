use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};

use super::http;

/// Creates a word item over the API and returns its id.
pub async fn create_word(router: &Router, text: &str, rank: u32) -> String {
    create_item(router, "word", text, rank).await
}

pub async fn create_item(router: &Router, variant: &str, text: &str, rank: u32) -> String {
    let (status, body) = http::post(
        router,
        "/api/items",
        "admin",
        json!({
            "variant": variant,
            "text": text,
            "definition": format!("definition of {text}"),
            "difficulty": "beginner",
            "frequencyRank": rank,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create item failed: {body}");
    body["data"]["id"].as_str().expect("item id").to_string()
}

/// Submits a practice attempt and returns the response body.
pub async fn submit_attempt(
    router: &Router,
    user: &str,
    item_id: &str,
    answer: &str,
) -> (StatusCode, Value) {
    http::post(
        router,
        "/api/practice/attempts",
        user,
        json!({
            "itemId": item_id,
            "userAnswer": answer,
            "timeSpentSecs": 3,
        }),
    )
    .await
}

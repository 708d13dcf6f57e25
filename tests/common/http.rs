use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }

    let request = if let Some(body) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    } else {
        builder.body(Body::empty()).expect("request")
    };

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn get(router: &Router, uri: &str, user: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, Some(user), None).await
}

pub async fn post(router: &Router, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::POST, uri, Some(user), Some(body)).await
}

pub async fn delete(router: &Router, uri: &str, user: &str) -> (StatusCode, Value) {
    send(router, Method::DELETE, uri, Some(user), None).await
}

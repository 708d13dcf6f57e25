pub mod analytics;
pub mod dictionary;
pub mod health;
pub mod items;
pub mod plans;
pub mod practice;
pub mod pronunciation;
pub mod realtime;
pub mod session;
pub mod speech;
pub mod stats;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::request_id;
use crate::state::AppState;

/// Audio uploads dominate the payload sizes; everything else is tiny.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(parse_origin(&state.config.cors_origin))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("x-request-id"),
        ]);

    let api = Router::new()
        .nest("/items", items::router())
        .nest("/practice", practice::router())
        .nest("/session", session::router())
        .nest("/stats", stats::router())
        .nest("/analytics", analytics::router())
        .nest("/pronunciation", pronunciation::router())
        .nest("/dictionary", dictionary::router())
        .nest("/speech", speech::router())
        .nest("/plans", plans::router())
        .nest("/realtime", realtime::router());

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(axum::middleware::from_fn(request_id::propagate_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

fn parse_origin(origin: &str) -> AllowOrigin {
    if origin == "*" {
        return AllowOrigin::any();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!(origin, "Invalid CORS origin, denying cross-origin requests");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    }
}

//! Server-sent events feed of audit events, scoped to the calling user.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures::stream::Stream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::events::AuditEvent;
use crate::extractors::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(event_stream))
}

async fn event_stream(
    State(state): State<AppState>,
    user: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.events.subscribe();
    let user_id = user.user_id;

    let stream = BroadcastStream::new(receiver).filter_map(move |item| {
        let event = match item {
            Ok(event) => event,
            // A lagging subscriber misses events; the stream keeps going.
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                tracing::debug!(missed, "SSE subscriber lagged");
                return None;
            }
        };
        if !is_visible(&event, &user_id) {
            return None;
        }
        match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(error) => {
                tracing::error!(%error, "Failed to serialize audit event");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

fn is_visible(event: &AuditEvent, user_id: &str) -> bool {
    event.user_scope().map_or(true, |scope| scope == user_id)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::store::operations::items::ItemVariant;

    use super::*;

    #[test]
    fn user_events_are_scoped_and_catalog_events_are_global() {
        let mine = AuditEvent::AttemptRecorded {
            user_id: "u1".to_string(),
            attempt_id: "a1".to_string(),
            item_id: "w1".to_string(),
            variant: ItemVariant::Word,
            is_correct: true,
            at: Utc::now(),
        };
        assert!(is_visible(&mine, "u1"));
        assert!(!is_visible(&mine, "u2"));

        let global = AuditEvent::ItemCreated {
            item_id: "w1".to_string(),
            variant: ItemVariant::Word,
            at: Utc::now(),
        };
        assert!(is_visible(&global, "anyone"));
    }
}

//! Typing-practice dictionaries and external word lookups.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::items::Dictionary;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_dictionary))
        .route("/lookup/:word", get(lookup_word))
        .route("/:id", get(get_dictionary))
        .route(
            "/:id/chapters/:chapter/words",
            post(add_word).get(chapter_words),
        )
}

async fn lookup_word(
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if word.trim().is_empty() {
        return Err(AppError::bad_request(
            "VALIDATION_ERROR",
            "word must not be empty",
        ));
    }
    let entry = state.adapters.dictionary.lookup(&word).await;
    Ok(ok(entry))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDictionary {
    name: String,
    #[serde(default)]
    description: Option<String>,
    chapter_count: u32,
}

async fn create_dictionary(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateDictionary>,
) -> Result<impl IntoResponse, AppError> {
    let dictionary = Dictionary {
        id: Uuid::new_v4().to_string(),
        name: body.name,
        description: body.description,
        chapter_count: body.chapter_count,
        created_at: Utc::now(),
    };
    state.store.create_dictionary(&dictionary)?;
    Ok(created(dictionary))
}

async fn get_dictionary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let dictionary = state
        .store
        .get_dictionary(&id)?
        .ok_or_else(|| AppError::not_found("dictionary not found"))?;
    Ok(ok(dictionary))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddWord {
    item_id: String,
}

async fn add_word(
    State(state): State<AppState>,
    Path((id, chapter)): Path<(String, u32)>,
    JsonBody(body): JsonBody<AddWord>,
) -> Result<impl IntoResponse, AppError> {
    state.store.add_word_to_chapter(&id, chapter, &body.item_id)?;
    let item = state.store.get_active_item(&body.item_id)?;
    Ok(created(item))
}

async fn chapter_words(
    State(state): State<AppState>,
    Path((id, chapter)): Path<(String, u32)>,
) -> Result<impl IntoResponse, AppError> {
    let words = state.store.list_chapter_words(&id, chapter, 500)?;
    Ok(ok(words))
}

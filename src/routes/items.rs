//! Learning-item catalog management.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::events::AuditEvent;
use crate::extractors::JsonBody;
use crate::response::{created, ok, paginated, AppError};
use crate::state::AppState;
use crate::store::operations::items::{
    Difficulty, ItemVariant, LearningItem, Provenance,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item).get(list_items))
        .route("/:id", get(get_item).delete(delete_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateItem {
    variant: ItemVariant,
    text: String,
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default)]
    definition: Option<String>,
    difficulty: Difficulty,
    frequency_rank: u32,
    #[serde(default)]
    provenance: Provenance,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub variant: Option<ItemVariant>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

pub fn page_bounds(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, per_page)
}

async fn create_item(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateItem>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let item = LearningItem {
        id: Uuid::new_v4().to_string(),
        variant: body.variant,
        text: body.text,
        phonetic: body.phonetic,
        definition: body.definition,
        difficulty: body.difficulty,
        frequency_rank: body.frequency_rank,
        provenance: body.provenance,
        dictionary_ref: None,
        deleted: false,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };
    state.store.create_item(&item)?;
    state.events.emit(AuditEvent::ItemCreated {
        item_id: item.id.clone(),
        variant: item.variant,
        at: now,
    });
    Ok(created(item))
}

async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);
    let offset = ((page - 1) * per_page) as usize;

    let items = state
        .store
        .list_items(query.variant, per_page as usize, offset)?;
    let total = state.store.count_items(query.variant)?;
    Ok(paginated(items, total, page, per_page))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.store.get_active_item(&id)?;
    Ok(ok(item))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.store.soft_delete_item(&id)?;
    state.events.emit(AuditEvent::ItemSoftDeleted {
        item_id: item.id.clone(),
        at: Utc::now(),
    });
    Ok(ok(item))
}

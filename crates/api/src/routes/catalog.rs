//! Public catalog browsing handlers (no authentication).

use axum::Json;
use axum::extract::{Path, State};

use minimart_core::ItemId;

use crate::db::StorageError;
use crate::error::{Result, parse_path_id};
use crate::models::Item;
use crate::state::AppState;

/// `GET /items` - list the whole catalog.
///
/// # Errors
///
/// `500` if storage fails.
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>> {
    let items = state.storage().list_items().await?;
    Ok(Json(items))
}

/// `GET /items/{id}` - fetch a single catalog item.
///
/// # Errors
///
/// `400` for a non-numeric id, `404` if the item does not exist.
pub async fn get_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Item>> {
    let id = parse_path_id(&raw_id)?;

    let item = state
        .storage()
        .get_item(ItemId::new(id))
        .await?
        .ok_or(StorageError::ItemNotFound(id))?;

    Ok(Json(item))
}

//! Import session handlers: upload, review edits, terminal transitions

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{AppError, AppState, SuccessResponse};
use tally_core::models::{
    ImportSession, ImportSessionWithItems, ItemPatch, LineItem,
};
use tally_core::MAX_STATEMENT_SIZE;

/// POST /api/imports/upload - Upload a bank statement (multipart)
///
/// Expects a multipart form with a single `file` field. The filename's
/// extension selects the parser; oversized and unrecognized files are
/// rejected before parsing.
pub async fn upload_statement(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImportSessionWithItems>), AppError> {
    let mut file_name: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(String::from);
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::bad_request("Failed to read file data"))?;

            if bytes.len() > MAX_STATEMENT_SIZE {
                return Err(AppError::bad_request(&format!(
                    "File too large. Maximum size is {} MB",
                    MAX_STATEMENT_SIZE / 1024 / 1024
                )));
            }

            file_data = Some(bytes.to_vec());
        }
    }

    let file_name = file_name.ok_or_else(|| AppError::bad_request("Missing file name"))?;
    let file_data = file_data.ok_or_else(|| AppError::bad_request("Missing file field"))?;

    upload_core(&state, &file_name, &file_data)
}

/// Request body for the JSON upload endpoint
#[derive(Debug, Deserialize)]
pub struct UploadJsonRequest {
    pub file_name: String,
    /// Base64-encoded statement content
    pub data: String,
}

/// POST /api/imports/upload/json - Upload a statement via JSON
///
/// Base64 twin of the multipart endpoint, for tests and scripting.
pub async fn upload_statement_json(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadJsonRequest>,
) -> Result<(StatusCode, Json<ImportSessionWithItems>), AppError> {
    use base64::Engine;

    let file_data = base64::engine::general_purpose::STANDARD
        .decode(&req.data)
        .map_err(|e| AppError::bad_request(&format!("Invalid base64 data: {}", e)))?;

    upload_core(&state, &req.file_name, &file_data)
}

/// Shared upload logic - separated from body parsing
fn upload_core(
    state: &AppState,
    file_name: &str,
    file_data: &[u8],
) -> Result<(StatusCode, Json<ImportSessionWithItems>), AppError> {
    let session = tally_core::upload_statement(&state.db, file_name, file_data)
        .map_err(AppError::from_core)?;

    info!(
        "Uploaded '{}': session {} with {} items",
        file_name, session.session.id, session.session.total_records
    );

    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/imports - List import session summaries, newest first
pub async fn list_import_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ImportSession>>, AppError> {
    let sessions = state
        .db
        .list_import_sessions()
        .map_err(AppError::from_core)?;
    Ok(Json(sessions))
}

/// GET /api/imports/:id - Get a session with its full item set
pub async fn get_import_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ImportSessionWithItems>, AppError> {
    let session = state
        .db
        .get_import_session(id)
        .map_err(AppError::from_core)?
        .ok_or_else(|| AppError::not_found("Import session not found"))?;

    Ok(Json(session))
}

/// PATCH /api/imports/:id/items/:item_id - Patch one item's classification
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(i64, i64)>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<LineItem>, AppError> {
    let item = state
        .db
        .update_import_item(id, item_id, &patch)
        .map_err(AppError::from_core)?;

    Ok(Json(item))
}

/// Request body for batch item updates: the id set plus the patch fields
#[derive(Debug, Deserialize)]
pub struct BatchUpdateRequest {
    pub item_ids: Vec<i64>,
    #[serde(flatten)]
    pub patch: ItemPatch,
}

/// PATCH /api/imports/:id/items/batch - Apply one patch to a set of items
///
/// Unknown item ids are silently skipped; the response carries one entry
/// per id that was found and updated.
pub async fn update_items_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<BatchUpdateRequest>,
) -> Result<Json<Vec<LineItem>>, AppError> {
    if req.item_ids.is_empty() {
        return Err(AppError::bad_request("item_ids must not be empty"));
    }

    let items = state
        .db
        .update_import_items_batch(id, &req.item_ids, &req.patch)
        .map_err(AppError::from_core)?;

    Ok(Json(items))
}

/// POST /api/imports/:id/confirm - Materialize all items into ledger entries
pub async fn confirm_import(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.confirm_import(id).map_err(AppError::from_core)?;

    info!("Import session {} confirmed", id);
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/imports/:id/cancel - Discard the session without ledger entries
pub async fn cancel_import(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.cancel_import(id).map_err(AppError::from_core)?;

    info!("Import session {} cancelled", id);
    Ok(Json(SuccessResponse { success: true }))
}

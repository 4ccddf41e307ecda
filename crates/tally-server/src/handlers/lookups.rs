//! Classification lookup handlers: categories, suppliers, clients
//!
//! Thin list/create endpoints supplying the review UI with valid
//! classification targets.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::{AppError, AppState};
use tally_core::models::{Category, Client, Supplier};

/// Request body for creating any named lookup record
#[derive(Debug, Deserialize)]
pub struct CreateNamedRequest {
    pub name: String,
}

fn validate_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    Ok(trimmed)
}

/// GET /api/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state.db.list_categories().map_err(AppError::from_core)?;
    Ok(Json(categories))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNamedRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let name = validate_name(&req.name)?;
    let category = state.db.create_category(name).map_err(AppError::from_core)?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/suppliers
pub async fn list_suppliers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Supplier>>, AppError> {
    let suppliers = state.db.list_suppliers().map_err(AppError::from_core)?;
    Ok(Json(suppliers))
}

/// POST /api/suppliers
pub async fn create_supplier(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNamedRequest>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    let name = validate_name(&req.name)?;
    let supplier = state.db.create_supplier(name).map_err(AppError::from_core)?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// GET /api/clients
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Client>>, AppError> {
    let clients = state.db.list_clients().map_err(AppError::from_core)?;
    Ok(Json(clients))
}

/// POST /api/clients
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNamedRequest>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    let name = validate_name(&req.name)?;
    let client = state.db.create_client(name).map_err(AppError::from_core)?;
    Ok((StatusCode::CREATED, Json(client)))
}

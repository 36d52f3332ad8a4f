use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::owner::{Owner, OwnerUpdate};
use crate::validation::{Validator, OWNER_NAME_LEN};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOwnerRequest {
    pub full_name: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOwnerRequest {
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
}

/// POST /api/v1/owners
pub async fn create_owner(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateOwnerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Owner>), AppError> {
    let Json(payload) = payload?;
    Validator::new()
        .length("full_name", &payload.full_name, OWNER_NAME_LEN)
        .finish()?;

    let owner = state
        .owners
        .insert_owner(&payload.full_name, payload.is_active)
        .await?;
    tracing::info!(owner_id = %owner.id, "owner created");
    Ok((StatusCode::CREATED, Json(owner)))
}

/// GET /api/v1/owners
pub async fn list_owners(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Owner>>, AppError> {
    Ok(Json(state.owners.list_owners().await?))
}

/// GET /api/v1/owners/:owner_id
pub async fn get_owner(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Owner>, AppError> {
    let Path(owner_id) = path?;
    let owner = state
        .owners
        .get_owner(owner_id)
        .await?
        .ok_or_else(|| AppError::not_found("owner not found"))?;
    Ok(Json(owner))
}

/// PUT /api/v1/owners/:owner_id: Partial update
pub async fn update_owner(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateOwnerRequest>, JsonRejection>,
) -> Result<Json<Owner>, AppError> {
    let Path(owner_id) = path?;
    let Json(payload) = payload?;
    Validator::new()
        .length_opt("full_name", payload.full_name.as_deref(), OWNER_NAME_LEN)
        .finish()?;

    let update = OwnerUpdate {
        full_name: payload.full_name,
        is_active: payload.is_active,
    };
    let owner = state
        .owners
        .update_owner(owner_id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("owner not found"))?;
    Ok(Json(owner))
}

/// DELETE /api/v1/owners/:owner_id: Owned bots are kept and lose their owner
pub async fn delete_owner(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(owner_id) = path?;
    if !state.owners.delete_owner(owner_id).await? {
        return Err(AppError::not_found("owner not found"));
    }
    tracing::info!(owner_id = %owner_id, "owner deleted");
    Ok(Json(json!({ "message": "owner deleted" })))
}

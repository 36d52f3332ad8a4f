use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::auth::{AdminIdentity, Identity};
use crate::models::token::Token;
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    pub bot_id: Option<Uuid>,
    pub token_name: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTokenRequest {
    pub token_name: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateTokenResponse {
    pub message: &'static str,
    pub token: Token,
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /api/v1/tokens: Issue a token. The response carries the credential.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    payload: Result<Json<CreateTokenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTokenResponse>), AppError> {
    let Json(payload) = payload?;
    let token = state
        .auth
        .create_token(payload.bot_id, &payload.token_name, payload.is_admin)
        .await?;
    tracing::info!(
        token_id = %token.id,
        issued_by = %admin.token_id,
        issuer_owner = ?admin.owner_id,
        "token issued via API"
    );
    Ok((StatusCode::CREATED, Json(CreateTokenResponse { token: token.id })))
}

/// GET /api/v1/tokens
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Token>>, AppError> {
    Ok(Json(state.auth.list_tokens().await?))
}

/// PUT /api/v1/tokens/:token_id: Rename
pub async fn update_token(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTokenRequest>, JsonRejection>,
) -> Result<Json<UpdateTokenResponse>, AppError> {
    let Path(token_id) = path?;
    let Json(payload) = payload?;
    let token = state.auth.update_token(token_id, &payload.token_name).await?;
    Ok(Json(UpdateTokenResponse {
        message: "token updated",
        token,
    }))
}

/// PATCH /api/v1/tokens/:token_id/deactivate
pub async fn deactivate_token(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(token_id) = path?;
    state.auth.deactivate_token(token_id).await?;
    Ok(Json(json!({ "message": "token deactivated" })))
}

/// DELETE /api/v1/tokens/:token_id
pub async fn delete_token(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(token_id) = path?;
    state.auth.delete_token(token_id).await?;
    Ok(Json(json!({ "message": "token deleted" })))
}

/// GET /api/v1/auth/me: The caller's own token record
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Token>, AppError> {
    Ok(Json(state.auth.get_me(identity.token_id).await?))
}

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
use crate::models::bot::{Bot, BotType, BotUpdate, Language, NewBot};
use crate::validation::{Validator, BOT_CODE_LEN, BOT_NAME_LEN};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBotRequest {
    pub code: String,
    pub name: String,
    pub bot_type: BotType,
    pub language: Language,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBotRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub bot_type: Option<BotType>,
    pub language: Option<Language>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub owner_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

async fn ensure_owner_exists(state: &AppState, owner_id: Option<Uuid>) -> Result<(), AppError> {
    if let Some(owner_id) = owner_id {
        if state.owners.get_owner(owner_id).await?.is_none() {
            return Err(AppError::not_found(format!("owner {} not found", owner_id)));
        }
    }
    Ok(())
}

/// POST /api/v1/bots
pub async fn create_bot(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBotRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Bot>), AppError> {
    let Json(payload) = payload?;
    Validator::new()
        .length("code", &payload.code, BOT_CODE_LEN)
        .length("name", &payload.name, BOT_NAME_LEN)
        .finish()?;
    ensure_owner_exists(&state, payload.owner_id).await?;

    let bot = state
        .bots
        .insert_bot(&NewBot {
            code: payload.code,
            name: payload.name,
            bot_type: payload.bot_type,
            language: payload.language,
            description: payload.description,
            tags: payload.tags,
            owner_id: payload.owner_id,
            is_active: payload.is_active,
        })
        .await?;

    tracing::info!(bot_id = %bot.id, code = %bot.code, "bot created");
    Ok((StatusCode::CREATED, Json(bot)))
}

/// GET /api/v1/bots
pub async fn list_bots(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Bot>>, AppError> {
    Ok(Json(state.bots.list_bots().await?))
}

/// GET /api/v1/bots/:bot_id
pub async fn get_bot(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Bot>, AppError> {
    let Path(bot_id) = path?;
    let bot = state
        .bots
        .get_bot(bot_id)
        .await?
        .ok_or_else(|| AppError::not_found("bot not found"))?;
    Ok(Json(bot))
}

/// PUT /api/v1/bots/:bot_id: Partial update
pub async fn update_bot(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateBotRequest>, JsonRejection>,
) -> Result<Json<Bot>, AppError> {
    let Path(bot_id) = path?;
    let Json(payload) = payload?;
    Validator::new()
        .length_opt("code", payload.code.as_deref(), BOT_CODE_LEN)
        .length_opt("name", payload.name.as_deref(), BOT_NAME_LEN)
        .finish()?;
    ensure_owner_exists(&state, payload.owner_id).await?;

    let update = BotUpdate {
        code: payload.code,
        name: payload.name,
        bot_type: payload.bot_type,
        language: payload.language,
        description: payload.description,
        tags: payload.tags,
        owner_id: payload.owner_id,
        is_active: payload.is_active,
    };
    let bot = state
        .bots
        .update_bot(bot_id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("bot not found"))?;

    tracing::info!(bot_id = %bot_id, "bot updated");
    Ok(Json(bot))
}

/// DELETE /api/v1/bots/:bot_id: The bot's tokens and runs go with it
pub async fn delete_bot(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(bot_id) = path?;
    if !state.bots.delete_bot(bot_id).await? {
        return Err(AppError::not_found("bot not found"));
    }
    tracing::info!(bot_id = %bot_id, "bot deleted");
    Ok(Json(json!({ "message": "bot deleted" })))
}

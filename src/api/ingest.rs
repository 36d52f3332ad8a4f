//! Bot-facing write endpoints: log entries and efficiency runs.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::auth::Identity;
use crate::models::eff_run::{EffRun, NewEffRun, RunStatus};
use crate::models::log::{LogEntry, LogStatus};
use crate::notification::reporter::ErrorReport;
use crate::validation::Validator;
use crate::AppState;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Deserialize)]
pub struct CreateLogRequest {
    pub status: LogStatus,
    pub msg: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEffRunRequest {
    pub period_from: Option<DateTime<Utc>>,
    pub period_to: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub host: Option<String>,
    pub extra: Option<serde_json::Value>,
}

/// POST /api/v1/logs: The entry is attributed to the caller's bot, if any.
pub async fn create_log(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateLogRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LogEntry>), AppError> {
    let Json(payload) = payload?;
    Validator::new()
        .check("msg", !payload.msg.is_empty(), "must not be empty")
        .finish()?;

    let entry = state
        .logs
        .insert_log(identity.bot_id, payload.status, &payload.msg)
        .await?;

    if let Some(bot_id) = identity.bot_id {
        if entry.status.is_reportable() {
            forward_bot_error(&state, bot_id, &entry).await;
        }
    }

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Send an error-level bot log to the reporter, tagged with the bot's
/// code and name. A failed bot lookup still produces a report.
async fn forward_bot_error(state: &AppState, bot_id: Uuid, entry: &LogEntry) {
    let (code, name) = match state.bots.get_bot(bot_id).await {
        Ok(Some(bot)) => (bot.code, bot.name),
        Ok(None) => (UNKNOWN.to_string(), UNKNOWN.to_string()),
        Err(e) => {
            tracing::warn!(bot_id = %bot_id, error = %e, "bot lookup for error report failed");
            (UNKNOWN.to_string(), UNKNOWN.to_string())
        }
    };

    if let Some(report) =
        ErrorReport::bot_log(bot_id, &code, &name, entry.status, &entry.msg, entry.created_at)
    {
        state.reporter.report(report);
    }
}

/// POST /api/v1/eff-runs: Bot-scoped tokens only.
pub async fn create_eff_run(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateEffRunRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EffRun>), AppError> {
    let Json(payload) = payload?;

    let Some(bot_id) = identity.bot_id else {
        tracing::debug!(token_id = %identity.token_id, "eff-run without bot-scoped token");
        return Err(AppError::Forbidden(
            "recording a run requires a token linked to a bot".to_string(),
        ));
    };

    let period_ok = match (payload.period_from, payload.period_to) {
        (Some(from), Some(to)) => from <= to,
        _ => true,
    };
    let extra_ok = payload.extra.as_ref().map_or(true, |v| v.is_object());
    Validator::new()
        .check("period_to", period_ok, "must not be before period_from")
        .check("extra", extra_ok, "must be a JSON object")
        .finish()?;

    let run = state
        .eff_runs
        .insert_eff_run(&NewEffRun {
            bot_id,
            period_from: payload.period_from,
            period_to: payload.period_to,
            status: payload.status,
            host: payload.host,
            extra: payload.extra,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(run)))
}

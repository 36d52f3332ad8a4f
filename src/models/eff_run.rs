use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

text_enum! {
    /// Outcome of a bot run over a reporting period.
    RunStatus as "run status" {
        Success => "success",
        Warning => "warning",
        Error => "error",
    }
}

/// Periodic efficiency-run summary submitted by a bot.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EffRun {
    pub id: Uuid,
    pub bot_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_to: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEffRun {
    pub bot_id: Uuid,
    pub period_from: Option<DateTime<Utc>>,
    pub period_to: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub host: Option<String>,
    pub extra: Option<serde_json::Value>,
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

text_enum! {
    /// Severity of a bot log entry.
    LogStatus as "log status" {
        Debug => "Debug",
        Info => "Info",
        Warning => "Warning",
        Error => "Error",
        Critical => "Critical",
    }
}

impl LogStatus {
    /// Entries at this level are forwarded to the error-telemetry sink.
    pub fn is_reportable(&self) -> bool {
        matches!(self, LogStatus::Error | LogStatus::Critical)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LogEntry {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub status: LogStatus,
    pub msg: String,
    pub created_at: DateTime<Utc>,
}

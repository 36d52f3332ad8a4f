use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A person or team that owns bots.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Owner {
    pub id: Uuid,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct OwnerUpdate {
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
}

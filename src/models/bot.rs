use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

text_enum! {
    /// What kind of automation a bot is.
    BotType as "bot_type" {
        Ai => "AI",
        Backend => "Backend",
        Frontend => "Frontend",
        Robot => "Robot",
    }
}

text_enum! {
    Language as "language" {
        Python => "Python",
        Go => "Go",
        N8n => "N8N",
        Pix => "PIX",
        Js => "JS",
        C => "C",
        Other => "Other",
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Bot {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub bot_type: BotType,
    #[sqlx(try_from = "String")]
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBot {
    pub code: String,
    pub name: String,
    pub bot_type: BotType,
    pub language: Language,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub owner_id: Option<Uuid>,
    pub is_active: bool,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct BotUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub bot_type: Option<BotType>,
    pub language: Option<Language>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub owner_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

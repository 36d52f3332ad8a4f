use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A bearer credential record. The `id` doubles as the credential value.
///
/// `is_admin` and `bot_id` are fixed at creation; only `name` and
/// `is_active` ever change.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Token {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<Uuid>,
    pub name: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new token. Tokens are always created active.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub bot_id: Option<Uuid>,
    pub name: String,
    pub is_admin: bool,
}

/// Result of resolving a presented credential.
///
/// `owner_id` is only set when the token is linked to a bot that has an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub token_id: Uuid,
    pub bot_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub is_admin: bool,
    pub is_active: bool,
}

impl TokenInfo {
    pub fn from_token(token: &Token, owner_id: Option<Uuid>) -> Self {
        Self {
            token_id: token.id,
            bot_id: token.bot_id,
            owner_id,
            is_admin: token.is_admin,
            is_active: token.is_active,
        }
    }
}

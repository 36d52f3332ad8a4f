//! Token issuance, lifecycle and validation.
//!
//! The token id is the bearer credential: presenting the id is presenting
//! the secret. `is_admin` and the bot link are set once at issuance and no
//! operation here changes them.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::token::{NewToken, Token, TokenInfo};
use crate::store::{BotRepo, TokenRepo};
use crate::validation::validate_token_name;

#[derive(Clone)]
pub struct AuthService {
    tokens: Arc<dyn TokenRepo>,
    bots: Arc<dyn BotRepo>,
}

impl AuthService {
    pub fn new(tokens: Arc<dyn TokenRepo>, bots: Arc<dyn BotRepo>) -> Self {
        Self { tokens, bots }
    }

    /// Issue a new active token.
    ///
    /// A non-admin token must reference an existing bot. An admin token
    /// takes `bot_id` as given, without an existence check.
    pub async fn create_token(
        &self,
        bot_id: Option<Uuid>,
        name: &str,
        is_admin: bool,
    ) -> Result<Token, AppError> {
        validate_token_name(name)?;

        if !is_admin {
            let bot_id = bot_id.ok_or_else(|| {
                AppError::InvalidLinkage("bot_id is required for non-admin tokens".to_string())
            })?;
            if self.bots.get_bot(bot_id).await?.is_none() {
                return Err(AppError::InvalidLinkage(format!("bot {} not found", bot_id)));
            }
        }

        let token = self
            .tokens
            .insert_token(&NewToken {
                bot_id,
                name: name.to_string(),
                is_admin,
            })
            .await?;

        info!(token_id = %token.id, bot_id = ?token.bot_id, is_admin, "token issued");
        Ok(token)
    }

    /// Rename a token. Nothing else about it can change.
    pub async fn update_token(&self, token_id: Uuid, name: &str) -> Result<Token, AppError> {
        validate_token_name(name)?;

        let token = self
            .tokens
            .rename_token(token_id, name)
            .await?
            .ok_or_else(|| AppError::not_found("token not found"))?;

        info!(token_id = %token_id, "token renamed");
        Ok(token)
    }

    /// Soft delete: the record stays, validation starts reporting it inactive.
    pub async fn deactivate_token(&self, token_id: Uuid) -> Result<(), AppError> {
        if !self.tokens.deactivate_token(token_id).await? {
            return Err(AppError::not_found("token not found"));
        }
        info!(token_id = %token_id, "token deactivated");
        Ok(())
    }

    pub async fn delete_token(&self, token_id: Uuid) -> Result<(), AppError> {
        if !self.tokens.delete_token(token_id).await? {
            return Err(AppError::not_found("token not found"));
        }
        info!(token_id = %token_id, "token deleted");
        Ok(())
    }

    pub async fn list_tokens(&self) -> Result<Vec<Token>, AppError> {
        Ok(self.tokens.list_tokens().await?)
    }

    /// The token behind the current request. Can miss if the token was
    /// deleted after the request was authorized.
    pub async fn get_me(&self, token_id: Uuid) -> Result<Token, AppError> {
        self.tokens
            .get_token(token_id)
            .await?
            .ok_or_else(|| AppError::not_found("token not found"))
    }

    /// Resolve a presented credential. Read-only.
    ///
    /// A credential that is not a well-formed id gets the same `NotFound`
    /// as an unknown one. Inactive tokens resolve successfully; rejecting
    /// them is the gate's job.
    pub async fn validate_token(&self, credential: &str) -> Result<TokenInfo, AppError> {
        let Ok(token_id) = Uuid::parse_str(credential) else {
            debug!("credential is not a token id");
            return Err(AppError::not_found("token not found"));
        };

        let (token, owner_id) = self
            .tokens
            .get_token_with_owner(token_id)
            .await?
            .ok_or_else(|| AppError::not_found("token not found"))?;

        Ok(TokenInfo::from_token(&token, owner_id))
    }
}

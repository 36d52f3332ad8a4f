//! Repository traits over the relational store.
//!
//! Lookups return `Ok(None)` for a missing row; mutations that target a
//! single row return `Ok(false)` / `Ok(None)` when zero rows were affected.
//! `Err` is reserved for storage failures.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::bot::{Bot, BotUpdate, NewBot};
use crate::models::eff_run::{EffRun, NewEffRun};
use crate::models::log::{LogEntry, LogStatus};
use crate::models::owner::{Owner, OwnerUpdate};
use crate::models::token::{NewToken, Token};

pub mod postgres;

#[async_trait]
pub trait TokenRepo: Send + Sync {
    async fn insert_token(&self, token: &NewToken) -> anyhow::Result<Token>;

    async fn get_token(&self, token_id: Uuid) -> anyhow::Result<Option<Token>>;

    /// Token plus the owner of its linked bot, in one indexed read.
    async fn get_token_with_owner(
        &self,
        token_id: Uuid,
    ) -> anyhow::Result<Option<(Token, Option<Uuid>)>>;

    async fn list_tokens(&self) -> anyhow::Result<Vec<Token>>;

    async fn rename_token(&self, token_id: Uuid, name: &str) -> anyhow::Result<Option<Token>>;

    async fn deactivate_token(&self, token_id: Uuid) -> anyhow::Result<bool>;

    async fn delete_token(&self, token_id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait BotRepo: Send + Sync {
    async fn insert_bot(&self, bot: &NewBot) -> anyhow::Result<Bot>;

    async fn get_bot(&self, bot_id: Uuid) -> anyhow::Result<Option<Bot>>;

    async fn list_bots(&self) -> anyhow::Result<Vec<Bot>>;

    async fn update_bot(&self, bot_id: Uuid, update: &BotUpdate) -> anyhow::Result<Option<Bot>>;

    async fn delete_bot(&self, bot_id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait OwnerRepo: Send + Sync {
    async fn insert_owner(&self, full_name: &str, is_active: bool) -> anyhow::Result<Owner>;

    async fn get_owner(&self, owner_id: Uuid) -> anyhow::Result<Option<Owner>>;

    async fn list_owners(&self) -> anyhow::Result<Vec<Owner>>;

    async fn update_owner(
        &self,
        owner_id: Uuid,
        update: &OwnerUpdate,
    ) -> anyhow::Result<Option<Owner>>;

    async fn delete_owner(&self, owner_id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait LogRepo: Send + Sync {
    async fn insert_log(
        &self,
        bot_id: Option<Uuid>,
        status: LogStatus,
        msg: &str,
    ) -> anyhow::Result<LogEntry>;
}

#[async_trait]
pub trait EffRunRepo: Send + Sync {
    async fn insert_eff_run(&self, run: &NewEffRun) -> anyhow::Result<EffRun>;
}

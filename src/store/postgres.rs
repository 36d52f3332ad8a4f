use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{BotRepo, EffRunRepo, LogRepo, OwnerRepo, TokenRepo};
use crate::config::DatabaseConfig;
use crate::models::bot::{Bot, BotUpdate, NewBot};
use crate::models::eff_run::{EffRun, NewEffRun};
use crate::models::log::{LogEntry, LogStatus};
use crate::models::owner::{Owner, OwnerUpdate};
use crate::models::token::{NewToken, Token};

const TOKEN_COLUMNS: &str = "id, bot_id, name, is_active, is_admin, created_at";
const BOT_COLUMNS: &str =
    "id, code, name, bot_type, language, description, tags, owner_id, is_active, created_at, updated_at";
const OWNER_COLUMNS: &str = "id, full_name, is_active, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct TokenOwnerRow {
    #[sqlx(flatten)]
    token: Token,
    owner_id: Option<Uuid>,
}

impl PgStore {
    /// Open the pool. sqlx has no separate idle ceiling; idle sessions
    /// above demand are reaped by `idle_timeout`.
    pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .max_lifetime(cfg.max_lifetime)
            .idle_timeout(cfg.idle_timeout)
            .acquire_timeout(cfg.acquire_timeout)
            .connect(&cfg.url)
            .await
            .context("failed to connect to database")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

// -- Token Operations --

#[async_trait]
impl TokenRepo for PgStore {
    async fn insert_token(&self, token: &NewToken) -> anyhow::Result<Token> {
        let row = sqlx::query_as::<_, Token>(&format!(
            "INSERT INTO tokens (bot_id, name, is_active, is_admin) VALUES ($1, $2, true, $3) RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(token.bot_id)
        .bind(&token.name)
        .bind(token.is_admin)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_token(&self, token_id: Uuid) -> anyhow::Result<Option<Token>> {
        let row = sqlx::query_as::<_, Token>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = $1"
        ))
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_token_with_owner(
        &self,
        token_id: Uuid,
    ) -> anyhow::Result<Option<(Token, Option<Uuid>)>> {
        let row = sqlx::query_as::<_, TokenOwnerRow>(
            r#"SELECT t.id, t.bot_id, t.name, t.is_active, t.is_admin, t.created_at, b.owner_id
               FROM tokens t
               LEFT JOIN bots b ON t.bot_id = b.id
               WHERE t.id = $1"#,
        )
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| (r.token, r.owner_id)))
    }

    async fn list_tokens(&self) -> anyhow::Result<Vec<Token>> {
        let rows = sqlx::query_as::<_, Token>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn rename_token(&self, token_id: Uuid, name: &str) -> anyhow::Result<Option<Token>> {
        let row = sqlx::query_as::<_, Token>(&format!(
            "UPDATE tokens SET name = $2 WHERE id = $1 RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(token_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn deactivate_token(&self, token_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE tokens SET is_active = false WHERE id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_token(&self, token_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// -- Bot Operations --

#[async_trait]
impl BotRepo for PgStore {
    async fn insert_bot(&self, bot: &NewBot) -> anyhow::Result<Bot> {
        let row = sqlx::query_as::<_, Bot>(&format!(
            r#"INSERT INTO bots (code, name, bot_type, language, description, tags, owner_id, is_active)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {BOT_COLUMNS}"#
        ))
        .bind(&bot.code)
        .bind(&bot.name)
        .bind(bot.bot_type.as_str())
        .bind(bot.language.as_str())
        .bind(&bot.description)
        .bind(&bot.tags)
        .bind(bot.owner_id)
        .bind(bot.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_bot(&self, bot_id: Uuid) -> anyhow::Result<Option<Bot>> {
        let row = sqlx::query_as::<_, Bot>(&format!("SELECT {BOT_COLUMNS} FROM bots WHERE id = $1"))
            .bind(bot_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_bots(&self) -> anyhow::Result<Vec<Bot>> {
        let rows = sqlx::query_as::<_, Bot>(&format!(
            "SELECT {BOT_COLUMNS} FROM bots ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_bot(&self, bot_id: Uuid, update: &BotUpdate) -> anyhow::Result<Option<Bot>> {
        let row = sqlx::query_as::<_, Bot>(&format!(
            r#"UPDATE bots
               SET code = COALESCE($2, code),
                   name = COALESCE($3, name),
                   bot_type = COALESCE($4, bot_type),
                   language = COALESCE($5, language),
                   description = COALESCE($6, description),
                   tags = COALESCE($7, tags),
                   owner_id = COALESCE($8, owner_id),
                   is_active = COALESCE($9, is_active),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {BOT_COLUMNS}"#
        ))
        .bind(bot_id)
        .bind(&update.code)
        .bind(&update.name)
        .bind(update.bot_type.map(|t| t.as_str()))
        .bind(update.language.map(|l| l.as_str()))
        .bind(&update.description)
        .bind(&update.tags)
        .bind(update.owner_id)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Removes the bot and every token linked to it. `tokens.bot_id` has no
    /// foreign key, so the tokens go in the same transaction.
    async fn delete_bot(&self, bot_id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM bots WHERE id = $1")
            .bind(bot_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM tokens WHERE bot_id = $1")
            .bind(bot_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

// -- Owner Operations --

#[async_trait]
impl OwnerRepo for PgStore {
    async fn insert_owner(&self, full_name: &str, is_active: bool) -> anyhow::Result<Owner> {
        let row = sqlx::query_as::<_, Owner>(&format!(
            "INSERT INTO owners (full_name, is_active) VALUES ($1, $2) RETURNING {OWNER_COLUMNS}"
        ))
        .bind(full_name)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_owner(&self, owner_id: Uuid) -> anyhow::Result<Option<Owner>> {
        let row = sqlx::query_as::<_, Owner>(&format!(
            "SELECT {OWNER_COLUMNS} FROM owners WHERE id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_owners(&self) -> anyhow::Result<Vec<Owner>> {
        let rows = sqlx::query_as::<_, Owner>(&format!(
            "SELECT {OWNER_COLUMNS} FROM owners ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_owner(
        &self,
        owner_id: Uuid,
        update: &OwnerUpdate,
    ) -> anyhow::Result<Option<Owner>> {
        let row = sqlx::query_as::<_, Owner>(&format!(
            r#"UPDATE owners
               SET full_name = COALESCE($2, full_name),
                   is_active = COALESCE($3, is_active)
               WHERE id = $1
               RETURNING {OWNER_COLUMNS}"#
        ))
        .bind(owner_id)
        .bind(&update.full_name)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_owner(&self, owner_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM owners WHERE id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// -- Log / Efficiency Run Operations --

#[async_trait]
impl LogRepo for PgStore {
    async fn insert_log(
        &self,
        bot_id: Option<Uuid>,
        status: LogStatus,
        msg: &str,
    ) -> anyhow::Result<LogEntry> {
        let row = sqlx::query_as::<_, LogEntry>(
            r#"INSERT INTO logs (bot_id, status, msg)
               VALUES ($1, $2, $3)
               RETURNING id, bot_id, status, msg, created_at"#,
        )
        .bind(bot_id)
        .bind(status.as_str())
        .bind(msg)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl EffRunRepo for PgStore {
    async fn insert_eff_run(&self, run: &NewEffRun) -> anyhow::Result<EffRun> {
        let row = sqlx::query_as::<_, EffRun>(
            r#"INSERT INTO eff_runs (bot_id, period_from, period_to, status, host, extra)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, bot_id, period_from, period_to, status, host, extra, created_at"#,
        )
        .bind(run.bot_id)
        .bind(run.period_from)
        .bind(run.period_to)
        .bind(run.status.as_str())
        .bind(&run.host)
        .bind(&run.extra)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

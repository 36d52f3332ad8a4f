//! Shared fixtures: an in-memory store implementing every repository trait
//! with the same constraint behaviour as the Postgres schema, and helpers
//! that drive the real router with `oneshot`.

#![allow(dead_code)]

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use sqlx::error::{DatabaseError, ErrorKind};
use tower::ServiceExt;
use uuid::Uuid;

use logging_api::models::bot::{Bot, BotType, BotUpdate, Language, NewBot};
use logging_api::models::eff_run::{EffRun, NewEffRun};
use logging_api::models::log::{LogEntry, LogStatus};
use logging_api::models::owner::{Owner, OwnerUpdate};
use logging_api::models::token::{NewToken, Token};
use logging_api::notification::reporter::ErrorReporter;
use logging_api::store::{BotRepo, EffRunRepo, LogRepo, OwnerRepo, TokenRepo};
use logging_api::{api, AppState};

// ── Constraint errors ────────────────────────────────────────

#[derive(Debug)]
struct ConstraintViolation {
    kind: ErrorKind,
    message: &'static str,
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl std::error::Error for ConstraintViolation {}

impl DatabaseError for ConstraintViolation {
    fn message(&self) -> &str {
        self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        match self.kind {
            ErrorKind::UniqueViolation => Some(Cow::Borrowed("23505")),
            ErrorKind::ForeignKeyViolation => Some(Cow::Borrowed("23503")),
            _ => None,
        }
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        match self.kind {
            ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
            ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
            _ => ErrorKind::Other,
        }
    }
}

fn unique_violation(message: &'static str) -> anyhow::Error {
    sqlx::Error::Database(Box::new(ConstraintViolation {
        kind: ErrorKind::UniqueViolation,
        message,
    }))
    .into()
}

fn foreign_key_violation(message: &'static str) -> anyhow::Error {
    sqlx::Error::Database(Box::new(ConstraintViolation {
        kind: ErrorKind::ForeignKeyViolation,
        message,
    }))
    .into()
}

// ── In-memory store ──────────────────────────────────────────

#[derive(Default)]
struct Tables {
    tokens: Vec<Token>,
    bots: Vec<Bot>,
    owners: Vec<Owner>,
    logs: Vec<LogEntry>,
    eff_runs: Vec<EffRun>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    failing: Arc<AtomicBool>,
    bot_lookups: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every repository call fails like an unreachable database.
    pub fn fail_storage(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn available(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("pool timed out while waiting for an open connection");
        }
        Ok(())
    }

    /// Number of `get_bot` calls served so far.
    pub fn bot_lookups(&self) -> usize {
        self.bot_lookups.load(Ordering::SeqCst)
    }

    pub fn token_count(&self) -> usize {
        self.tables.lock().unwrap().tokens.len()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.tables.lock().unwrap().logs.clone()
    }

    pub fn eff_runs(&self) -> Vec<EffRun> {
        self.tables.lock().unwrap().eff_runs.clone()
    }

    pub fn seed_owner(&self, full_name: &str) -> Owner {
        let owner = Owner {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().owners.push(owner.clone());
        owner
    }

    pub fn seed_bot(&self, code: &str, name: &str, owner_id: Option<Uuid>) -> Bot {
        let now = Utc::now();
        let bot = Bot {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: name.to_string(),
            bot_type: BotType::Backend,
            language: Language::Python,
            description: None,
            tags: vec![],
            owner_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().bots.push(bot.clone());
        bot
    }
}

#[async_trait]
impl TokenRepo for MemoryStore {
    async fn insert_token(&self, token: &NewToken) -> anyhow::Result<Token> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        let row = Token {
            id: Uuid::new_v4(),
            bot_id: token.bot_id,
            name: token.name.clone(),
            is_active: true,
            is_admin: token.is_admin,
            created_at: Utc::now(),
        };
        t.tokens.push(row.clone());
        Ok(row)
    }

    async fn get_token(&self, token_id: Uuid) -> anyhow::Result<Option<Token>> {
        self.available()?;
        let t = self.tables.lock().unwrap();
        Ok(t.tokens.iter().find(|tok| tok.id == token_id).cloned())
    }

    async fn get_token_with_owner(
        &self,
        token_id: Uuid,
    ) -> anyhow::Result<Option<(Token, Option<Uuid>)>> {
        self.available()?;
        let t = self.tables.lock().unwrap();
        Ok(t.tokens.iter().find(|tok| tok.id == token_id).map(|tok| {
            let owner_id = tok
                .bot_id
                .and_then(|bot_id| t.bots.iter().find(|b| b.id == bot_id))
                .and_then(|b| b.owner_id);
            (tok.clone(), owner_id)
        }))
    }

    async fn list_tokens(&self) -> anyhow::Result<Vec<Token>> {
        self.available()?;
        Ok(self.tables.lock().unwrap().tokens.clone())
    }

    async fn rename_token(&self, token_id: Uuid, name: &str) -> anyhow::Result<Option<Token>> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        Ok(t.tokens.iter_mut().find(|tok| tok.id == token_id).map(|tok| {
            tok.name = name.to_string();
            tok.clone()
        }))
    }

    async fn deactivate_token(&self, token_id: Uuid) -> anyhow::Result<bool> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        match t.tokens.iter_mut().find(|tok| tok.id == token_id) {
            Some(tok) => {
                tok.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_token(&self, token_id: Uuid) -> anyhow::Result<bool> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        let before = t.tokens.len();
        t.tokens.retain(|tok| tok.id != token_id);
        Ok(t.tokens.len() < before)
    }
}

#[async_trait]
impl BotRepo for MemoryStore {
    async fn insert_bot(&self, bot: &NewBot) -> anyhow::Result<Bot> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        if t.bots.iter().any(|b| b.code == bot.code) {
            return Err(unique_violation("bots_code_key"));
        }
        if let Some(owner_id) = bot.owner_id {
            if !t.owners.iter().any(|o| o.id == owner_id) {
                return Err(foreign_key_violation("bots_owner_id_fkey"));
            }
        }
        let now = Utc::now();
        let row = Bot {
            id: Uuid::new_v4(),
            code: bot.code.clone(),
            name: bot.name.clone(),
            bot_type: bot.bot_type,
            language: bot.language,
            description: bot.description.clone(),
            tags: bot.tags.clone(),
            owner_id: bot.owner_id,
            is_active: bot.is_active,
            created_at: now,
            updated_at: now,
        };
        t.bots.push(row.clone());
        Ok(row)
    }

    async fn get_bot(&self, bot_id: Uuid) -> anyhow::Result<Option<Bot>> {
        self.bot_lookups.fetch_add(1, Ordering::SeqCst);
        self.available()?;
        let t = self.tables.lock().unwrap();
        Ok(t.bots.iter().find(|b| b.id == bot_id).cloned())
    }

    async fn list_bots(&self) -> anyhow::Result<Vec<Bot>> {
        self.available()?;
        Ok(self.tables.lock().unwrap().bots.clone())
    }

    async fn update_bot(&self, bot_id: Uuid, update: &BotUpdate) -> anyhow::Result<Option<Bot>> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        if let Some(code) = &update.code {
            if t.bots.iter().any(|b| &b.code == code && b.id != bot_id) {
                return Err(unique_violation("bots_code_key"));
            }
        }
        let Some(bot) = t.bots.iter_mut().find(|b| b.id == bot_id) else {
            return Ok(None);
        };
        if let Some(code) = &update.code {
            bot.code = code.clone();
        }
        if let Some(name) = &update.name {
            bot.name = name.clone();
        }
        if let Some(bot_type) = update.bot_type {
            bot.bot_type = bot_type;
        }
        if let Some(language) = update.language {
            bot.language = language;
        }
        if let Some(description) = &update.description {
            bot.description = Some(description.clone());
        }
        if let Some(tags) = &update.tags {
            bot.tags = tags.clone();
        }
        if let Some(owner_id) = update.owner_id {
            bot.owner_id = Some(owner_id);
        }
        if let Some(is_active) = update.is_active {
            bot.is_active = is_active;
        }
        bot.updated_at = Utc::now();
        Ok(Some(bot.clone()))
    }

    async fn delete_bot(&self, bot_id: Uuid) -> anyhow::Result<bool> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        let before = t.bots.len();
        t.bots.retain(|b| b.id != bot_id);
        if t.bots.len() == before {
            return Ok(false);
        }
        // tokens go with the bot; runs cascade, logs are orphaned
        t.tokens.retain(|tok| tok.bot_id != Some(bot_id));
        t.eff_runs.retain(|r| r.bot_id != bot_id);
        for log in t.logs.iter_mut().filter(|l| l.bot_id == Some(bot_id)) {
            log.bot_id = None;
        }
        Ok(true)
    }
}

#[async_trait]
impl OwnerRepo for MemoryStore {
    async fn insert_owner(&self, full_name: &str, is_active: bool) -> anyhow::Result<Owner> {
        self.available()?;
        let row = Owner {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            is_active,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().owners.push(row.clone());
        Ok(row)
    }

    async fn get_owner(&self, owner_id: Uuid) -> anyhow::Result<Option<Owner>> {
        self.available()?;
        let t = self.tables.lock().unwrap();
        Ok(t.owners.iter().find(|o| o.id == owner_id).cloned())
    }

    async fn list_owners(&self) -> anyhow::Result<Vec<Owner>> {
        self.available()?;
        Ok(self.tables.lock().unwrap().owners.clone())
    }

    async fn update_owner(
        &self,
        owner_id: Uuid,
        update: &OwnerUpdate,
    ) -> anyhow::Result<Option<Owner>> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        Ok(t.owners.iter_mut().find(|o| o.id == owner_id).map(|o| {
            if let Some(full_name) = &update.full_name {
                o.full_name = full_name.clone();
            }
            if let Some(is_active) = update.is_active {
                o.is_active = is_active;
            }
            o.clone()
        }))
    }

    async fn delete_owner(&self, owner_id: Uuid) -> anyhow::Result<bool> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        let before = t.owners.len();
        t.owners.retain(|o| o.id != owner_id);
        if t.owners.len() == before {
            return Ok(false);
        }
        for bot in t.bots.iter_mut().filter(|b| b.owner_id == Some(owner_id)) {
            bot.owner_id = None;
        }
        Ok(true)
    }
}

#[async_trait]
impl LogRepo for MemoryStore {
    async fn insert_log(
        &self,
        bot_id: Option<Uuid>,
        status: LogStatus,
        msg: &str,
    ) -> anyhow::Result<LogEntry> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        let row = LogEntry {
            id: t.logs.len() as i64 + 1,
            bot_id,
            status,
            msg: msg.to_string(),
            created_at: Utc::now(),
        };
        t.logs.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl EffRunRepo for MemoryStore {
    async fn insert_eff_run(&self, run: &NewEffRun) -> anyhow::Result<EffRun> {
        self.available()?;
        let mut t = self.tables.lock().unwrap();
        if !t.bots.iter().any(|b| b.id == run.bot_id) {
            return Err(foreign_key_violation("eff_runs_bot_id_fkey"));
        }
        let row = EffRun {
            id: Uuid::new_v4(),
            bot_id: run.bot_id,
            period_from: run.period_from,
            period_to: run.period_to,
            status: run.status,
            host: run.host.clone(),
            extra: run.extra.clone(),
            created_at: Utc::now(),
        };
        t.eff_runs.push(row.clone());
        Ok(row)
    }
}

// ── Router harness ───────────────────────────────────────────

pub struct TestApp {
    pub store: MemoryStore,
    pub state: Arc<AppState>,
    pub router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_reporter(ErrorReporter::disabled())
    }

    pub fn with_reporter(reporter: ErrorReporter) -> Self {
        let store = MemoryStore::new();
        let state = Arc::new(AppState::new(store.clone(), reporter));
        let router = api::router(state.clone());
        Self {
            store,
            state,
            router,
        }
    }

    pub async fn admin_token(&self) -> Uuid {
        self.state
            .auth
            .create_token(None, "Admin Key", true)
            .await
            .unwrap()
            .id
    }

    pub async fn bot_token(&self, bot_id: Uuid) -> Uuid {
        self.state
            .auth
            .create_token(Some(bot_id), "Bot Key", false)
            .await
            .unwrap()
            .id
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send with `Authorization: Bearer <token>`.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Uuid,
        body: Option<Value>,
    ) -> TestResponse {
        let auth = format!("Bearer {}", token);
        self.send(method, uri, Some(&auth), body).await
    }
}

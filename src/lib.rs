//! Logging API: bot log ingestion behind bearer-token auth.
//!
//! The binary in `main.rs` wires these modules to Postgres; integration
//! tests in `tests/` drive the same router against an in-memory store.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod notification;
pub mod store;
pub mod validation;

use auth::AuthService;
use notification::reporter::ErrorReporter;
use store::{BotRepo, EffRunRepo, LogRepo, OwnerRepo, TokenRepo};

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub auth: AuthService,
    pub bots: Arc<dyn BotRepo>,
    pub owners: Arc<dyn OwnerRepo>,
    pub logs: Arc<dyn LogRepo>,
    pub eff_runs: Arc<dyn EffRunRepo>,
    pub reporter: ErrorReporter,
}

impl AppState {
    /// Build state over a single store that backs every repository.
    pub fn new<S>(store: S, reporter: ErrorReporter) -> Self
    where
        S: TokenRepo + BotRepo + OwnerRepo + LogRepo + EffRunRepo + 'static,
    {
        let store = Arc::new(store);
        Self {
            auth: AuthService::new(store.clone(), store.clone()),
            bots: store.clone(),
            owners: store.clone(),
            logs: store.clone(),
            eff_runs: store,
            reporter,
        }
    }
}

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::middleware::auth::{require_admin, require_auth};
use crate::middleware::headers::{request_id, security_headers};
use crate::middleware::telemetry::capture_failures;
use crate::AppState;

pub mod bots;
pub mod ingest;
pub mod owners;
pub mod tokens;

/// Build the full HTTP router.
///
/// `/health` is open. Everything under `/api/v1` passes the token gate:
/// ingestion and self-lookup need any active token, management routes
/// need an admin token.
pub fn router(state: Arc<AppState>) -> Router {
    let authenticated = Router::new()
        .route("/auth/me", get(tokens::get_me))
        .route("/logs", post(ingest::create_log))
        .route("/eff-runs", post(ingest::create_eff_run))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route(
            "/tokens",
            get(tokens::list_tokens).post(tokens::create_token),
        )
        .route(
            "/tokens/:token_id",
            put(tokens::update_token).delete(tokens::delete_token),
        )
        .route("/tokens/:token_id/deactivate", patch(tokens::deactivate_token))
        .route(
            "/owners",
            get(owners::list_owners).post(owners::create_owner),
        )
        .route(
            "/owners/:owner_id",
            get(owners::get_owner)
                .put(owners::update_owner)
                .delete(owners::delete_owner),
        )
        .route("/bots", get(bots::list_bots).post(bots::create_bot))
        .route(
            "/bots/:bot_id",
            get(bots::get_bot).put(bots::update_bot).delete(bots::delete_bot),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", authenticated.merge(admin))
        .fallback(fallback_404)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, capture_failures))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(security_headers))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn fallback_404() -> AppError {
    AppError::not_found("route not found")
}

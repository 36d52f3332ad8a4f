//! Bearer-token gate for the API.
//!
//! Both capability levels share `authenticate`; `require_auth` and
//! `require_admin` differ only in the predicates they apply afterwards and
//! the identity they bind to the request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::token::TokenInfo;
use crate::AppState;

/// Identity of an authenticated caller. Bound to every request that
/// passes the gate and read by handlers through `Extension<Identity>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub token_id: Uuid,
    pub bot_id: Option<Uuid>,
    pub is_admin: bool,
}

/// Extra context bound only on admin routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub token_id: Uuid,
    pub owner_id: Option<Uuid>,
}

impl From<&TokenInfo> for Identity {
    fn from(info: &TokenInfo) -> Self {
        Self {
            token_id: info.token_id,
            bot_id: info.bot_id,
            is_admin: info.is_admin,
        }
    }
}

impl From<&TokenInfo> for AdminIdentity {
    fn from(info: &TokenInfo) -> Self {
        Self {
            token_id: info.token_id,
            owner_id: info.owner_id,
        }
    }
}

/// Pull the credential out of an `Authorization` header value.
///
/// `Bearer <token>` with any casing of the scheme, or the bare token.
/// Returns `""` when there is nothing to use.
pub fn extract_bearer(header: Option<&str>) -> &str {
    let Some(value) = header.map(str::trim) else {
        return "";
    };
    match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    }
}

pub fn ensure_active(info: &TokenInfo) -> Result<(), AppError> {
    if info.is_active {
        Ok(())
    } else {
        tracing::debug!(token_id = %info.token_id, "rejected inactive token");
        Err(AppError::Inactive)
    }
}

pub fn ensure_admin(info: &TokenInfo) -> Result<(), AppError> {
    if info.is_admin {
        Ok(())
    } else {
        tracing::debug!(token_id = %info.token_id, "admin route denied");
        Err(AppError::Forbidden("admin privileges required".to_string()))
    }
}

/// Resolve the caller from the request headers and require an active token.
///
/// Unknown and malformed credentials both come back as the same 401.
/// Storage failures pass through untouched.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<TokenInfo, AppError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let credential = extract_bearer(header);
    if credential.is_empty() {
        tracing::debug!("request without credential");
        return Err(AppError::Unauthorized("missing token"));
    }

    let info = state
        .auth
        .validate_token(credential)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                tracing::debug!("credential did not resolve");
                AppError::Unauthorized("invalid token")
            } else {
                e
            }
        })?;

    ensure_active(&info)?;
    Ok(info)
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let info = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(Identity::from(&info));
    Ok(next.run(req).await)
}

pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let info = authenticate(&state, req.headers()).await?;
    ensure_admin(&info)?;
    req.extensions_mut().insert(Identity::from(&info));
    req.extensions_mut().insert(AdminIdentity::from(&info));
    Ok(next.run(req).await)
}

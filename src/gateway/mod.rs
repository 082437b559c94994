//! HTTP gateway
//!
//! Thin axum surface over the ledger core. Authentication lives upstream:
//! handlers trust the `X-Actor-Id` / `X-Actor-Role` headers the middleware
//! injects, and the core applies its own role gates on top.

pub mod handlers;
pub mod types;

use crate::config::LedgerConfig;
use crate::core::LedgerCore;
use crate::core_types::{Actor, Role};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use types::{ApiError, ApiResponse};

/// Shared gateway state.
pub struct AppState {
    pub core: LedgerCore,
    pub history_limit: u32,
}

impl AppState {
    pub fn new(core: LedgerCore, config: &LedgerConfig) -> Arc<Self> {
        Arc::new(Self {
            core,
            history_limit: config.history_limit,
        })
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("X-Actor-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| unauthorized("missing or invalid X-Actor-Id"))?;
        let role = parts
            .headers
            .get("X-Actor-Role")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Role>().ok())
            .ok_or_else(|| unauthorized("missing or invalid X-Actor-Role"))?;
        Ok(Actor { id, role })
    }
}

fn unauthorized(msg: &str) -> ApiError {
    (
        axum::http::StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()>::error("UNAUTHORIZED", msg)),
    )
}

/// Build the gateway router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/accounts", post(handlers::create_account))
        .route("/api/v1/accounts/{id}", get(handlers::get_account))
        .route("/api/v1/accounts/{id}/entries", get(handlers::get_entries))
        .route("/api/v1/accounts/{id}/package", post(handlers::select_package))
        .route("/api/v1/accounts/{id}/adjust", post(handlers::adjust_balance))
        .route(
            "/api/v1/accounts/{id}/referral/withdraw",
            post(handlers::withdraw_bonus),
        )
        .route("/api/v1/deposits", post(handlers::submit_deposit))
        .route("/api/v1/deposits/{id}", get(handlers::get_deposit))
        .route("/api/v1/deposits/{id}/review", post(handlers::review_deposit))
        .route("/api/v1/deposits/{id}/cancel", post(handlers::cancel_deposit))
        .route("/api/v1/withdrawals", post(handlers::request_withdrawal))
        .route("/api/v1/withdrawals/{id}", get(handlers::get_withdrawal))
        .route(
            "/api/v1/withdrawals/{id}/review",
            post(handlers::review_withdrawal),
        )
        .route("/api/v1/upgrades", post(handlers::submit_upgrade))
        .route("/api/v1/upgrades/{id}", get(handlers::get_upgrade))
        .route("/api/v1/upgrades/{id}/review", post(handlers::review_upgrade))
        .route("/api/v1/methods", get(handlers::list_methods))
        .with_state(state)
}

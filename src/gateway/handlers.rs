//! Gateway handlers
//!
//! Parse, delegate to the core, wrap in the response envelope. No financial
//! logic lives here.

use super::AppState;
use super::types::{ApiError, ApiResponse, bad_request, reject};
use crate::account::{Account, NewAccount};
use crate::adjustment::{AdjustDirection, Adjustment};
use crate::core_types::{AccountId, Actor};
use crate::deposit::{Deposit, DepositDecision};
use crate::entry::LedgerEntry;
use crate::error::LedgerError;
use crate::referral::BonusWithdrawal;
use crate::upgrade::{InvoiceAction, UpgradeInvoice};
use crate::withdrawal::{Withdrawal, WithdrawalMethod, WithdrawalStatus};
use axum::Json;
use axum::extract::{Path, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn parse_amount(raw: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw).map_err(|_| bad_request(format!("invalid amount: {}", raw)))
}

/// Owner-or-admin gate for self-service operations.
fn require_self(actor: Actor, account_id: AccountId) -> Result<(), ApiError> {
    if actor.id != account_id && !actor.role.is_admin() {
        return Err(reject(LedgerError::Forbidden));
    }
    Ok(())
}

// --- Requests ---

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub currency: String,
    pub referred_by: Option<AccountId>,
}

#[derive(Debug, Deserialize)]
pub struct SelectPackageRequest {
    pub package_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub amount: String,
    pub direction: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub account_id: AccountId,
    pub amount: String,
    pub currency: String,
    pub proof_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct DepositReviewRequest {
    pub decision: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalRequestBody {
    pub account_id: AccountId,
    pub amount: String,
    pub method_id: String,
    pub details: String,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalReviewRequest {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub account_id: AccountId,
    pub package_id: String,
    pub amount: String,
    pub currency: String,
    pub proof_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct UpgradeReviewRequest {
    pub action: String,
    pub reason: Option<String>,
}

// --- Handlers ---

/// GET /health
pub async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

/// POST /api/v1/accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Account> {
    let mut params = NewAccount::with_currency(&req.currency);
    params.referred_by = req.referred_by;
    let account = state
        .core
        .store()
        .create_account(params)
        .await
        .map_err(|e| reject(e.into()))?;
    Ok(Json(ApiResponse::success(account)))
}

/// GET /api/v1/accounts/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<AccountId>,
) -> ApiResult<Account> {
    require_self(actor, id)?;
    let account = state.core.account(id).await.map_err(reject)?;
    Ok(Json(ApiResponse::success(account)))
}

/// GET /api/v1/accounts/{id}/entries
pub async fn get_entries(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<AccountId>,
) -> ApiResult<Vec<LedgerEntry>> {
    require_self(actor, id)?;
    let entries = state
        .core
        .entries(id, state.history_limit)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(entries)))
}

/// POST /api/v1/accounts/{id}/package
pub async fn select_package(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<AccountId>,
    Json(req): Json<SelectPackageRequest>,
) -> ApiResult<&'static str> {
    require_self(actor, id)?;
    state
        .core
        .store()
        .select_package(id, &req.package_id)
        .await
        .map_err(|e| reject(e.into()))?;
    Ok(Json(ApiResponse::success("selected")))
}

/// POST /api/v1/accounts/{id}/adjust
pub async fn adjust_balance(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<AccountId>,
    Json(req): Json<AdjustRequest>,
) -> ApiResult<Adjustment> {
    let amount = parse_amount(&req.amount)?;
    let direction = AdjustDirection::from_str(&req.direction).map_err(bad_request)?;
    let adjustment = state
        .core
        .adjustments
        .adjust(id, actor, amount, direction, req.notes)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(adjustment)))
}

/// POST /api/v1/accounts/{id}/referral/withdraw
pub async fn withdraw_bonus(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<AccountId>,
) -> ApiResult<BonusWithdrawal> {
    require_self(actor, id)?;
    let outcome = state.core.referrals.withdraw_bonus(id).await.map_err(reject)?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /api/v1/deposits
pub async fn submit_deposit(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(req): Json<DepositRequest>,
) -> ApiResult<Deposit> {
    require_self(actor, req.account_id)?;
    let amount = parse_amount(&req.amount)?;
    let deposit = state
        .core
        .deposits
        .submit(req.account_id, amount, &req.currency, &req.proof_ref)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(deposit)))
}

/// POST /api/v1/deposits/{id}/review
pub async fn review_deposit(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<DepositReviewRequest>,
) -> ApiResult<Deposit> {
    let decision = DepositDecision::from_str(&req.decision).map_err(bad_request)?;
    let deposit = state
        .core
        .deposits
        .review(id, actor, decision, req.notes)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(deposit)))
}

/// POST /api/v1/deposits/{id}/cancel
pub async fn cancel_deposit(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> ApiResult<Deposit> {
    let deposit = state.core.deposits.cancel(id, actor).await.map_err(reject)?;
    Ok(Json(ApiResponse::success(deposit)))
}

/// POST /api/v1/withdrawals
pub async fn request_withdrawal(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(req): Json<WithdrawalRequestBody>,
) -> ApiResult<Withdrawal> {
    require_self(actor, req.account_id)?;
    let amount = parse_amount(&req.amount)?;
    let withdrawal = state
        .core
        .withdrawals
        .request(req.account_id, amount, &req.method_id, &req.details)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(withdrawal)))
}

/// POST /api/v1/withdrawals/{id}/review
pub async fn review_withdrawal(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<WithdrawalReviewRequest>,
) -> ApiResult<Withdrawal> {
    let verdict = WithdrawalStatus::from_str(&req.status).map_err(bad_request)?;
    let withdrawal = state
        .core
        .withdrawals
        .review(id, actor, verdict, req.notes)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(withdrawal)))
}

/// POST /api/v1/upgrades
pub async fn submit_upgrade(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(req): Json<UpgradeRequest>,
) -> ApiResult<UpgradeInvoice> {
    require_self(actor, req.account_id)?;
    let amount = parse_amount(&req.amount)?;
    let invoice = state
        .core
        .upgrades
        .submit(
            req.account_id,
            &req.package_id,
            amount,
            &req.currency,
            &req.proof_ref,
        )
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(invoice)))
}

/// POST /api/v1/upgrades/{id}/review
pub async fn review_upgrade(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpgradeReviewRequest>,
) -> ApiResult<UpgradeInvoice> {
    let action = match req.action.to_lowercase().as_str() {
        "approve" => InvoiceAction::Approve,
        "reject" => InvoiceAction::Reject,
        "dispute" => InvoiceAction::Dispute(req.reason.unwrap_or_default()),
        "resolve-approve" => InvoiceAction::ResolveApprove,
        "resolve-reject" => InvoiceAction::ResolveReject,
        other => return Err(bad_request(format!("invalid review action: {}", other))),
    };
    let invoice = state
        .core
        .upgrades
        .review(id, actor, action)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(invoice)))
}

/// GET /api/v1/deposits/{id}
pub async fn get_deposit(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> ApiResult<Deposit> {
    let deposit = state
        .core
        .store()
        .deposit(id)
        .await
        .map_err(|e| reject(e.into()))?
        .ok_or_else(|| reject(LedgerError::NotFound("deposit")))?;
    require_self(actor, deposit.account_id)?;
    Ok(Json(ApiResponse::success(deposit)))
}

/// GET /api/v1/withdrawals/{id}
pub async fn get_withdrawal(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> ApiResult<Withdrawal> {
    let withdrawal = state
        .core
        .store()
        .withdrawal(id)
        .await
        .map_err(|e| reject(e.into()))?
        .ok_or_else(|| reject(LedgerError::NotFound("withdrawal")))?;
    require_self(actor, withdrawal.account_id)?;
    Ok(Json(ApiResponse::success(withdrawal)))
}

/// GET /api/v1/upgrades/{id}
pub async fn get_upgrade(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> ApiResult<UpgradeInvoice> {
    let invoice = state
        .core
        .store()
        .invoice(id)
        .await
        .map_err(|e| reject(e.into()))?
        .ok_or_else(|| reject(LedgerError::NotFound("upgrade invoice")))?;
    require_self(actor, invoice.account_id)?;
    Ok(Json(ApiResponse::success(invoice)))
}

/// GET /api/v1/methods
pub async fn list_methods(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<WithdrawalMethod>> {
    let methods = state
        .core
        .store()
        .methods()
        .await
        .map_err(|e| reject(e.into()))?;
    Ok(Json(ApiResponse::success(methods)))
}

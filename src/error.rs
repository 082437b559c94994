//! Ledger Error Types
//!
//! One taxonomy for every financial flow. The gateway maps each variant to a
//! stable code string and HTTP status.

use crate::store::StoreError;
use thiserror::Error;

/// Ledger error taxonomy
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    // === Validation Errors ===
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    // === Idempotency Errors ===
    #[error("Duplicate ledger reference: {0}")]
    DuplicateReference(String),

    #[error("No pending referral bonus to withdraw")]
    NothingToWithdraw,

    // === Authorization ===
    #[error("Operation not permitted for this actor")]
    Forbidden,

    // === System Errors ===
    #[error("Ledger conflict - concurrent mutation, retry")]
    Conflict,

    #[error("Store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            LedgerError::InvalidTransition(_) => "INVALID_TRANSITION",
            LedgerError::DuplicateReference(_) => "DUPLICATE_REFERENCE",
            LedgerError::NothingToWithdraw => "NOTHING_TO_WITHDRAW",
            LedgerError::Forbidden => "FORBIDDEN",
            LedgerError::Conflict => "LEDGER_CONFLICT",
            LedgerError::Store(_) => "STORE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::Validation(_) => 400,
            LedgerError::Forbidden => 403,
            LedgerError::NotFound(_) => 404,
            LedgerError::InvalidTransition(_) | LedgerError::DuplicateReference(_) => 409,
            LedgerError::InsufficientFunds | LedgerError::NothingToWithdraw => 422,
            LedgerError::Store(_) => 500,
            LedgerError::Conflict => 503,
        }
    }

    /// Whether a caller may safely retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Conflict)
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => LedgerError::Conflict,
            StoreError::DuplicateReference(r) => LedgerError::DuplicateReference(r),
            StoreError::NotFound(what) => LedgerError::NotFound(what),
            StoreError::InsufficientFunds => LedgerError::InsufficientFunds,
            StoreError::Backend(msg) => LedgerError::Store(msg),
        }
    }
}

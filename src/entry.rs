//! Ledger entries - the audit trail
//!
//! One immutable row per monetary event. After creation only `status` may
//! change; amount, kind and account are frozen. The `reference` string is the
//! globally unique idempotency key.

use crate::core_types::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of monetary event recorded by a ledger entry.
///
/// IDs are stored as SMALLINT in PostgreSQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum EntryKind {
    Deposit = 1,
    Withdrawal = 2,
    AdminCredit = 3,
    AdminDebit = 4,
    ReferralBonus = 5,
    Upgrade = 6,
}

impl EntryKind {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(EntryKind::Deposit),
            2 => Some(EntryKind::Withdrawal),
            3 => Some(EntryKind::AdminCredit),
            4 => Some(EntryKind::AdminDebit),
            5 => Some(EntryKind::ReferralBonus),
            6 => Some(EntryKind::Upgrade),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Deposit => "deposit",
            EntryKind::Withdrawal => "withdrawal",
            EntryKind::AdminCredit => "admin_credit",
            EntryKind::AdminDebit => "admin_debit",
            EntryKind::ReferralBonus => "referral_bonus",
            EntryKind::Upgrade => "upgrade",
        }
    }

    /// Reference prefix for entries of this kind (e.g. "DEP-<uuid>").
    fn reference_prefix(&self) -> &'static str {
        match self {
            EntryKind::Deposit => "DEP",
            EntryKind::Withdrawal => "WDR",
            EntryKind::AdminCredit => "ADJC",
            EntryKind::AdminDebit => "ADJD",
            EntryKind::ReferralBonus => "REF",
            EntryKind::Upgrade => "UPG",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum EntryStatus {
    Pending = 0,
    Completed = 1,
    Failed = -1,
    Cancelled = -2,
}

impl EntryStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(EntryStatus::Pending),
            1 => Some(EntryStatus::Completed),
            -1 => Some(EntryStatus::Failed),
            -2 => Some(EntryStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Completed => "completed",
            EntryStatus::Failed => "failed",
            EntryStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses never transition again.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EntryStatus::Pending)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable audit record of one balance-affecting event.
///
/// `amount` is a positive magnitude; the direction is implied by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub reference: String,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub currency: String,
    pub kind: EntryKind,
    pub status: EntryStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new entry with a fresh unique reference.
    pub fn new(
        account_id: AccountId,
        amount: Decimal,
        currency: &str,
        kind: EntryKind,
        status: EntryStatus,
    ) -> Self {
        Self {
            reference: new_reference(kind),
            account_id,
            amount,
            currency: currency.to_string(),
            kind,
            status,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Create an entry under a caller-supplied reference (idempotency key).
    pub fn with_reference(
        reference: String,
        account_id: AccountId,
        amount: Decimal,
        currency: &str,
        kind: EntryKind,
        status: EntryStatus,
    ) -> Self {
        Self {
            reference,
            account_id,
            amount,
            currency: currency.to_string(),
            kind,
            status,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Attach audit notes (set at creation only; rows never change after).
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// Generate a globally unique ledger reference for the given kind.
pub fn new_reference(kind: EntryKind) -> String {
    format!("{}-{}", kind.reference_prefix(), Uuid::new_v4())
}

//! Withdrawal state machine
//!
//! Funds are debited at request time (optimistic hold) so a pending
//! withdrawal can never overdraw the account; a rejection refunds the hold
//! exactly once. Completed and Rejected are terminal.

use crate::core_types::{AccountId, Actor};
use crate::entry::{EntryKind, EntryStatus, LedgerEntry};
use crate::error::LedgerError;
use crate::events::{EventKind, LedgerEvent};
use crate::executor::{MutationExecutor, Staged};
use crate::store::{BalanceChange, LedgerStore, LedgerWrite, MutationUnit, StateWrite};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Withdrawal statuses. IDs are stored as SMALLINT.
///
/// Terminal: Completed, Rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum WithdrawalStatus {
    Pending = 0,
    Processing = 10,
    Completed = 20,
    Rejected = -10,
}

impl WithdrawalStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(WithdrawalStatus::Pending),
            10 => Some(WithdrawalStatus::Processing),
            20 => Some(WithdrawalStatus::Completed),
            -10 => Some(WithdrawalStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Processing => "processing",
            WithdrawalStatus::Completed => "completed",
            WithdrawalStatus::Rejected => "rejected",
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, WithdrawalStatus::Completed | WithdrawalStatus::Rejected)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WithdrawalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(WithdrawalStatus::Pending),
            "processing" => Ok(WithdrawalStatus::Processing),
            "completed" => Ok(WithdrawalStatus::Completed),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            _ => Err(format!("Invalid withdrawal status: {}", s)),
        }
    }
}

/// A configured payout method. Administered outside the ledger core; the
/// core only validates against it at request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalMethod {
    pub method_id: String,
    pub name: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub active: bool,
}

/// A user-submitted payout request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub withdrawal_id: Uuid,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub method_id: String,
    pub details: String,
    pub status: WithdrawalStatus,
    pub ledger_reference: String,
    pub reviewed_by: Option<AccountId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Withdrawal request and review operations.
#[derive(Clone)]
pub struct WithdrawalService {
    store: Arc<dyn LedgerStore>,
    executor: Arc<MutationExecutor>,
}

impl WithdrawalService {
    pub fn new(store: Arc<dyn LedgerStore>, executor: Arc<MutationExecutor>) -> Self {
        Self { store, executor }
    }

    /// Request a withdrawal. The debit, the Withdrawal row and the ledger
    /// entry land in one atomic unit; the balance guard inside that unit
    /// closes the race between concurrent requests on one account.
    pub async fn request(
        &self,
        account_id: AccountId,
        amount: Decimal,
        method_id: &str,
        details: &str,
    ) -> Result<Withdrawal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "withdrawal amount must be positive".into(),
            ));
        }

        self.executor
            .run(async || {
                let account = self
                    .store
                    .account(account_id)
                    .await?
                    .ok_or(LedgerError::NotFound("account"))?;
                let method = self
                    .store
                    .method(method_id)
                    .await?
                    .ok_or(LedgerError::NotFound("withdrawal method"))?;
                if !method.active {
                    return Err(LedgerError::Validation(format!(
                        "withdrawal method {} is inactive",
                        method.method_id
                    )));
                }
                if amount < method.min_amount || amount > method.max_amount {
                    return Err(LedgerError::Validation(format!(
                        "amount outside method limits [{}, {}]",
                        method.min_amount, method.max_amount
                    )));
                }

                let entry = LedgerEntry::new(
                    account_id,
                    amount,
                    &account.currency,
                    EntryKind::Withdrawal,
                    EntryStatus::Pending,
                );
                let now = Utc::now();
                let withdrawal = Withdrawal {
                    withdrawal_id: Uuid::new_v4(),
                    account_id,
                    amount,
                    method_id: method_id.to_string(),
                    details: details.to_string(),
                    status: WithdrawalStatus::Pending,
                    ledger_reference: entry.reference.clone(),
                    reviewed_by: None,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                };

                let event = LedgerEvent::new(
                    account_id,
                    EventKind::WithdrawalRequested,
                    json!({
                        "withdrawal_id": withdrawal.withdrawal_id,
                        "amount": amount.to_string(),
                        "method": method_id,
                    }),
                );
                let unit = MutationUnit::default()
                    .balance(BalanceChange::debit(account_id, amount))
                    .ledger(LedgerWrite::Create(entry))
                    .state(StateWrite::CreateWithdrawal(withdrawal.clone()));
                Ok(Staged::commit(unit, withdrawal, vec![event]))
            })
            .await
    }

    /// Review a withdrawal. Rejection refunds the hold exactly once; the
    /// status CAS guards against a concurrent double-refund. Re-issuing the
    /// current verdict is a no-op. Admin only.
    pub async fn review(
        &self,
        withdrawal_id: Uuid,
        actor: Actor,
        verdict: WithdrawalStatus,
        notes: Option<String>,
    ) -> Result<Withdrawal, LedgerError> {
        if !actor.role.is_admin() {
            return Err(LedgerError::Forbidden);
        }
        if verdict == WithdrawalStatus::Pending {
            return Err(LedgerError::InvalidTransition(
                "cannot move a withdrawal back to pending".into(),
            ));
        }

        self.executor
            .run(async || {
                let withdrawal = self
                    .store
                    .withdrawal(withdrawal_id)
                    .await?
                    .ok_or(LedgerError::NotFound("withdrawal"))?;
                let from = withdrawal.status;

                if from == verdict {
                    return Ok(Staged::done(withdrawal));
                }
                if from.is_terminal() {
                    return Err(LedgerError::InvalidTransition(format!(
                        "withdrawal is already {}",
                        from
                    )));
                }

                let (balance, entry_status, event_kind) = match verdict {
                    WithdrawalStatus::Rejected => (
                        // Refund the hold taken at request time.
                        Some(BalanceChange::credit(
                            withdrawal.account_id,
                            withdrawal.amount,
                        )),
                        Some(EntryStatus::Failed),
                        EventKind::WithdrawalRejected,
                    ),
                    WithdrawalStatus::Completed => (
                        None,
                        Some(EntryStatus::Completed),
                        EventKind::WithdrawalCompleted,
                    ),
                    WithdrawalStatus::Processing => (None, None, EventKind::WithdrawalProcessing),
                    WithdrawalStatus::Pending => unreachable!("rejected above"),
                };

                let mut unit = MutationUnit::default().state(StateWrite::WithdrawalStatus {
                    withdrawal_id: withdrawal.withdrawal_id,
                    expect: from,
                    set: verdict,
                    reviewed_by: Some(actor.id),
                    notes: notes.clone(),
                });
                if let Some(change) = balance {
                    unit = unit.balance(change);
                }
                if let Some(status) = entry_status {
                    unit = unit.ledger(LedgerWrite::SetStatus {
                        reference: withdrawal.ledger_reference.clone(),
                        status,
                    });
                }

                let event = LedgerEvent::new(
                    withdrawal.account_id,
                    event_kind,
                    json!({
                        "withdrawal_id": withdrawal.withdrawal_id,
                        "amount": withdrawal.amount.to_string(),
                        "from": from.as_str(),
                        "to": verdict.as_str(),
                    }),
                );

                let mut updated = withdrawal;
                updated.status = verdict;
                updated.reviewed_by = Some(actor.id);
                updated.notes = notes.clone();
                updated.updated_at = Utc::now();
                Ok(Staged::commit(unit, updated, vec![event]))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_id_roundtrip() {
        let statuses = [
            WithdrawalStatus::Pending,
            WithdrawalStatus::Processing,
            WithdrawalStatus::Completed,
            WithdrawalStatus::Rejected,
        ];
        for status in statuses {
            assert_eq!(WithdrawalStatus::from_id(status.id()), Some(status));
        }
        assert!(WithdrawalStatus::from_id(5).is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(WithdrawalStatus::Completed.is_terminal());
        assert!(WithdrawalStatus::Rejected.is_terminal());
        assert!(!WithdrawalStatus::Pending.is_terminal());
        assert!(!WithdrawalStatus::Processing.is_terminal());
    }
}

//! Admin balance adjustment
//!
//! Direct credit/debit outside the deposit and withdrawal flows. Immediate
//! and irreversible except by an opposite adjustment; every adjustment still
//! writes a completed ledger entry in the same atomic unit.

use crate::core_types::{AccountId, Actor};
use crate::entry::{EntryKind, EntryStatus, LedgerEntry};
use crate::error::LedgerError;
use crate::events::{EventKind, LedgerEvent};
use crate::executor::{MutationExecutor, Staged};
use crate::store::{BalanceChange, LedgerStore, LedgerWrite, MutationUnit};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Direction of an administrative adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustDirection {
    Credit,
    Debit,
}

impl AdjustDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustDirection::Credit => "credit",
            AdjustDirection::Debit => "debit",
        }
    }

    fn entry_kind(&self) -> EntryKind {
        match self {
            AdjustDirection::Credit => EntryKind::AdminCredit,
            AdjustDirection::Debit => EntryKind::AdminDebit,
        }
    }
}

impl fmt::Display for AdjustDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdjustDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" => Ok(AdjustDirection::Credit),
            "debit" => Ok(AdjustDirection::Debit),
            _ => Err(format!("Invalid adjustment direction: {}", s)),
        }
    }
}

/// Outcome of one adjustment.
#[derive(Debug, Clone, Serialize)]
pub struct Adjustment {
    pub account_id: AccountId,
    pub direction: AdjustDirection,
    pub amount: Decimal,
    pub ledger_reference: String,
    pub balance_after: Decimal,
}

/// Direct admin credit/debit.
#[derive(Clone)]
pub struct AdjustmentService {
    store: Arc<dyn LedgerStore>,
    executor: Arc<MutationExecutor>,
}

impl AdjustmentService {
    pub fn new(store: Arc<dyn LedgerStore>, executor: Arc<MutationExecutor>) -> Self {
        Self { store, executor }
    }

    /// Apply a signed delta to an account. Debits beyond the balance fail
    /// with `InsufficientFunds`; the guard runs inside the atomic unit.
    /// Admin only.
    pub async fn adjust(
        &self,
        account_id: AccountId,
        actor: Actor,
        amount: Decimal,
        direction: AdjustDirection,
        notes: Option<String>,
    ) -> Result<Adjustment, LedgerError> {
        if !actor.role.is_admin() {
            return Err(LedgerError::Forbidden);
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "adjustment amount must be positive".into(),
            ));
        }

        self.executor
            .run(async || {
                let account = self
                    .store
                    .account(account_id)
                    .await?
                    .ok_or(LedgerError::NotFound("account"))?;

                let change = match direction {
                    AdjustDirection::Credit => BalanceChange::credit(account_id, amount),
                    AdjustDirection::Debit => {
                        if account.balance < amount {
                            return Err(LedgerError::InsufficientFunds);
                        }
                        BalanceChange::debit(account_id, amount)
                    }
                };
                let balance_after = account.balance + change.delta;

                let entry = LedgerEntry::new(
                    account_id,
                    amount,
                    &account.currency,
                    direction.entry_kind(),
                    EntryStatus::Completed,
                )
                .with_notes(notes.clone());
                let outcome = Adjustment {
                    account_id,
                    direction,
                    amount,
                    ledger_reference: entry.reference.clone(),
                    balance_after,
                };

                let event = LedgerEvent::new(
                    account_id,
                    EventKind::BalanceAdjusted,
                    json!({
                        "direction": direction.as_str(),
                        "amount": amount.to_string(),
                        "actor_id": actor.id,
                    }),
                );
                let unit = MutationUnit::default()
                    .balance(change)
                    .ledger(LedgerWrite::Create(entry));
                Ok(Staged::commit(unit, outcome, vec![event]))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_str() {
        assert_eq!(
            "credit".parse::<AdjustDirection>().unwrap(),
            AdjustDirection::Credit
        );
        assert_eq!(
            "DEBIT".parse::<AdjustDirection>().unwrap(),
            AdjustDirection::Debit
        );
        assert!("transfer".parse::<AdjustDirection>().is_err());
    }

    #[test]
    fn test_entry_kind_mapping() {
        assert_eq!(AdjustDirection::Credit.entry_kind(), EntryKind::AdminCredit);
        assert_eq!(AdjustDirection::Debit.entry_kind(), EntryKind::AdminDebit);
    }
}

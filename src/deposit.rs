//! Deposit state machine
//!
//! A deposit is a user-submitted funding request that an admin reviews.
//! Lifecycle: created Pending; review moves it to Approved (credits the
//! account), Rejected (reverses a prior credit), or Processing (intermediate,
//! no balance effect); the owner may cancel while still Pending.
//!
//! The net balance effect of one deposit, integrated over its whole status
//! history, is `+amount` iff the current status is Approved, else zero. This
//! holds across arbitrary approve/reject toggles.

use crate::core_types::{AccountId, Actor};
use crate::entry::{EntryKind, EntryStatus, LedgerEntry};
use crate::error::LedgerError;
use crate::events::{EventKind, LedgerEvent};
use crate::executor::{MutationExecutor, Staged};
use crate::referral::ReferralService;
use crate::store::{BalanceChange, LedgerStore, LedgerWrite, MutationUnit, StateWrite};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Deposit statuses. IDs are stored as SMALLINT.
///
/// Terminal: Cancelled. Approved and Rejected may still toggle under admin
/// review; Cancelled never leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum DepositStatus {
    Pending = 0,
    Processing = 10,
    Approved = 20,
    Rejected = -10,
    Cancelled = -20,
}

impl DepositStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(DepositStatus::Pending),
            10 => Some(DepositStatus::Processing),
            20 => Some(DepositStatus::Approved),
            -10 => Some(DepositStatus::Rejected),
            -20 => Some(DepositStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::Pending => "pending",
            DepositStatus::Processing => "processing",
            DepositStatus::Approved => "approved",
            DepositStatus::Rejected => "rejected",
            DepositStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the deposit's amount is currently reflected in the balance.
    #[inline]
    pub fn is_credited(&self) -> bool {
        matches!(self, DepositStatus::Approved)
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admin review decision for a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositDecision {
    Approve,
    Reject,
    Processing,
}

impl FromStr for DepositDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(DepositDecision::Approve),
            "reject" => Ok(DepositDecision::Reject),
            "processing" => Ok(DepositDecision::Processing),
            _ => Err(format!("Invalid deposit decision: {}", s)),
        }
    }
}

/// A user-submitted funding request awaiting admin review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub deposit_id: Uuid,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub currency: String,
    pub status: DepositStatus,
    pub proof_ref: String,
    pub ledger_reference: String,
    pub reviewed_by: Option<AccountId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Deposit submission and review operations.
#[derive(Clone)]
pub struct DepositService {
    store: Arc<dyn LedgerStore>,
    executor: Arc<MutationExecutor>,
    referrals: ReferralService,
}

impl DepositService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        executor: Arc<MutationExecutor>,
        referrals: ReferralService,
    ) -> Self {
        Self {
            store,
            executor,
            referrals,
        }
    }

    /// Submit a new deposit. Creates the Deposit (Pending) and its matching
    /// ledger entry (Pending) in one atomic unit.
    pub async fn submit(
        &self,
        account_id: AccountId,
        amount: Decimal,
        currency: &str,
        proof_ref: &str,
    ) -> Result<Deposit, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "deposit amount must be positive".into(),
            ));
        }
        if proof_ref.trim().is_empty() {
            return Err(LedgerError::Validation("proof reference required".into()));
        }

        self.executor
            .run(async || {
                let account = self
                    .store
                    .account(account_id)
                    .await?
                    .ok_or(LedgerError::NotFound("account"))?;
                if account.currency != currency {
                    return Err(LedgerError::Validation(format!(
                        "currency mismatch: account is {}",
                        account.currency
                    )));
                }

                let entry = LedgerEntry::new(
                    account_id,
                    amount,
                    currency,
                    EntryKind::Deposit,
                    EntryStatus::Pending,
                );
                let now = Utc::now();
                let deposit = Deposit {
                    deposit_id: Uuid::new_v4(),
                    account_id,
                    amount,
                    currency: currency.to_string(),
                    status: DepositStatus::Pending,
                    proof_ref: proof_ref.to_string(),
                    ledger_reference: entry.reference.clone(),
                    reviewed_by: None,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                };

                let event = LedgerEvent::new(
                    account_id,
                    EventKind::DepositSubmitted,
                    json!({
                        "deposit_id": deposit.deposit_id,
                        "amount": amount.to_string(),
                        "currency": currency,
                    }),
                );
                let unit = MutationUnit::default()
                    .ledger(LedgerWrite::Create(entry))
                    .state(StateWrite::CreateDeposit(deposit.clone()));
                Ok(Staged::commit(unit, deposit, vec![event]))
            })
            .await
    }

    /// Review a deposit: approve (credit), reject (reverse a prior credit),
    /// or park in Processing. Idempotent: re-issuing the current decision is
    /// a no-op. Admin only.
    pub async fn review(
        &self,
        deposit_id: Uuid,
        actor: Actor,
        decision: DepositDecision,
        notes: Option<String>,
    ) -> Result<Deposit, LedgerError> {
        if !actor.role.is_admin() {
            return Err(LedgerError::Forbidden);
        }

        let (deposit, applied) = self
            .executor
            .run(async || {
                let deposit = self
                    .store
                    .deposit(deposit_id)
                    .await?
                    .ok_or(LedgerError::NotFound("deposit"))?;
                self.stage_review(deposit, actor, decision, notes.clone())
            })
            .await?;

        // Referral accrual rides on a *successful* approval, as its own unit
        // on the referrer's account. Failure here never unwinds the credit.
        if applied && decision == DepositDecision::Approve {
            if let Err(e) = self
                .referrals
                .award_bonus(deposit.account_id, deposit.amount)
                .await
            {
                tracing::warn!(
                    deposit_id = %deposit.deposit_id,
                    error = %e,
                    "referral bonus accrual failed after deposit approval"
                );
            }
        }

        Ok(deposit)
    }

    fn stage_review(
        &self,
        deposit: Deposit,
        actor: Actor,
        decision: DepositDecision,
        notes: Option<String>,
    ) -> Result<Staged<(Deposit, bool)>, LedgerError> {
        let from = deposit.status;
        if from == DepositStatus::Cancelled {
            return Err(LedgerError::InvalidTransition(format!(
                "deposit is cancelled, cannot {}",
                decision_name(decision)
            )));
        }

        let (target, balance, entry_status) = match decision {
            DepositDecision::Approve => {
                if from == DepositStatus::Approved {
                    return Ok(Staged::done((deposit, false)));
                }
                (
                    DepositStatus::Approved,
                    Some(BalanceChange::credit(deposit.account_id, deposit.amount)),
                    Some(EntryStatus::Completed),
                )
            }
            DepositDecision::Reject => {
                if from == DepositStatus::Rejected {
                    return Ok(Staged::done((deposit, false)));
                }
                // Reverse the credit only if one was applied.
                let reversal = if from.is_credited() {
                    Some(BalanceChange::debit(deposit.account_id, deposit.amount))
                } else {
                    None
                };
                (DepositStatus::Rejected, reversal, Some(EntryStatus::Failed))
            }
            DepositDecision::Processing => {
                if from == DepositStatus::Processing {
                    return Ok(Staged::done((deposit, false)));
                }
                if from != DepositStatus::Pending {
                    return Err(LedgerError::InvalidTransition(format!(
                        "cannot move {} deposit to processing",
                        from
                    )));
                }
                (DepositStatus::Processing, None, None)
            }
        };

        let mut unit = MutationUnit::default().state(StateWrite::DepositStatus {
            deposit_id: deposit.deposit_id,
            expect: from,
            set: target,
            reviewed_by: Some(actor.id),
            notes: notes.clone(),
        });
        if let Some(change) = balance {
            unit = unit.balance(change);
        }
        if let Some(status) = entry_status {
            unit = unit.ledger(LedgerWrite::SetStatus {
                reference: deposit.ledger_reference.clone(),
                status,
            });
        }

        let event = LedgerEvent::new(
            deposit.account_id,
            match target {
                DepositStatus::Approved => EventKind::DepositApproved,
                DepositStatus::Rejected => EventKind::DepositRejected,
                _ => EventKind::DepositProcessing,
            },
            json!({
                "deposit_id": deposit.deposit_id,
                "amount": deposit.amount.to_string(),
                "from": from.as_str(),
                "to": target.as_str(),
            }),
        );

        let mut updated = deposit;
        updated.status = target;
        updated.reviewed_by = Some(actor.id);
        updated.notes = notes;
        updated.updated_at = Utc::now();
        Ok(Staged::commit(unit, (updated, true), vec![event]))
    }

    /// Cancel a Pending deposit. Owner only; no balance effect.
    pub async fn cancel(&self, deposit_id: Uuid, actor: Actor) -> Result<Deposit, LedgerError> {
        self.executor
            .run(async || {
                let deposit = self
                    .store
                    .deposit(deposit_id)
                    .await?
                    .ok_or(LedgerError::NotFound("deposit"))?;
                if deposit.account_id != actor.id {
                    return Err(LedgerError::Forbidden);
                }
                match deposit.status {
                    DepositStatus::Cancelled => return Ok(Staged::done(deposit)),
                    DepositStatus::Pending => {}
                    other => {
                        return Err(LedgerError::InvalidTransition(format!(
                            "only pending deposits can be cancelled (status: {})",
                            other
                        )));
                    }
                }

                let unit = MutationUnit::default()
                    .ledger(LedgerWrite::SetStatus {
                        reference: deposit.ledger_reference.clone(),
                        status: EntryStatus::Cancelled,
                    })
                    .state(StateWrite::DepositStatus {
                        deposit_id: deposit.deposit_id,
                        expect: DepositStatus::Pending,
                        set: DepositStatus::Cancelled,
                        reviewed_by: None,
                        notes: None,
                    });
                let event = LedgerEvent::new(
                    deposit.account_id,
                    EventKind::DepositCancelled,
                    json!({ "deposit_id": deposit.deposit_id }),
                );

                let mut updated = deposit;
                updated.status = DepositStatus::Cancelled;
                updated.updated_at = Utc::now();
                Ok(Staged::commit(unit, updated, vec![event]))
            })
            .await
    }
}

fn decision_name(decision: DepositDecision) -> &'static str {
    match decision {
        DepositDecision::Approve => "approve",
        DepositDecision::Reject => "reject",
        DepositDecision::Processing => "process",
    }
}

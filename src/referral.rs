//! Referral bonus engine
//!
//! Accrual and realization are separate: approving a referee's deposit grows
//! the referrer's pending_bonus/total_earned counters (no balance change, no
//! ledger entry), and the referrer later moves the whole pending bonus into
//! the spendable balance, which does write a completed ledger entry.

use crate::core_types::AccountId;
use crate::entry::{EntryKind, EntryStatus, LedgerEntry};
use crate::error::LedgerError;
use crate::events::{EventKind, LedgerEvent};
use crate::executor::{MutationExecutor, Staged};
use crate::store::{AccountPatch, BalanceChange, LedgerStore, LedgerWrite, MutationUnit};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Result of a bonus accrual.
#[derive(Debug, Clone, Serialize)]
pub struct BonusAward {
    pub referrer_id: AccountId,
    pub referee_id: AccountId,
    pub bonus: Decimal,
}

/// Result of realizing the pending bonus into the balance.
#[derive(Debug, Clone, Serialize)]
pub struct BonusWithdrawal {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub ledger_reference: String,
}

/// Referral bonus accrual and realization.
#[derive(Clone)]
pub struct ReferralService {
    store: Arc<dyn LedgerStore>,
    executor: Arc<MutationExecutor>,
}

impl ReferralService {
    pub fn new(store: Arc<dyn LedgerStore>, executor: Arc<MutationExecutor>) -> Self {
        Self { store, executor }
    }

    /// Accrue a referral bonus on the referee's referrer. No-op (Ok(None))
    /// when the referee has no referrer or the bonus computes to zero.
    pub async fn award_bonus(
        &self,
        referee_id: AccountId,
        base_amount: Decimal,
    ) -> Result<Option<BonusAward>, LedgerError> {
        self.executor
            .run(async || {
                let referee = self
                    .store
                    .account(referee_id)
                    .await?
                    .ok_or(LedgerError::NotFound("account"))?;
                let Some(referrer_id) = referee.referral.referred_by else {
                    return Ok(Staged::done(None));
                };
                let Some(referrer) = self.store.account(referrer_id).await? else {
                    // Dangling referral link; skip rather than fail the caller.
                    tracing::warn!(referee_id, referrer_id, "referrer account missing");
                    return Ok(Staged::done(None));
                };

                let bonus = base_amount * referrer.referral_bonus_rate;
                if bonus <= Decimal::ZERO {
                    return Ok(Staged::done(None));
                }

                let award = BonusAward {
                    referrer_id,
                    referee_id,
                    bonus,
                };
                let event = LedgerEvent::new(
                    referrer_id,
                    EventKind::ReferralBonusAwarded,
                    json!({
                        "referee_id": referee_id,
                        "bonus": bonus.to_string(),
                    }),
                );
                let unit = MutationUnit::default().account(AccountPatch::AccrueBonus {
                    referrer_id,
                    referee_id,
                    bonus,
                });
                Ok(Staged::commit(unit, Some(award), vec![event]))
            })
            .await
    }

    /// Move the entire pending bonus into the spendable balance, atomically
    /// with a completed ledger entry. The drain guard closes the race
    /// between concurrent realizations.
    pub async fn withdraw_bonus(
        &self,
        account_id: AccountId,
    ) -> Result<BonusWithdrawal, LedgerError> {
        self.executor
            .run(async || {
                let account = self
                    .store
                    .account(account_id)
                    .await?
                    .ok_or(LedgerError::NotFound("account"))?;
                let pending = account.referral.pending_bonus;
                if pending <= Decimal::ZERO {
                    return Err(LedgerError::NothingToWithdraw);
                }

                let entry = LedgerEntry::new(
                    account_id,
                    pending,
                    &account.currency,
                    EntryKind::ReferralBonus,
                    EntryStatus::Completed,
                );
                let outcome = BonusWithdrawal {
                    account_id,
                    amount: pending,
                    ledger_reference: entry.reference.clone(),
                };

                let event = LedgerEvent::new(
                    account_id,
                    EventKind::ReferralBonusWithdrawn,
                    json!({ "amount": pending.to_string() }),
                );
                let unit = MutationUnit::default()
                    .balance(BalanceChange::credit(account_id, pending))
                    .ledger(LedgerWrite::Create(entry))
                    .account(AccountPatch::DrainPendingBonus {
                        account_id,
                        amount: pending,
                    });
                Ok(Staged::commit(unit, outcome, vec![event]))
            })
            .await
    }
}

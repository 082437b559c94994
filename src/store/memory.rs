//! In-memory ledger store
//!
//! Backs tests and storeless deployments. One mutex guards the whole map
//! set, so `apply` is naturally a single atomic scope: every guard is
//! checked before any write, and a guard failure leaves nothing mutated.

use super::{
    AccountPatch, BalanceChange, LedgerStore, LedgerWrite, MutationUnit, StateWrite, StoreError,
};
use crate::account::{Account, NewAccount, ReferralRecord, ReferralShare};
use crate::core_types::AccountId;
use crate::deposit::Deposit;
use crate::entry::LedgerEntry;
use crate::upgrade::UpgradeInvoice;
use crate::withdrawal::{Withdrawal, WithdrawalMethod};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    next_account_id: AccountId,
    accounts: HashMap<AccountId, Account>,
    entries: HashMap<String, LedgerEntry>,
    entry_order: Vec<String>,
    deposits: HashMap<Uuid, Deposit>,
    withdrawals: HashMap<Uuid, Withdrawal>,
    invoices: HashMap<Uuid, UpgradeInvoice>,
    methods: HashMap<String, WithdrawalMethod>,
}

/// HashMap-backed store with the same apply-time guards as PostgreSQL.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_account_id: 1000,
                ..Default::default()
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn create_account(&self, params: NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let account_id = inner.next_account_id;
        inner.next_account_id += 1;
        let account = Account {
            account_id,
            balance: Decimal::ZERO,
            currency: params.currency,
            package_tier: None,
            pending_package: None,
            referral_bonus_rate: params.referral_bonus_rate,
            referral: ReferralRecord {
                referred_by: params.referred_by,
                ..Default::default()
            },
            created_at: Utc::now(),
        };
        inner.accounts.insert(account_id, account.clone());
        Ok(account)
    }

    async fn select_package(
        &self,
        account_id: AccountId,
        package_id: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .get_mut(&account_id)
            .ok_or(StoreError::NotFound("account"))?;
        account.pending_package = Some(package_id.to_string());
        Ok(())
    }

    async fn upsert_method(&self, method: WithdrawalMethod) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.methods.insert(method.method_id.clone(), method);
        Ok(())
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.lock().unwrap().accounts.get(&id).cloned())
    }

    async fn deposit(&self, id: Uuid) -> Result<Option<Deposit>, StoreError> {
        Ok(self.inner.lock().unwrap().deposits.get(&id).cloned())
    }

    async fn withdrawal(&self, id: Uuid) -> Result<Option<Withdrawal>, StoreError> {
        Ok(self.inner.lock().unwrap().withdrawals.get(&id).cloned())
    }

    async fn invoice(&self, id: Uuid) -> Result<Option<UpgradeInvoice>, StoreError> {
        Ok(self.inner.lock().unwrap().invoices.get(&id).cloned())
    }

    async fn entry(&self, reference: &str) -> Result<Option<LedgerEntry>, StoreError> {
        Ok(self.inner.lock().unwrap().entries.get(reference).cloned())
    }

    async fn entries(
        &self,
        account_id: AccountId,
        limit: u32,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entry_order
            .iter()
            .rev()
            .filter_map(|r| inner.entries.get(r))
            .filter(|e| e.account_id == account_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn method(&self, method_id: &str) -> Result<Option<WithdrawalMethod>, StoreError> {
        Ok(self.inner.lock().unwrap().methods.get(method_id).cloned())
    }

    async fn methods(&self) -> Result<Vec<WithdrawalMethod>, StoreError> {
        Ok(self.inner.lock().unwrap().methods.values().cloned().collect())
    }

    async fn apply(&self, unit: &MutationUnit) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Validate every guard before mutating anything, so a failure leaves
        // no partial effect.
        if let Some(BalanceChange { account_id, delta }) = &unit.balance {
            let account = inner
                .accounts
                .get(account_id)
                .ok_or(StoreError::NotFound("account"))?;
            if account.balance + *delta < Decimal::ZERO {
                return Err(StoreError::InsufficientFunds);
            }
        }

        match &unit.ledger {
            Some(LedgerWrite::Create(entry)) => {
                if inner.entries.contains_key(&entry.reference) {
                    return Err(StoreError::DuplicateReference(entry.reference.clone()));
                }
            }
            Some(LedgerWrite::SetStatus { reference, .. }) => {
                if !inner.entries.contains_key(reference) {
                    return Err(StoreError::NotFound("ledger entry"));
                }
            }
            None => {}
        }

        match &unit.state {
            Some(StateWrite::CreateDeposit(d)) => {
                if inner.deposits.contains_key(&d.deposit_id) {
                    return Err(StoreError::Conflict);
                }
            }
            Some(StateWrite::DepositStatus {
                deposit_id, expect, ..
            }) => {
                let deposit = inner
                    .deposits
                    .get(deposit_id)
                    .ok_or(StoreError::NotFound("deposit"))?;
                if deposit.status != *expect {
                    return Err(StoreError::Conflict);
                }
            }
            Some(StateWrite::CreateWithdrawal(w)) => {
                if inner.withdrawals.contains_key(&w.withdrawal_id) {
                    return Err(StoreError::Conflict);
                }
            }
            Some(StateWrite::WithdrawalStatus {
                withdrawal_id,
                expect,
                ..
            }) => {
                let withdrawal = inner
                    .withdrawals
                    .get(withdrawal_id)
                    .ok_or(StoreError::NotFound("withdrawal"))?;
                if withdrawal.status != *expect {
                    return Err(StoreError::Conflict);
                }
            }
            Some(StateWrite::CreateInvoice(i)) => {
                if inner.invoices.contains_key(&i.invoice_id) {
                    return Err(StoreError::Conflict);
                }
            }
            Some(StateWrite::InvoiceStatus {
                invoice_id, expect, ..
            }) => {
                let invoice = inner
                    .invoices
                    .get(invoice_id)
                    .ok_or(StoreError::NotFound("upgrade invoice"))?;
                if invoice.status != *expect {
                    return Err(StoreError::Conflict);
                }
            }
            None => {}
        }

        match &unit.account {
            Some(AccountPatch::AccrueBonus { referrer_id, .. }) => {
                if !inner.accounts.contains_key(referrer_id) {
                    return Err(StoreError::NotFound("account"));
                }
            }
            Some(AccountPatch::DrainPendingBonus { account_id, amount }) => {
                let account = inner
                    .accounts
                    .get(account_id)
                    .ok_or(StoreError::NotFound("account"))?;
                if account.referral.pending_bonus < *amount {
                    return Err(StoreError::Conflict);
                }
            }
            Some(AccountPatch::CommitPackage { account_id, .. }) => {
                if !inner.accounts.contains_key(account_id) {
                    return Err(StoreError::NotFound("account"));
                }
            }
            None => {}
        }

        // All guards hold; commit.
        if let Some(BalanceChange { account_id, delta }) = &unit.balance {
            let account = inner.accounts.get_mut(account_id).expect("validated above");
            account.balance += *delta;
        }

        match &unit.ledger {
            Some(LedgerWrite::Create(entry)) => {
                inner.entry_order.push(entry.reference.clone());
                inner.entries.insert(entry.reference.clone(), entry.clone());
            }
            Some(LedgerWrite::SetStatus { reference, status }) => {
                let entry = inner.entries.get_mut(reference).expect("validated above");
                entry.status = *status;
            }
            None => {}
        }

        match &unit.state {
            Some(StateWrite::CreateDeposit(d)) => {
                inner.deposits.insert(d.deposit_id, d.clone());
            }
            Some(StateWrite::DepositStatus {
                deposit_id,
                set,
                reviewed_by,
                notes,
                ..
            }) => {
                let deposit = inner.deposits.get_mut(deposit_id).expect("validated above");
                deposit.status = *set;
                if reviewed_by.is_some() {
                    deposit.reviewed_by = *reviewed_by;
                }
                if notes.is_some() {
                    deposit.notes = notes.clone();
                }
                deposit.updated_at = Utc::now();
            }
            Some(StateWrite::CreateWithdrawal(w)) => {
                inner.withdrawals.insert(w.withdrawal_id, w.clone());
            }
            Some(StateWrite::WithdrawalStatus {
                withdrawal_id,
                set,
                reviewed_by,
                notes,
                ..
            }) => {
                let withdrawal = inner
                    .withdrawals
                    .get_mut(withdrawal_id)
                    .expect("validated above");
                withdrawal.status = *set;
                if reviewed_by.is_some() {
                    withdrawal.reviewed_by = *reviewed_by;
                }
                if notes.is_some() {
                    withdrawal.notes = notes.clone();
                }
                withdrawal.updated_at = Utc::now();
            }
            Some(StateWrite::CreateInvoice(i)) => {
                inner.invoices.insert(i.invoice_id, i.clone());
            }
            Some(StateWrite::InvoiceStatus {
                invoice_id,
                set,
                reviewed_by,
                reason,
                ..
            }) => {
                let invoice = inner.invoices.get_mut(invoice_id).expect("validated above");
                invoice.status = *set;
                if reviewed_by.is_some() {
                    invoice.reviewed_by = *reviewed_by;
                }
                if reason.is_some() {
                    invoice.dispute_reason = reason.clone();
                }
                invoice.updated_at = Utc::now();
            }
            None => {}
        }

        match &unit.account {
            Some(AccountPatch::AccrueBonus {
                referrer_id,
                referee_id,
                bonus,
            }) => {
                let account = inner.accounts.get_mut(referrer_id).expect("validated above");
                account.referral.pending_bonus += *bonus;
                account.referral.total_earned += *bonus;
                match account
                    .referral
                    .referrals
                    .iter_mut()
                    .find(|s| s.referee_id == *referee_id)
                {
                    Some(share) => share.bonus_earned += *bonus,
                    None => account.referral.referrals.push(ReferralShare {
                        referee_id: *referee_id,
                        bonus_earned: *bonus,
                    }),
                }
            }
            Some(AccountPatch::DrainPendingBonus { account_id, amount }) => {
                let account = inner.accounts.get_mut(account_id).expect("validated above");
                account.referral.pending_bonus -= *amount;
            }
            Some(AccountPatch::CommitPackage {
                account_id,
                package_id,
            }) => {
                let account = inner.accounts.get_mut(account_id).expect("validated above");
                account.package_tier = Some(package_id.clone());
                account.pending_package = None;
            }
            None => {}
        }

        Ok(())
    }
}

//! Ledger core facade
//!
//! Owns the shared executor and event bus and hands out the flow services.
//! The store handle is injected at construction time; connection lifecycle
//! belongs to the process entry point.

use crate::account::Account;
use crate::adjustment::AdjustmentService;
use crate::core_types::AccountId;
use crate::deposit::DepositService;
use crate::entry::LedgerEntry;
use crate::error::LedgerError;
use crate::events::{EventBus, LedgerEvent};
use crate::executor::MutationExecutor;
use crate::referral::ReferralService;
use crate::store::LedgerStore;
use crate::upgrade::UpgradeService;
use crate::withdrawal::WithdrawalService;
use std::sync::Arc;
use tokio::sync::broadcast;

/// The assembled ledger core.
#[derive(Clone)]
pub struct LedgerCore {
    store: Arc<dyn LedgerStore>,
    bus: EventBus,
    pub deposits: DepositService,
    pub withdrawals: WithdrawalService,
    pub adjustments: AdjustmentService,
    pub referrals: ReferralService,
    pub upgrades: UpgradeService,
}

impl LedgerCore {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_max_retries(store, crate::executor::DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(store: Arc<dyn LedgerStore>, max_retries: u32) -> Self {
        let bus = EventBus::new();
        let executor = Arc::new(
            MutationExecutor::new(store.clone(), bus.clone()).with_max_retries(max_retries),
        );
        let referrals = ReferralService::new(store.clone(), executor.clone());
        Self {
            deposits: DepositService::new(store.clone(), executor.clone(), referrals.clone()),
            withdrawals: WithdrawalService::new(store.clone(), executor.clone()),
            adjustments: AdjustmentService::new(store.clone(), executor.clone()),
            referrals,
            upgrades: UpgradeService::new(store.clone(), executor),
            store,
            bus,
        }
    }

    /// The injected store handle (reads, provisioning).
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Subscribe to ledger events (notification dispatch).
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.bus.subscribe()
    }

    pub async fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .account(id)
            .await?
            .ok_or(LedgerError::NotFound("account"))
    }

    pub async fn entries(
        &self,
        account_id: AccountId,
        limit: u32,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self.store.entries(account_id, limit).await?)
    }
}

//! Ledger store seam
//!
//! The ledger core receives a store handle at construction time and routes
//! every write through [`LedgerStore::apply`], which commits one
//! [`MutationUnit`] all-or-nothing. Reads are plain accessors; writes are
//! described as data so both backends (PostgreSQL, in-memory) enforce the
//! same guards inside their own atomic scope.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::account::{Account, NewAccount};
use crate::core_types::AccountId;
use crate::deposit::{Deposit, DepositStatus};
use crate::entry::{EntryStatus, LedgerEntry};
use crate::upgrade::{InvoiceStatus, UpgradeInvoice};
use crate::withdrawal::{Withdrawal, WithdrawalMethod, WithdrawalStatus};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Storage-level failures.
///
/// `Conflict` is the only retryable variant: it means a guard that was
/// satisfied at staging time no longer holds (CAS mismatch, concurrent
/// drain, write-write collision). Everything else surfaces unchanged.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("concurrent mutation conflict")]
    Conflict,

    #[error("duplicate ledger reference: {0}")]
    DuplicateReference(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("balance guard violated")]
    InsufficientFunds,

    #[error("backend error: {0}")]
    Backend(String),
}

/// Signed balance delta for one account.
///
/// Non-negativity of the resulting balance is enforced at apply time, inside
/// the same atomic scope as the rest of the unit. This closes the race
/// between concurrent debits on one account.
#[derive(Debug, Clone)]
pub struct BalanceChange {
    pub account_id: AccountId,
    pub delta: Decimal,
}

impl BalanceChange {
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            delta: amount,
        }
    }

    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            delta: -amount,
        }
    }
}

/// Ledger-entry write: create a fresh row, or move an existing row's status.
///
/// Rows are immutable after creation except for `status`.
#[derive(Debug, Clone)]
pub enum LedgerWrite {
    Create(LedgerEntry),
    SetStatus {
        reference: String,
        status: EntryStatus,
    },
}

/// State-entity write: create one flow entity, or CAS its status.
///
/// Status transitions carry the expected prior status; a mismatch at apply
/// time aborts the unit with `Conflict` so the executor re-reads and
/// re-validates.
#[derive(Debug, Clone)]
pub enum StateWrite {
    CreateDeposit(Deposit),
    DepositStatus {
        deposit_id: Uuid,
        expect: DepositStatus,
        set: DepositStatus,
        reviewed_by: Option<AccountId>,
        notes: Option<String>,
    },
    CreateWithdrawal(Withdrawal),
    WithdrawalStatus {
        withdrawal_id: Uuid,
        expect: WithdrawalStatus,
        set: WithdrawalStatus,
        reviewed_by: Option<AccountId>,
        notes: Option<String>,
    },
    CreateInvoice(UpgradeInvoice),
    InvoiceStatus {
        invoice_id: Uuid,
        expect: InvoiceStatus,
        set: InvoiceStatus,
        reviewed_by: Option<AccountId>,
        reason: Option<String>,
    },
}

/// Non-balance account patch applied in the same unit.
#[derive(Debug, Clone)]
pub enum AccountPatch {
    /// Accrue referral bonus on the referrer: pending_bonus and total_earned
    /// both grow by `bonus`, as does the per-referee share row.
    AccrueBonus {
        referrer_id: AccountId,
        referee_id: AccountId,
        bonus: Decimal,
    },
    /// Move accrued bonus out of pending_bonus. Guarded by
    /// `pending_bonus >= amount`; a shortfall means a concurrent drain won.
    DrainPendingBonus {
        account_id: AccountId,
        amount: Decimal,
    },
    /// Commit a package-tier change and clear the pending-package marker.
    CommitPackage {
        account_id: AccountId,
        package_id: String,
    },
}

/// One unit of work for the atomic mutation executor.
///
/// At most one balance delta, one ledger write, one state-entity write and
/// one account patch. Callers never bundle unrelated account mutations into
/// a single unit.
#[derive(Debug, Clone, Default)]
pub struct MutationUnit {
    pub balance: Option<BalanceChange>,
    pub ledger: Option<LedgerWrite>,
    pub state: Option<StateWrite>,
    pub account: Option<AccountPatch>,
}

impl MutationUnit {
    pub fn balance(mut self, change: BalanceChange) -> Self {
        self.balance = Some(change);
        self
    }

    pub fn ledger(mut self, write: LedgerWrite) -> Self {
        self.ledger = Some(write);
        self
    }

    pub fn state(mut self, write: StateWrite) -> Self {
        self.state = Some(write);
        self
    }

    pub fn account(mut self, patch: AccountPatch) -> Self {
        self.account = Some(patch);
        self
    }
}

/// Persistent store behind the ledger core.
///
/// `apply` is the only write path for balances, ledger entries and flow
/// entities. Account provisioning and payout-method administration are
/// store-level operations outside the audited mutation path.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // === Provisioning (outside the audited mutation path) ===

    async fn create_account(&self, params: NewAccount) -> Result<Account, StoreError>;

    /// Record a pending package selection (tier-change intent). The tier
    /// itself only changes through an approved upgrade invoice.
    async fn select_package(
        &self,
        account_id: AccountId,
        package_id: &str,
    ) -> Result<(), StoreError>;

    async fn upsert_method(&self, method: WithdrawalMethod) -> Result<(), StoreError>;

    // === Reads ===

    async fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;
    async fn deposit(&self, id: Uuid) -> Result<Option<Deposit>, StoreError>;
    async fn withdrawal(&self, id: Uuid) -> Result<Option<Withdrawal>, StoreError>;
    async fn invoice(&self, id: Uuid) -> Result<Option<UpgradeInvoice>, StoreError>;
    async fn entry(&self, reference: &str) -> Result<Option<LedgerEntry>, StoreError>;

    /// Ledger history for one account, newest first.
    async fn entries(
        &self,
        account_id: AccountId,
        limit: u32,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    async fn method(&self, method_id: &str) -> Result<Option<WithdrawalMethod>, StoreError>;
    async fn methods(&self) -> Result<Vec<WithdrawalMethod>, StoreError>;

    // === The atomic write path ===

    /// Apply one unit of work all-or-nothing. On any guard failure no
    /// partial effect is visible to any reader.
    async fn apply(&self, unit: &MutationUnit) -> Result<(), StoreError>;
}

//! ledgerd - Financial Ledger Core
//!
//! The invariants and state machines that govern how an account balance is
//! mutated by deposits, withdrawals, admin adjustments, referral bonuses and
//! package-upgrade payments, with every mutation coupled atomically to an
//! auditable ledger entry.
//!
//! # Modules
//!
//! - [`core_types`] - Shared identifiers and the authenticated actor
//! - [`account`] - The account entity (balance, currency, referral state)
//! - [`entry`] - Ledger entries, the audit trail
//! - [`store`] - The injected store seam (PostgreSQL and in-memory)
//! - [`executor`] - Atomic mutation executor (all-or-nothing + retry)
//! - [`deposit`] - Deposit state machine
//! - [`withdrawal`] - Withdrawal state machine (hold on create, refund on reject)
//! - [`adjustment`] - Direct admin credit/debit
//! - [`referral`] - Referral bonus accrual and realization
//! - [`upgrade`] - Package-upgrade invoice flow
//! - [`events`] - Fire-and-forget notification bus
//! - [`gateway`] - Thin HTTP surface

pub mod account;
pub mod adjustment;
pub mod config;
pub mod core;
pub mod core_types;
pub mod deposit;
pub mod entry;
pub mod error;
pub mod events;
pub mod executor;
pub mod gateway;
pub mod logging;
pub mod referral;
pub mod store;
pub mod upgrade;
pub mod withdrawal;

// Convenient re-exports at crate root
pub use account::{Account, NewAccount, ReferralRecord, ReferralShare};
pub use adjustment::{AdjustDirection, Adjustment, AdjustmentService};
pub use crate::core::LedgerCore;
pub use core_types::{AccountId, Actor, Role};
pub use deposit::{Deposit, DepositDecision, DepositService, DepositStatus};
pub use entry::{EntryKind, EntryStatus, LedgerEntry};
pub use error::LedgerError;
pub use events::{EventBus, EventKind, LedgerEvent};
pub use executor::{MutationExecutor, Staged};
pub use referral::{BonusAward, BonusWithdrawal, ReferralService};
pub use store::{LedgerStore, MemoryStore, MutationUnit, PgStore, StoreError};
pub use upgrade::{InvoiceAction, InvoiceStatus, UpgradeInvoice, UpgradeService};
pub use withdrawal::{Withdrawal, WithdrawalMethod, WithdrawalService, WithdrawalStatus};

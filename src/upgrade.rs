//! Upgrade invoice flow
//!
//! A payment-gated package-tier change. Payment proof lives outside the
//! ledger balance, so no balance mutation happens anywhere in this flow, but
//! every invoice still carries an `upgrade` ledger entry for audit and the
//! tier commit rides the same atomic path as everything else.

use crate::core_types::{AccountId, Actor};
use crate::entry::{EntryKind, EntryStatus, LedgerEntry};
use crate::error::LedgerError;
use crate::events::{EventKind, LedgerEvent};
use crate::executor::{MutationExecutor, Staged};
use crate::store::{AccountPatch, LedgerStore, LedgerWrite, MutationUnit, StateWrite};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Upgrade invoice statuses. IDs are stored as SMALLINT.
///
/// Terminal: Approved, Rejected. Disputed resolves through the resolve-*
/// review actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum InvoiceStatus {
    Pending = 0,
    Disputed = 10,
    Approved = 20,
    Rejected = -10,
}

impl InvoiceStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(InvoiceStatus::Pending),
            10 => Some(InvoiceStatus::Disputed),
            20 => Some(InvoiceStatus::Approved),
            -10 => Some(InvoiceStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Disputed => "disputed",
            InvoiceStatus::Approved => "approved",
            InvoiceStatus::Rejected => "rejected",
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Approved | InvoiceStatus::Rejected)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admin review action on an upgrade invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "reason")]
pub enum InvoiceAction {
    Approve,
    Reject,
    Dispute(String),
    ResolveApprove,
    ResolveReject,
}

/// A payment proof for a package-tier change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeInvoice {
    pub invoice_id: Uuid,
    pub account_id: AccountId,
    pub package_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: InvoiceStatus,
    pub proof_ref: String,
    pub ledger_reference: String,
    pub dispute_reason: Option<String>,
    pub reviewed_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upgrade invoice submission and review.
#[derive(Clone)]
pub struct UpgradeService {
    store: Arc<dyn LedgerStore>,
    executor: Arc<MutationExecutor>,
}

impl UpgradeService {
    pub fn new(store: Arc<dyn LedgerStore>, executor: Arc<MutationExecutor>) -> Self {
        Self { store, executor }
    }

    /// Submit an upgrade invoice against the account's pending package
    /// selection. Creates the invoice (Pending) and its audit entry.
    pub async fn submit(
        &self,
        account_id: AccountId,
        package_id: &str,
        amount: Decimal,
        currency: &str,
        proof_ref: &str,
    ) -> Result<UpgradeInvoice, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "invoice amount must be positive".into(),
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
                match account.pending_package.as_deref() {
                    Some(pending) if pending == package_id => {}
                    Some(pending) => {
                        return Err(LedgerError::Validation(format!(
                            "pending package selection is {}, not {}",
                            pending, package_id
                        )));
                    }
                    None => {
                        return Err(LedgerError::Validation(
                            "account has no pending package selection".into(),
                        ));
                    }
                }

                let entry = LedgerEntry::new(
                    account_id,
                    amount,
                    currency,
                    EntryKind::Upgrade,
                    EntryStatus::Pending,
                );
                let now = Utc::now();
                let invoice = UpgradeInvoice {
                    invoice_id: Uuid::new_v4(),
                    account_id,
                    package_id: package_id.to_string(),
                    amount,
                    currency: currency.to_string(),
                    status: InvoiceStatus::Pending,
                    proof_ref: proof_ref.to_string(),
                    ledger_reference: entry.reference.clone(),
                    dispute_reason: None,
                    reviewed_by: None,
                    created_at: now,
                    updated_at: now,
                };

                let event = LedgerEvent::new(
                    account_id,
                    EventKind::UpgradeSubmitted,
                    json!({
                        "invoice_id": invoice.invoice_id,
                        "package_id": package_id,
                        "amount": amount.to_string(),
                    }),
                );
                let unit = MutationUnit::default()
                    .ledger(LedgerWrite::Create(entry))
                    .state(StateWrite::CreateInvoice(invoice.clone()));
                Ok(Staged::commit(unit, invoice, vec![event]))
            })
            .await
    }

    /// Review an upgrade invoice. Approval commits the package tier and
    /// clears the pending-package marker atomically with the status change.
    /// Repeating the current terminal outcome is a no-op. Admin only.
    pub async fn review(
        &self,
        invoice_id: Uuid,
        actor: Actor,
        action: InvoiceAction,
    ) -> Result<UpgradeInvoice, LedgerError> {
        if !actor.role.is_admin() {
            return Err(LedgerError::Forbidden);
        }
        if let InvoiceAction::Dispute(reason) = &action {
            if reason.trim().is_empty() {
                return Err(LedgerError::Validation("dispute reason required".into()));
            }
        }

        self.executor
            .run(async || {
                let invoice = self
                    .store
                    .invoice(invoice_id)
                    .await?
                    .ok_or(LedgerError::NotFound("upgrade invoice"))?;
                self.stage_review(invoice, actor, action.clone())
            })
            .await
    }

    fn stage_review(
        &self,
        invoice: UpgradeInvoice,
        actor: Actor,
        action: InvoiceAction,
    ) -> Result<Staged<UpgradeInvoice>, LedgerError> {
        let from = invoice.status;

        enum Outcome {
            Approve,
            Reject,
            Dispute(String),
        }

        let outcome = match action {
            InvoiceAction::Approve => {
                if from == InvoiceStatus::Approved {
                    return Ok(Staged::done(invoice));
                }
                if from != InvoiceStatus::Pending {
                    return Err(invalid_action(from, "approve"));
                }
                Outcome::Approve
            }
            InvoiceAction::Reject => {
                if from == InvoiceStatus::Rejected {
                    return Ok(Staged::done(invoice));
                }
                if from != InvoiceStatus::Pending {
                    return Err(invalid_action(from, "reject"));
                }
                Outcome::Reject
            }
            InvoiceAction::Dispute(reason) => {
                if from == InvoiceStatus::Disputed {
                    return Ok(Staged::done(invoice));
                }
                if from != InvoiceStatus::Pending {
                    return Err(invalid_action(from, "dispute"));
                }
                Outcome::Dispute(reason)
            }
            InvoiceAction::ResolveApprove => {
                if from == InvoiceStatus::Approved {
                    return Ok(Staged::done(invoice));
                }
                if from != InvoiceStatus::Disputed {
                    return Err(invalid_action(from, "resolve"));
                }
                Outcome::Approve
            }
            InvoiceAction::ResolveReject => {
                if from == InvoiceStatus::Rejected {
                    return Ok(Staged::done(invoice));
                }
                if from != InvoiceStatus::Disputed {
                    return Err(invalid_action(from, "resolve"));
                }
                Outcome::Reject
            }
        };

        let (target, reason) = match &outcome {
            Outcome::Approve => (InvoiceStatus::Approved, None),
            Outcome::Reject => (InvoiceStatus::Rejected, None),
            Outcome::Dispute(reason) => (InvoiceStatus::Disputed, Some(reason.clone())),
        };

        let mut unit = MutationUnit::default().state(StateWrite::InvoiceStatus {
            invoice_id: invoice.invoice_id,
            expect: from,
            set: target,
            reviewed_by: Some(actor.id),
            reason: reason.clone(),
        });
        let event_kind = match &outcome {
            Outcome::Approve => {
                unit = unit
                    .ledger(LedgerWrite::SetStatus {
                        reference: invoice.ledger_reference.clone(),
                        status: EntryStatus::Completed,
                    })
                    .account(AccountPatch::CommitPackage {
                        account_id: invoice.account_id,
                        package_id: invoice.package_id.clone(),
                    });
                EventKind::UpgradeApproved
            }
            Outcome::Reject => {
                unit = unit.ledger(LedgerWrite::SetStatus {
                    reference: invoice.ledger_reference.clone(),
                    status: EntryStatus::Failed,
                });
                EventKind::UpgradeRejected
            }
            Outcome::Dispute(_) => EventKind::UpgradeDisputed,
        };

        let event = LedgerEvent::new(
            invoice.account_id,
            event_kind,
            json!({
                "invoice_id": invoice.invoice_id,
                "package_id": invoice.package_id,
                "from": from.as_str(),
                "to": target.as_str(),
            }),
        );

        let mut updated = invoice;
        updated.status = target;
        updated.reviewed_by = Some(actor.id);
        updated.dispute_reason = reason.or(updated.dispute_reason);
        updated.updated_at = Utc::now();
        Ok(Staged::commit(unit, updated, vec![event]))
    }
}

fn invalid_action(from: InvoiceStatus, action: &str) -> LedgerError {
    LedgerError::InvalidTransition(format!("cannot {} a {} invoice", action, from))
}

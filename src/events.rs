//! Ledger event bus
//!
//! Fire-and-forget notifications emitted after each successful state
//! transition. Delivery is best-effort: a send with no subscribers is not an
//! error and never affects the financial mutation that produced the event.

use crate::core_types::AccountId;
use serde::Serialize;
use std::fmt;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// What happened, for downstream notification delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DepositSubmitted,
    DepositApproved,
    DepositRejected,
    DepositProcessing,
    DepositCancelled,
    WithdrawalRequested,
    WithdrawalProcessing,
    WithdrawalCompleted,
    WithdrawalRejected,
    BalanceAdjusted,
    ReferralBonusAwarded,
    ReferralBonusWithdrawn,
    UpgradeSubmitted,
    UpgradeApproved,
    UpgradeRejected,
    UpgradeDisputed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DepositSubmitted => "deposit_submitted",
            EventKind::DepositApproved => "deposit_approved",
            EventKind::DepositRejected => "deposit_rejected",
            EventKind::DepositProcessing => "deposit_processing",
            EventKind::DepositCancelled => "deposit_cancelled",
            EventKind::WithdrawalRequested => "withdrawal_requested",
            EventKind::WithdrawalProcessing => "withdrawal_processing",
            EventKind::WithdrawalCompleted => "withdrawal_completed",
            EventKind::WithdrawalRejected => "withdrawal_rejected",
            EventKind::BalanceAdjusted => "balance_adjusted",
            EventKind::ReferralBonusAwarded => "referral_bonus_awarded",
            EventKind::ReferralBonusWithdrawn => "referral_bonus_withdrawn",
            EventKind::UpgradeSubmitted => "upgrade_submitted",
            EventKind::UpgradeApproved => "upgrade_approved",
            EventKind::UpgradeRejected => "upgrade_rejected",
            EventKind::UpgradeDisputed => "upgrade_disputed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One notification event.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEvent {
    pub account_id: AccountId,
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

impl LedgerEvent {
    pub fn new(account_id: AccountId, kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            account_id,
            kind,
            payload,
        }
    }
}

/// Broadcast bus for ledger events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Best-effort: errors (no subscribers) are ignored.
    pub fn publish(&self, event: LedgerEvent) {
        tracing::debug!(
            account_id = event.account_id,
            kind = %event.kind,
            "ledger event"
        );
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::new();
        bus.publish(LedgerEvent::new(1, EventKind::DepositSubmitted, json!({})));
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(LedgerEvent::new(
            7,
            EventKind::BalanceAdjusted,
            json!({"amount": "5"}),
        ));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.account_id, 7);
        assert_eq!(event.kind, EventKind::BalanceAdjusted);
    }

    #[test]
    fn test_kind_as_str() {
        assert_eq!(EventKind::WithdrawalRejected.as_str(), "withdrawal_rejected");
        assert_eq!(EventKind::ReferralBonusAwarded.as_str(), "referral_bonus_awarded");
    }
}

//! Account entity
//!
//! `balance` is the single source of truth for spendable funds. Nothing
//! outside the store's atomic apply path assigns it; services only read
//! accounts and stage deltas through the mutation executor.

use crate::core_types::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default referral bonus rate (10% of the base amount).
pub fn default_bonus_rate() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

/// Per-referee accrued bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralShare {
    pub referee_id: AccountId,
    pub bonus_earned: Decimal,
}

/// Referral relationship and accrued-bonus counters, embedded in the account.
///
/// Invariants: `0 <= pending_bonus <= total_earned`. `pending_bonus` moves
/// into `balance` only through the referral engine's withdraw operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRecord {
    pub referred_by: Option<AccountId>,
    pub total_earned: Decimal,
    pub pending_bonus: Decimal,
    pub referrals: Vec<ReferralShare>,
}

impl ReferralRecord {
    pub fn bonus_for(&self, referee_id: AccountId) -> Decimal {
        self.referrals
            .iter()
            .find(|s| s.referee_id == referee_id)
            .map(|s| s.bonus_earned)
            .unwrap_or(Decimal::ZERO)
    }
}

/// One user's spendable funds plus package tier and referral state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub balance: Decimal,
    pub currency: String,
    pub package_tier: Option<String>,
    pub pending_package: Option<String>,
    pub referral_bonus_rate: Decimal,
    pub referral: ReferralRecord,
    pub created_at: DateTime<Utc>,
}

/// Parameters for provisioning a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub currency: String,
    pub referred_by: Option<AccountId>,
    pub referral_bonus_rate: Decimal,
}

impl Default for NewAccount {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            referred_by: None,
            referral_bonus_rate: default_bonus_rate(),
        }
    }
}

impl NewAccount {
    pub fn with_currency(currency: &str) -> Self {
        Self {
            currency: currency.to_string(),
            ..Default::default()
        }
    }

    pub fn referred_by(mut self, referrer: AccountId) -> Self {
        self.referred_by = Some(referrer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bonus_rate() {
        assert_eq!(default_bonus_rate(), "0.1".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_bonus_for_unknown_referee_is_zero() {
        let record = ReferralRecord::default();
        assert_eq!(record.bonus_for(42), Decimal::ZERO);
    }

    #[test]
    fn test_new_account_builder() {
        let params = NewAccount::with_currency("EUR").referred_by(7);
        assert_eq!(params.currency, "EUR");
        assert_eq!(params.referred_by, Some(7));
        assert_eq!(params.referral_bonus_rate, default_bonus_rate());
    }
}

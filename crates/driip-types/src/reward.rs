//! Reward outcomes granted to successful challengers and fraud reporters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, WalletId};

/// How a challenger was rewarded. Recorded so it can be reversed exactly
/// when a newer challenger supersedes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardOutcome {
    /// Part of the culpable wallet's own balance is locked in favour of the
    /// beneficiary. No bond funds are spent.
    BalanceLock {
        wallet: WalletId,
        beneficiary: WalletId,
        currency: Currency,
        amount: Decimal,
    },
    /// The beneficiary is paid from the shared security bond.
    BondPayout {
        beneficiary: WalletId,
        currency: Currency,
        flat: Decimal,
        fractional: Decimal,
    },
}

impl RewardOutcome {
    #[must_use]
    pub fn beneficiary(&self) -> WalletId {
        match self {
            Self::BalanceLock { beneficiary, .. } | Self::BondPayout { beneficiary, .. } => {
                *beneficiary
            }
        }
    }

    #[must_use]
    pub fn currency(&self) -> &Currency {
        match self {
            Self::BalanceLock { currency, .. } | Self::BondPayout { currency, .. } => currency,
        }
    }

    /// Total value granted.
    #[must_use]
    pub fn total(&self) -> Decimal {
        match self {
            Self::BalanceLock { amount, .. } => *amount,
            Self::BondPayout {
                flat, fractional, ..
            } => *flat + *fractional,
        }
    }

    /// Amount drawn from the security bond (zero for balance locks).
    #[must_use]
    pub fn bond_paid(&self) -> Decimal {
        match self {
            Self::BalanceLock { .. } => Decimal::ZERO,
            Self::BondPayout { .. } => self.total(),
        }
    }
}

impl std::fmt::Display for RewardOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BalanceLock {
                wallet,
                beneficiary,
                currency,
                amount,
            } => write!(f, "LOCK {amount} {currency} of {wallet} for {beneficiary}"),
            Self::BondPayout {
                beneficiary,
                currency,
                flat,
                fractional,
            } => write!(
                f,
                "BOND {flat}+{fractional} {currency} to {beneficiary}"
            ),
        }
    }
}

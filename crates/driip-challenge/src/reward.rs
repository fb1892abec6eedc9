//! The reward policy shared by disputes and fraud challenges.
//!
//! Priority order:
//! 1. If the culpable wallet's unlocked balance covers the attested amount,
//!    lock that much of it in favour of the beneficiary. No bond is spent.
//! 2. Otherwise pay the flat reward (capped by the bond) plus a fraction of
//!    what remains in the bond.
//!
//! Rewarding never fails: an exhausted bond just pays less.

use driip_types::{ChallengeConfig, Collaborators, Currency, RewardOutcome, WalletId};
use rust_decimal::Decimal;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardPolicy {
    flat: Decimal,
    fraction: Decimal,
}

impl RewardPolicy {
    #[must_use]
    pub fn new(flat: Decimal, fraction: Decimal) -> Self {
        Self { flat, fraction }
    }

    #[must_use]
    pub fn from_config(config: &ChallengeConfig) -> Self {
        Self::new(config.flat_reward, config.fractional_reward)
    }

    /// Grant `beneficiary` its reward.
    ///
    /// `culprit` is the wallet whose own funds may be locked; `None` means
    /// the operator is at fault and only the bond can pay.
    pub fn reward(
        &self,
        ports: &mut Collaborators<'_>,
        culprit: Option<WalletId>,
        beneficiary: WalletId,
        amount: Decimal,
        currency: &Currency,
    ) -> RewardOutcome {
        if let Some(wallet) = culprit {
            if amount > Decimal::ZERO
                && ports.fund_ledger.available(wallet, currency) >= amount
                && ports
                    .fund_ledger
                    .lock(wallet, beneficiary, amount, currency)
                    .is_ok()
            {
                debug!(%wallet, %beneficiary, %currency, %amount, "reward by balance lock");
                return RewardOutcome::BalanceLock {
                    wallet,
                    beneficiary,
                    currency: currency.clone(),
                    amount,
                };
            }
        }

        let flat = ports
            .security_bond
            .reward_flat(beneficiary, self.flat, currency);
        let fractional = ports
            .security_bond
            .reward_fractional(beneficiary, self.fraction, currency);
        if flat < self.flat {
            warn!(%beneficiary, %currency, wanted = %self.flat, %flat, "security bond exhausted");
        }
        debug!(%beneficiary, %currency, %flat, %fractional, "reward by bond payout");
        RewardOutcome::BondPayout {
            beneficiary,
            currency: currency.clone(),
            flat,
            fractional,
        }
    }

    /// Reverse a previously granted reward. Returns the bond amount returned
    /// to the pool (zero for balance locks).
    pub fn deprive(&self, ports: &mut Collaborators<'_>, outcome: &RewardOutcome) -> Decimal {
        match outcome {
            RewardOutcome::BalanceLock {
                wallet,
                beneficiary,
                currency,
                amount,
            } => {
                if let Err(err) = ports
                    .fund_ledger
                    .unlock(*wallet, *beneficiary, *amount, currency)
                {
                    warn!(%wallet, %beneficiary, %err, "deprived lock already gone");
                }
                Decimal::ZERO
            }
            RewardOutcome::BondPayout {
                beneficiary,
                currency,
                ..
            } => ports
                .security_bond
                .deprive(*beneficiary, outcome.total(), currency),
        }
    }
}

#[cfg(test)]
mod tests {
    use driip_ledger::LedgerEnvironment;
    use driip_types::{FundLedger, Height, SecurityBond};

    use super::*;

    fn eth() -> Currency {
        Currency::fungible("ETH")
    }

    fn policy() -> RewardPolicy {
        RewardPolicy::new(Decimal::new(10, 0), Decimal::new(5, 2))
    }

    #[test]
    fn locks_when_wallet_covers() {
        let (mut env, _) = LedgerEnvironment::with_random_operator();
        let wallet = WalletId::new();
        let challenger = WalletId::new();
        env.fund.deposit(wallet, Decimal::new(1000, 0), &eth(), Height(1));
        env.bond.fund(Decimal::new(100, 0), &eth());

        let outcome = policy().reward(
            &mut env.collaborators(),
            Some(wallet),
            challenger,
            Decimal::new(500, 0),
            &eth(),
        );
        assert!(matches!(outcome, RewardOutcome::BalanceLock { .. }));
        assert_eq!(outcome.bond_paid(), Decimal::ZERO);
        assert_eq!(env.fund.available(wallet, &eth()), Decimal::new(500, 0));
        assert_eq!(env.bond.available(&eth()), Decimal::new(100, 0));
    }

    #[test]
    fn bond_pays_when_wallet_short() {
        let (mut env, _) = LedgerEnvironment::with_random_operator();
        let wallet = WalletId::new();
        let challenger = WalletId::new();
        env.fund.deposit(wallet, Decimal::new(100, 0), &eth(), Height(1));
        env.bond.fund(Decimal::new(1000, 0), &eth());

        let outcome = policy().reward(
            &mut env.collaborators(),
            Some(wallet),
            challenger,
            Decimal::new(500, 0),
            &eth(),
        );
        // flat 10, then 5% of the remaining 990
        assert_eq!(
            outcome,
            RewardOutcome::BondPayout {
                beneficiary: challenger,
                currency: eth(),
                flat: Decimal::new(10, 0),
                fractional: Decimal::new(4950, 2),
            }
        );
        assert!(!env.fund.is_locked(wallet));
    }

    #[test]
    fn exhausted_bond_degrades() {
        let (mut env, _) = LedgerEnvironment::with_random_operator();
        env.bond.fund(Decimal::new(4, 0), &eth());
        let outcome = policy().reward(
            &mut env.collaborators(),
            None,
            WalletId::new(),
            Decimal::new(500, 0),
            &eth(),
        );
        assert_eq!(outcome.total(), Decimal::new(4, 0));
        assert_eq!(env.bond.available(&eth()), Decimal::ZERO);
    }

    #[test]
    fn deprive_reverses_both_kinds() {
        let (mut env, _) = LedgerEnvironment::with_random_operator();
        let wallet = WalletId::new();
        let a = WalletId::new();
        let b = WalletId::new();
        env.fund.deposit(wallet, Decimal::new(600, 0), &eth(), Height(1));
        env.bond.fund(Decimal::new(1000, 0), &eth());

        let lock = policy().reward(&mut env.collaborators(), Some(wallet), a, Decimal::new(500, 0), &eth());
        assert_eq!(policy().deprive(&mut env.collaborators(), &lock), Decimal::ZERO);
        assert!(!env.fund.is_locked(wallet));

        let first = policy().reward(&mut env.collaborators(), Some(wallet), b, Decimal::new(200, 0), &eth());
        let _second = policy().reward(&mut env.collaborators(), Some(wallet), b, Decimal::new(300, 0), &eth());
        policy().deprive(&mut env.collaborators(), &first);
        assert_eq!(env.fund.locked_by(wallet, b, &eth()), Decimal::new(300, 0));

        let payout = policy().reward(&mut env.collaborators(), None, b, Decimal::ONE, &eth());
        let reversed = policy().deprive(&mut env.collaborators(), &payout);
        assert_eq!(reversed, payout.total());
        assert_eq!(env.bond.available(&eth()), Decimal::new(1000, 0));
    }
}

//! Shared security bond funding challenger and reporter rewards.
//!
//! Payouts are granted, not transferred: the granted amount leaves the pool
//! but stays attributed to the beneficiary so a later deprival can return it
//! exactly.

use std::collections::HashMap;

use driip_types::{Currency, SecurityBond, WalletId};
use rust_decimal::Decimal;
use tracing::debug;

#[derive(Debug, Default)]
pub struct BondPool {
    pools: HashMap<Currency, Decimal>,
    granted: HashMap<(WalletId, Currency), Decimal>,
}

impl BondPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(&mut self, amount: Decimal, currency: &Currency) {
        *self.pools.entry(currency.clone()).or_default() += amount;
    }

    /// Total currently granted to `wallet` in `currency`.
    #[must_use]
    pub fn granted(&self, wallet: WalletId, currency: &Currency) -> Decimal {
        self.granted
            .get(&(wallet, currency.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn pay(&mut self, wallet: WalletId, wanted: Decimal, currency: &Currency) -> Decimal {
        let pool = self.pools.entry(currency.clone()).or_default();
        let paid = wanted.max(Decimal::ZERO).min(*pool);
        if paid.is_zero() {
            return Decimal::ZERO;
        }
        *pool -= paid;
        *self.granted.entry((wallet, currency.clone())).or_default() += paid;
        debug!(%wallet, %currency, %paid, remaining = %*pool, "bond payout");
        paid
    }
}

impl SecurityBond for BondPool {
    fn available(&self, currency: &Currency) -> Decimal {
        self.pools.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    fn reward_flat(&mut self, wallet: WalletId, amount: Decimal, currency: &Currency) -> Decimal {
        self.pay(wallet, amount, currency)
    }

    fn reward_fractional(
        &mut self,
        wallet: WalletId,
        fraction: Decimal,
        currency: &Currency,
    ) -> Decimal {
        let wanted = SecurityBond::available(self, currency) * fraction;
        self.pay(wallet, wanted, currency)
    }

    fn deprive(&mut self, wallet: WalletId, amount: Decimal, currency: &Currency) -> Decimal {
        let key = (wallet, currency.clone());
        let Some(granted) = self.granted.get_mut(&key) else {
            return Decimal::ZERO;
        };
        let reversed = amount.max(Decimal::ZERO).min(*granted);
        *granted -= reversed;
        if granted.is_zero() {
            self.granted.remove(&key);
        }
        *self.pools.entry(currency.clone()).or_default() += reversed;
        debug!(%wallet, %currency, %reversed, "bond deprival");
        reversed
    }
}

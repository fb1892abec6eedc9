//! Client fund: custody of wallet deposits.
//!
//! Tracks per-(wallet, currency) balances with deposited/staged/locked
//! accounting and keeps a height-indexed change log so balances can be
//! queried as of any past height. All mutations are atomic: either the full
//! operation succeeds or the balances are unchanged.
//!
//! - **deposited**: funds held on behalf of the wallet (the tracked balance)
//! - **staged**: funds released by settlement, ready for withdrawal
//! - **locks**: portions of `deposited` reserved in favour of a challenger

use std::collections::HashMap;

use driip_types::{
    BalanceHistory, Currency, DriipError, FundLedger, Height, Result, WalletId,
};
use rust_decimal::Decimal;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct Account {
    deposited: Decimal,
    staged: Decimal,
    /// Locker → amount reserved.
    locks: HashMap<WalletId, Decimal>,
    /// `(height, delta)` applied to `deposited`, in submission order.
    history: Vec<(Height, Decimal)>,
}

impl Account {
    fn locked(&self) -> Decimal {
        self.locks.values().copied().sum()
    }

    fn available(&self) -> Decimal {
        self.deposited - self.locked()
    }

    fn debit(&mut self, amount: Decimal, at: Height) {
        self.deposited -= amount;
        self.history.push((at, -amount));
    }
}

/// In-memory fund ledger and balance history.
#[derive(Debug, Default)]
pub struct ClientFund {
    accounts: HashMap<(WalletId, Currency), Account>,
}

impl ClientFund {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit funds at `at` (increases deposited balance).
    pub fn deposit(&mut self, wallet: WalletId, amount: Decimal, currency: &Currency, at: Height) {
        let account = self.account_mut(wallet, currency);
        account.deposited += amount;
        account.history.push((at, amount));
    }

    #[must_use]
    pub fn deposited(&self, wallet: WalletId, currency: &Currency) -> Decimal {
        self.account(wallet, currency)
            .map_or(Decimal::ZERO, |a| a.deposited)
    }

    #[must_use]
    pub fn staged(&self, wallet: WalletId, currency: &Currency) -> Decimal {
        self.account(wallet, currency)
            .map_or(Decimal::ZERO, |a| a.staged)
    }

    /// Amount `locker` holds locked on `locked`.
    #[must_use]
    pub fn locked_by(&self, locked: WalletId, locker: WalletId, currency: &Currency) -> Decimal {
        self.account(locked, currency)
            .and_then(|a| a.locks.get(&locker).copied())
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum of deposited and staged balances over all wallets.
    #[must_use]
    pub fn total_supply(&self, currency: &Currency) -> Decimal {
        self.accounts
            .iter()
            .filter(|((_, c), _)| c == currency)
            .map(|(_, a)| a.deposited + a.staged)
            .sum()
    }

    fn account(&self, wallet: WalletId, currency: &Currency) -> Option<&Account> {
        self.accounts.get(&(wallet, currency.clone()))
    }

    fn account_mut(&mut self, wallet: WalletId, currency: &Currency) -> &mut Account {
        self.accounts.entry((wallet, currency.clone())).or_default()
    }

    fn require_available(&self, wallet: WalletId, amount: Decimal, currency: &Currency) -> Result<()> {
        let available = FundLedger::available(self, wallet, currency);
        if available < amount {
            return Err(DriipError::InsufficientFunds {
                wallet,
                currency: currency.clone(),
                needed: amount,
                available,
            });
        }
        Ok(())
    }
}

impl BalanceHistory for ClientFund {
    fn tracked_balance(&self, wallet: WalletId, currency: &Currency, height: Height) -> Decimal {
        self.account(wallet, currency).map_or(Decimal::ZERO, |a| {
            a.history
                .iter()
                .filter(|(h, _)| *h <= height)
                .map(|(_, delta)| *delta)
                .sum()
        })
    }
}

impl FundLedger for ClientFund {
    fn available(&self, wallet: WalletId, currency: &Currency) -> Decimal {
        self.account(wallet, currency)
            .map_or(Decimal::ZERO, Account::available)
    }

    fn is_locked(&self, wallet: WalletId) -> bool {
        self.accounts
            .iter()
            .any(|((w, _), a)| *w == wallet && a.locked() > Decimal::ZERO)
    }

    fn stage(&mut self, wallet: WalletId, amount: Decimal, currency: &Currency, at: Height) -> Result<()> {
        self.require_available(wallet, amount, currency)?;
        let account = self.account_mut(wallet, currency);
        account.debit(amount, at);
        account.staged += amount;
        debug!(%wallet, %currency, %amount, "staged");
        Ok(())
    }

    fn stage_to_beneficiary(
        &mut self,
        wallet: WalletId,
        beneficiary: WalletId,
        amount: Decimal,
        currency: &Currency,
        at: Height,
    ) -> Result<()> {
        self.require_available(wallet, amount, currency)?;
        self.account_mut(wallet, currency).debit(amount, at);
        self.account_mut(beneficiary, currency).staged += amount;
        debug!(%wallet, %beneficiary, %currency, %amount, "staged to beneficiary");
        Ok(())
    }

    fn lock(
        &mut self,
        locked: WalletId,
        locker: WalletId,
        amount: Decimal,
        currency: &Currency,
    ) -> Result<()> {
        self.require_available(locked, amount, currency)?;
        *self
            .account_mut(locked, currency)
            .locks
            .entry(locker)
            .or_default() += amount;
        Ok(())
    }

    fn unlock(
        &mut self,
        locked: WalletId,
        locker: WalletId,
        amount: Decimal,
        currency: &Currency,
    ) -> Result<Decimal> {
        let locks = &mut self
            .accounts
            .get_mut(&(locked, currency.clone()))
            .ok_or(DriipError::LockNotFound { wallet: locked, locker })?
            .locks;
        let held = locks
            .get_mut(&locker)
            .ok_or(DriipError::LockNotFound { wallet: locked, locker })?;
        let released = amount.min(*held);
        *held -= released;
        if held.is_zero() {
            locks.remove(&locker);
        }
        debug!(%locked, %locker, %currency, %released, "unlocked");
        Ok(released)
    }

    fn seize(&mut self, from: WalletId, to: WalletId, currency: &Currency, at: Height) -> Decimal {
        let Some(amount) = self
            .accounts
            .get_mut(&(from, currency.clone()))
            .and_then(|a| a.locks.remove(&to))
        else {
            return Decimal::ZERO;
        };
        self.account_mut(from, currency).debit(amount, at);
        self.account_mut(to, currency).staged += amount;
        debug!(%from, %to, %currency, %amount, "seized locked funds");
        amount
    }
}

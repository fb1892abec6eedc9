//! Narrow interfaces to the collaborators the engine consumes.
//!
//! The engine never holds value itself: custody, genuineness checks and
//! registries live behind these traits. Operations receive them bundled in a
//! [`Collaborators`] borrow for the duration of a single call.

use rust_decimal::Decimal;

use crate::{
    Currency, Driip, EngineEvent, Evidence, Height, Order, Payment, RecordHash, RecordKind,
    Result, Trade, WalletId,
};

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Genuineness and consistency checks over records.
pub trait Validator {
    /// Hashes recompute and the operator seal verifies.
    fn is_genuine_payment(&self, payment: &Payment) -> bool {
        self.is_genuine_payment_wallet_seal(payment) && self.is_genuine_payment_operator_seal(payment)
    }

    fn is_genuine_trade(&self, trade: &Trade) -> bool;

    fn is_genuine_order(&self, order: &Order) -> bool {
        self.is_genuine_order_wallet_seal(order) && self.is_genuine_order_operator_seal(order)
    }

    /// The order's wallet hash matches its content.
    fn is_genuine_order_wallet_seal(&self, order: &Order) -> bool;

    /// The order's operator hash matches and carries a valid operator
    /// signature, whatever the wallet hash says.
    fn is_genuine_order_operator_seal(&self, order: &Order) -> bool;

    /// The payment's wallet hash matches its content.
    fn is_genuine_payment_wallet_seal(&self, payment: &Payment) -> bool;

    fn is_genuine_payment_operator_seal(&self, payment: &Payment) -> bool;

    fn is_genuine_driip(&self, driip: &Driip) -> bool {
        match driip {
            Driip::Trade(t) => self.is_genuine_trade(t),
            Driip::Payment(p) => self.is_genuine_payment(p),
        }
    }

    fn is_genuine_evidence(&self, evidence: &Evidence) -> bool {
        match evidence {
            Evidence::Order(o) => self.is_genuine_order(o),
            Evidence::Trade(t) => self.is_genuine_trade(t),
            Evidence::Payment(p) => self.is_genuine_payment(p),
        }
    }

    fn is_party(&self, wallet: WalletId, driip: &Driip) -> bool {
        driip.is_party(wallet)
    }

    /// `second` continues `first` for `wallet` in the payment currency: its
    /// previous balance is `first`'s current balance and its running fee
    /// total adds exactly its own fee.
    fn successive_payments_consistent(
        &self,
        wallet: WalletId,
        first: &Payment,
        second: &Payment,
    ) -> bool {
        let (Some(a), Some(b)) = (first.party(wallet), second.party(wallet)) else {
            return false;
        };
        b.balance.previous == a.balance.current && b.fees.total == a.fees.total + b.fees.single
    }

    /// Same check as for payments, over the legs in `currency`.
    fn successive_trades_consistent(
        &self,
        wallet: WalletId,
        currency: &Currency,
        first: &Trade,
        second: &Trade,
    ) -> bool {
        let find = |trade: &Trade| {
            trade
                .legs(wallet)
                .into_iter()
                .find(|leg| &leg.currency == currency)
        };
        let (Some(a), Some(b)) = (find(first), find(second)) else {
            return false;
        };
        if b.balance.previous != a.balance.current {
            return false;
        }
        match (a.fees, b.fees) {
            (Some(fa), Some(fb)) => fb.total == fa.total + fb.single,
            (None, None) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

/// Hashes proven fraudulent and wallets proven to double spend.
pub trait FraudRegistry {
    fn is_fraudulent(&self, hash: &RecordHash) -> bool;

    /// Returns `false` if the hash was already registered.
    fn register(&mut self, hash: RecordHash, kind: RecordKind) -> bool;

    fn is_double_spender(&self, wallet: WalletId) -> bool;

    fn add_double_spender(&mut self, wallet: WalletId);
}

pub trait CancelRegistry {
    fn is_cancelled(&self, order_hash: &RecordHash) -> bool;
}

// ---------------------------------------------------------------------------
// Funds
// ---------------------------------------------------------------------------

/// Point-in-time query over a wallet's deposit/withdrawal history.
pub trait BalanceHistory {
    /// Balance of `wallet` in `currency` as of `height` (inclusive).
    fn tracked_balance(&self, wallet: WalletId, currency: &Currency, height: Height) -> Decimal;
}

/// Custody of client funds.
pub trait FundLedger: BalanceHistory {
    /// Balance not reserved by any lock.
    fn available(&self, wallet: WalletId, currency: &Currency) -> Decimal;

    /// Whether any challenger holds a lock on the wallet.
    fn is_locked(&self, wallet: WalletId) -> bool;

    /// Move `amount` from the wallet's deposited balance to its staged
    /// (withdrawable) balance.
    fn stage(&mut self, wallet: WalletId, amount: Decimal, currency: &Currency, at: Height)
    -> Result<()>;

    /// Move `amount` from the wallet's deposited balance to `beneficiary`'s
    /// staged balance.
    fn stage_to_beneficiary(
        &mut self,
        wallet: WalletId,
        beneficiary: WalletId,
        amount: Decimal,
        currency: &Currency,
        at: Height,
    ) -> Result<()>;

    /// Reserve `amount` of `locked`'s balance in favour of `locker`.
    fn lock(
        &mut self,
        locked: WalletId,
        locker: WalletId,
        amount: Decimal,
        currency: &Currency,
    ) -> Result<()>;

    /// Release up to `amount` of what `locker` holds on `locked`, returning
    /// the amount actually released. Other reservations by the same locker
    /// stay in place.
    fn unlock(
        &mut self,
        locked: WalletId,
        locker: WalletId,
        amount: Decimal,
        currency: &Currency,
    ) -> Result<Decimal>;

    /// Transfer the amount `to` has locked on `from` into `to`'s staged
    /// balance. Returns the amount moved (zero when no lock exists).
    fn seize(&mut self, from: WalletId, to: WalletId, currency: &Currency, at: Height) -> Decimal;
}

/// Shared pool funding rewards the culpable wallet cannot cover.
pub trait SecurityBond {
    fn available(&self, currency: &Currency) -> Decimal;

    /// Pay up to `amount`, capped by the pool. Returns what was paid.
    fn reward_flat(&mut self, wallet: WalletId, amount: Decimal, currency: &Currency) -> Decimal;

    /// Pay `fraction` of the pool's current balance. Returns what was paid.
    fn reward_fractional(
        &mut self,
        wallet: WalletId,
        fraction: Decimal,
        currency: &Currency,
    ) -> Decimal;

    /// Return up to `amount` previously granted to `wallet` in `currency` to
    /// the pool. Returns the amount reversed.
    fn deprive(&mut self, wallet: WalletId, amount: Decimal, currency: &Currency) -> Decimal;
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

pub trait EventSink {
    fn emit(&mut self, event: EngineEvent);
}

/// Every collaborator an operation may touch, borrowed for one call.
pub struct Collaborators<'a> {
    pub validator: &'a dyn Validator,
    pub fraud_registry: &'a mut dyn FraudRegistry,
    pub cancel_registry: &'a dyn CancelRegistry,
    pub fund_ledger: &'a mut dyn FundLedger,
    pub security_bond: &'a mut dyn SecurityBond,
    pub events: &'a mut dyn EventSink,
}

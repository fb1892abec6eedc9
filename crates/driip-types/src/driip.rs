//! Shared record primitives and the two record unions the engine consumes.
//!
//! A **driip** is a trade or payment two parties want to settle. An
//! **evidence** record is anything that can contradict a settlement proposal:
//! an order, a trade or a payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, Height, Order, Payment, RecordHash, Trade, WalletId};

/// What kind of record a hash refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Order,
    Trade,
    Payment,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Order => write!(f, "ORDER"),
            Self::Trade => write!(f, "TRADE"),
            Self::Payment => write!(f, "PAYMENT"),
        }
    }
}

/// A hash plus the signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seal {
    pub hash: RecordHash,
    /// Raw ed25519 signature bytes (64). Empty for unsealed records.
    pub signature: Vec<u8>,
}

impl Seal {
    #[must_use]
    pub fn unsealed() -> Self {
        Self {
            hash: RecordHash::ZERO,
            signature: Vec::new(),
        }
    }
}

/// Wallet seal (content the wallet authorised) and operator seal (the full
/// record as the operator committed to it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seals {
    pub wallet: Seal,
    pub operator: Seal,
}

impl Seals {
    #[must_use]
    pub fn unsealed() -> Self {
        Self {
            wallet: Seal::unsealed(),
            operator: Seal::unsealed(),
        }
    }
}

/// A party's balance in one currency before and after the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTransition {
    pub previous: Decimal,
    pub current: Decimal,
}

impl BalanceTransition {
    #[must_use]
    pub fn new(previous: Decimal, current: Decimal) -> Self {
        Self { previous, current }
    }

    pub(crate) fn hash_bytes(&self) -> Vec<u8> {
        format!("{}|{}", self.previous, self.current).into_bytes()
    }
}

/// Fee charged by this record (`single`) and the party's running total of
/// fees across all its records (`total`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fees {
    pub single: Decimal,
    pub total: Decimal,
}

impl Fees {
    #[must_use]
    pub fn new(single: Decimal, total: Decimal) -> Self {
        Self { single, total }
    }

    pub(crate) fn hash_bytes(&self) -> Vec<u8> {
        format!("{}|{}", self.single, self.total).into_bytes()
    }
}

/// One currency leg of a driip as seen from a single party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    pub currency: Currency,
    /// The party's per-wallet nonce in this record.
    pub party_nonce: u64,
    pub balance: BalanceTransition,
    /// Fees charged in this leg's currency, if any.
    pub fees: Option<Fees>,
}

// ---------------------------------------------------------------------------
// Driip
// ---------------------------------------------------------------------------

/// A settleable record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Driip {
    Trade(Trade),
    Payment(Payment),
}

impl Driip {
    #[must_use]
    pub fn hash(&self) -> RecordHash {
        match self {
            Self::Trade(t) => t.hash(),
            Self::Payment(p) => p.hash(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Trade(_) => RecordKind::Trade,
            Self::Payment(_) => RecordKind::Payment,
        }
    }

    /// Global driip nonce assigned by the operator.
    #[must_use]
    pub fn nonce(&self) -> u64 {
        match self {
            Self::Trade(t) => t.nonce,
            Self::Payment(p) => p.nonce,
        }
    }

    /// The ledger height the record is anchored to.
    #[must_use]
    pub fn reference_height(&self) -> Height {
        match self {
            Self::Trade(t) => t.block_height,
            Self::Payment(p) => p.block_height,
        }
    }

    #[must_use]
    pub fn is_party(&self, wallet: WalletId) -> bool {
        match self {
            Self::Trade(t) => t.is_party(wallet),
            Self::Payment(p) => p.is_party(wallet),
        }
    }

    /// Currency legs of `wallet` in this record, intended leg first.
    /// Empty when the wallet is not a party.
    #[must_use]
    pub fn legs(&self, wallet: WalletId) -> Vec<Leg> {
        match self {
            Self::Trade(t) => t.legs(wallet),
            Self::Payment(p) => p.leg(wallet).into_iter().collect(),
        }
    }

    /// `(wallet, party nonce)` of the origin party (buyer / sender).
    #[must_use]
    pub fn origin(&self) -> (WalletId, u64) {
        match self {
            Self::Trade(t) => (t.buyer.wallet, t.buyer.nonce),
            Self::Payment(p) => (p.sender.wallet, p.sender.nonce),
        }
    }

    /// `(wallet, party nonce)` of the target party (seller / recipient).
    #[must_use]
    pub fn target(&self) -> (WalletId, u64) {
        match self {
            Self::Trade(t) => (t.seller.wallet, t.seller.nonce),
            Self::Payment(p) => (p.recipient.wallet, p.recipient.nonce),
        }
    }
}

impl From<Trade> for Driip {
    fn from(trade: Trade) -> Self {
        Self::Trade(trade)
    }
}

impl From<Payment> for Driip {
    fn from(payment: Payment) -> Self {
        Self::Payment(payment)
    }
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// Counter-evidence submitted against a live proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Evidence {
    Order(Order),
    Trade(Trade),
    Payment(Payment),
}

impl Evidence {
    #[must_use]
    pub fn hash(&self) -> RecordHash {
        match self {
            Self::Order(o) => o.hash(),
            Self::Trade(t) => t.hash(),
            Self::Payment(p) => p.hash(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Order(_) => RecordKind::Order,
            Self::Trade(_) => RecordKind::Trade,
            Self::Payment(_) => RecordKind::Payment,
        }
    }

    /// Nonce compared against the proposal: the wallet's order nonce for
    /// orders, the global driip nonce otherwise.
    #[must_use]
    pub fn nonce(&self) -> u64 {
        match self {
            Self::Order(o) => o.nonce,
            Self::Trade(t) => t.nonce,
            Self::Payment(p) => p.nonce,
        }
    }

    /// The balance of `wallet` in `currency` that this record attests to,
    /// or `None` when the record does not involve that wallet and currency.
    #[must_use]
    pub fn attested_balance(&self, wallet: WalletId, currency: &Currency) -> Option<Decimal> {
        match self {
            Self::Order(o) => (o.wallet == wallet && &o.placement.currency == currency)
                .then_some(o.placement.residual_balance),
            Self::Trade(t) => t
                .legs(wallet)
                .into_iter()
                .find(|leg| &leg.currency == currency)
                .map(|leg| leg.balance.current),
            Self::Payment(p) => p
                .leg(wallet)
                .filter(|leg| &leg.currency == currency)
                .map(|leg| leg.balance.current),
        }
    }

    /// Hash of the order `wallet` placed for this record, if any.
    #[must_use]
    pub fn order_hash(&self, wallet: WalletId) -> Option<RecordHash> {
        match self {
            Self::Order(o) => (o.wallet == wallet).then(|| o.hash()),
            Self::Trade(t) => t.party(wallet).map(|party| party.order_hash),
            Self::Payment(_) => None,
        }
    }
}

impl From<Driip> for Evidence {
    fn from(driip: Driip) -> Self {
        match driip {
            Driip::Trade(t) => Self::Trade(t),
            Driip::Payment(p) => Self::Payment(p),
        }
    }
}

impl From<Order> for Evidence {
    fn from(order: Order) -> Self {
        Self::Order(order)
    }
}

impl From<Trade> for Evidence {
    fn from(trade: Trade) -> Self {
        Self::Trade(trade)
    }
}

impl From<Payment> for Evidence {
    fn from(payment: Payment) -> Self {
        Self::Payment(payment)
    }
}

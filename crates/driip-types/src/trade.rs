//! Trade driips: an exchange of an intended currency against a conjugate
//! currency between a buyer and a seller.
//!
//! A trade touches two currencies per party, so a single trade can back two
//! settlement proposals per wallet (one per currency leg).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BalanceTransition, Currency, Fees, Height, Leg, RecordHash, Seal, WalletId};

/// The two currencies of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCurrencies {
    /// The currency being bought/sold.
    pub intended: Currency,
    /// The currency it is paid in.
    pub conjugate: Currency,
}

/// One side of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeParty {
    pub wallet: WalletId,
    /// Per-wallet nonce.
    pub nonce: u64,
    /// Operator hash of the order this side of the trade filled.
    pub order_hash: RecordHash,
    pub intended: BalanceTransition,
    pub conjugate: BalanceTransition,
    pub fees: Fees,
    /// Currency the fees are charged in (one of the two trade currencies).
    pub fee_currency: Currency,
}

impl TradeParty {
    fn hash_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(160);
        out.extend_from_slice(self.wallet.as_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        out.extend_from_slice(self.order_hash.as_bytes());
        out.extend_from_slice(&self.intended.hash_bytes());
        out.extend_from_slice(&self.conjugate.hash_bytes());
        out.extend_from_slice(&self.fees.hash_bytes());
        out.extend_from_slice(&self.fee_currency.hash_bytes());
        out
    }
}

/// A trade as sealed by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Global driip nonce assigned by the operator.
    pub nonce: u64,
    /// Quantity of the intended currency exchanged.
    pub amount: Decimal,
    pub currencies: TradeCurrencies,
    pub buyer: TradeParty,
    pub seller: TradeParty,
    pub block_height: Height,
    /// Operator seal over the full trade.
    pub seal: Seal,
}

impl Trade {
    #[must_use]
    pub fn hash(&self) -> RecordHash {
        self.seal.hash
    }

    /// Format: `"driip:trade:v1:" || nonce || amount || intended || conjugate || buyer || seller || block_height`
    #[must_use]
    pub fn compute_hash(&self) -> RecordHash {
        RecordHash::digest(
            b"driip:trade:v1:",
            &[
                &self.nonce.to_le_bytes(),
                self.amount.to_string().as_bytes(),
                &self.currencies.intended.hash_bytes(),
                &self.currencies.conjugate.hash_bytes(),
                &self.buyer.hash_bytes(),
                &self.seller.hash_bytes(),
                &self.block_height.0.to_le_bytes(),
            ],
        )
    }

    #[must_use]
    pub fn is_buyer(&self, wallet: WalletId) -> bool {
        self.buyer.wallet == wallet
    }

    #[must_use]
    pub fn is_seller(&self, wallet: WalletId) -> bool {
        self.seller.wallet == wallet
    }

    #[must_use]
    pub fn is_party(&self, wallet: WalletId) -> bool {
        self.is_buyer(wallet) || self.is_seller(wallet)
    }

    #[must_use]
    pub fn party(&self, wallet: WalletId) -> Option<&TradeParty> {
        if self.is_buyer(wallet) {
            Some(&self.buyer)
        } else if self.is_seller(wallet) {
            Some(&self.seller)
        } else {
            None
        }
    }

    /// Intended leg first, then conjugate.
    #[must_use]
    pub fn legs(&self, wallet: WalletId) -> Vec<Leg> {
        let Some(party) = self.party(wallet) else {
            return Vec::new();
        };
        let fees_for = |currency: &Currency| (&party.fee_currency == currency).then_some(party.fees);
        vec![
            Leg {
                currency: self.currencies.intended.clone(),
                party_nonce: party.nonce,
                balance: party.intended,
                fees: fees_for(&self.currencies.intended),
            },
            Leg {
                currency: self.currencies.conjugate.clone(),
                party_nonce: party.nonce,
                balance: party.conjugate,
                fees: fees_for(&self.currencies.conjugate),
            },
        ]
    }
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade[{}] nonce={} {} {}/{}",
            self.hash().short(),
            self.nonce,
            self.amount,
            self.currencies.intended,
            self.currencies.conjugate,
        )
    }
}

/// Unsealed trade builder for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Trade {
    /// Zero balances and fees, fees charged in the intended currency,
    /// anchored at height 1, party nonces 1.
    pub fn dummy(
        buyer: WalletId,
        seller: WalletId,
        intended: Currency,
        conjugate: Currency,
        nonce: u64,
    ) -> Self {
        let party = |wallet| TradeParty {
            wallet,
            nonce: 1,
            order_hash: RecordHash::ZERO,
            intended: BalanceTransition::default(),
            conjugate: BalanceTransition::default(),
            fees: Fees::default(),
            fee_currency: intended.clone(),
        };
        Self {
            nonce,
            amount: Decimal::ONE,
            currencies: TradeCurrencies {
                intended: intended.clone(),
                conjugate: conjugate.clone(),
            },
            buyer: party(buyer),
            seller: party(seller),
            block_height: Height(1),
            seal: Seal::unsealed(),
        }
    }
}

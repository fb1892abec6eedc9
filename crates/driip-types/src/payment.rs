//! Payment driips: a single-currency transfer from sender to recipient.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BalanceTransition, Currency, Fees, Height, Leg, RecordHash, Seals, WalletId};

/// One side of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentParty {
    pub wallet: WalletId,
    /// Per-wallet nonce, incremented by one for each record the wallet is in.
    pub nonce: u64,
    pub balance: BalanceTransition,
    pub fees: Fees,
}

impl PaymentParty {
    fn hash_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(96);
        out.extend_from_slice(self.wallet.as_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        out.extend_from_slice(&self.balance.hash_bytes());
        out.extend_from_slice(&self.fees.hash_bytes());
        out
    }
}

/// A payment as sealed by the sender wallet and the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Global driip nonce assigned by the operator.
    pub nonce: u64,
    pub currency: Currency,
    pub amount: Decimal,
    pub sender: PaymentParty,
    pub recipient: PaymentParty,
    /// Ledger height the operator anchored this payment to.
    pub block_height: Height,
    pub seals: Seals,
}

impl Payment {
    /// Identity hash: the operator seal hash.
    #[must_use]
    pub fn hash(&self) -> RecordHash {
        self.seals.operator.hash
    }

    /// Recompute the hash of the content the sender authorised.
    ///
    /// Format: `"driip:payment:wallet:v1:" || sender || sender_nonce || recipient || currency || amount`
    #[must_use]
    pub fn compute_wallet_hash(&self) -> RecordHash {
        RecordHash::digest(
            b"driip:payment:wallet:v1:",
            &[
                self.sender.wallet.as_bytes(),
                &self.sender.nonce.to_le_bytes(),
                self.recipient.wallet.as_bytes(),
                &self.currency.hash_bytes(),
                self.amount.to_string().as_bytes(),
            ],
        )
    }

    /// Recompute the operator hash over the stored wallet hash and the
    /// operator-assigned fields.
    #[must_use]
    pub fn compute_operator_hash(&self) -> RecordHash {
        RecordHash::digest(
            b"driip:payment:operator:v1:",
            &[
                self.seals.wallet.hash.as_bytes(),
                &self.nonce.to_le_bytes(),
                &self.sender.hash_bytes(),
                &self.recipient.hash_bytes(),
                &self.block_height.0.to_le_bytes(),
            ],
        )
    }

    #[must_use]
    pub fn is_sender(&self, wallet: WalletId) -> bool {
        self.sender.wallet == wallet
    }

    #[must_use]
    pub fn is_recipient(&self, wallet: WalletId) -> bool {
        self.recipient.wallet == wallet
    }

    #[must_use]
    pub fn is_party(&self, wallet: WalletId) -> bool {
        self.is_sender(wallet) || self.is_recipient(wallet)
    }

    /// The side `wallet` is on, sender first.
    #[must_use]
    pub fn party(&self, wallet: WalletId) -> Option<&PaymentParty> {
        if self.is_sender(wallet) {
            Some(&self.sender)
        } else if self.is_recipient(wallet) {
            Some(&self.recipient)
        } else {
            None
        }
    }

    #[must_use]
    pub fn leg(&self, wallet: WalletId) -> Option<Leg> {
        self.party(wallet).map(|party| Leg {
            currency: self.currency.clone(),
            party_nonce: party.nonce,
            balance: party.balance,
            fees: Some(party.fees),
        })
    }
}

impl std::fmt::Display for Payment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Payment[{}] nonce={} {} {} {} -> {}",
            self.hash().short(),
            self.nonce,
            self.amount,
            self.currency,
            self.sender.wallet,
            self.recipient.wallet,
        )
    }
}

/// Unsealed payment builder for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Payment {
    /// Zero balances and fees, anchored at height 1, party nonces 1.
    pub fn dummy(
        sender: WalletId,
        recipient: WalletId,
        currency: Currency,
        amount: Decimal,
        nonce: u64,
    ) -> Self {
        let party = |wallet| PaymentParty {
            wallet,
            nonce: 1,
            balance: BalanceTransition::default(),
            fees: Fees::default(),
        };
        Self {
            nonce,
            currency,
            amount,
            sender: party(sender),
            recipient: party(recipient),
            block_height: Height(1),
            seals: Seals::unsealed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_payment() -> Payment {
        Payment::dummy(
            WalletId::new(),
            WalletId::new(),
            Currency::fungible("ETH"),
            Decimal::new(100, 0),
            3,
        )
    }

    #[test]
    fn wallet_hash_ignores_operator_fields() {
        let p1 = make_payment();
        let mut p2 = p1.clone();
        p2.nonce = 99;
        p2.block_height = Height(42);
        assert_eq!(p1.compute_wallet_hash(), p2.compute_wallet_hash());
        assert_ne!(p1.compute_operator_hash(), p2.compute_operator_hash());
    }

    #[test]
    fn operator_hash_covers_balances() {
        let p1 = make_payment();
        let mut p2 = p1.clone();
        p2.sender.balance.current = Decimal::ONE;
        assert_ne!(p1.compute_operator_hash(), p2.compute_operator_hash());
    }

    #[test]
    fn party_lookup() {
        let p = make_payment();
        assert_eq!(p.party(p.sender.wallet), Some(&p.sender));
        assert_eq!(p.party(p.recipient.wallet), Some(&p.recipient));
        assert!(p.party(WalletId::new()).is_none());
        assert!(p.leg(WalletId::new()).is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let p = make_payment();
        let json = serde_json::to_string(&p).unwrap();
        let back: Payment = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}

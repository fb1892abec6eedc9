//! Orders as counter-evidence.
//!
//! Order matching is not part of this engine. An order matters here only
//! because it is a signed commitment by a wallet: it attests how much of the
//! debited currency the wallet keeps once the order fills. A proposal that
//! claims a higher remaining balance than a newer order admits is
//! contradicted by that order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, Height, RecordHash, Seals, WalletId};

/// What the wallet committed to when placing the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacement {
    /// The currency the order debits.
    pub currency: Currency,
    /// Amount of `currency` committed.
    pub amount: Decimal,
    /// Balance of `currency` the wallet retains after the order fills.
    pub residual_balance: Decimal,
}

/// A wallet-signed, operator-sealed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Per-wallet nonce.
    pub nonce: u64,
    pub wallet: WalletId,
    pub placement: OrderPlacement,
    pub block_height: Height,
    pub seals: Seals,
}

impl Order {
    /// Identity hash: the operator seal hash.
    #[must_use]
    pub fn hash(&self) -> RecordHash {
        self.seals.operator.hash
    }

    /// Format: `"driip:order:wallet:v1:" || wallet || nonce || currency || amount || residual`
    #[must_use]
    pub fn compute_wallet_hash(&self) -> RecordHash {
        RecordHash::digest(
            b"driip:order:wallet:v1:",
            &[
                self.wallet.as_bytes(),
                &self.nonce.to_le_bytes(),
                &self.placement.currency.hash_bytes(),
                self.placement.amount.to_string().as_bytes(),
                self.placement.residual_balance.to_string().as_bytes(),
            ],
        )
    }

    /// Format: `"driip:order:operator:v1:" || wallet_hash || block_height`
    #[must_use]
    pub fn compute_operator_hash(&self) -> RecordHash {
        RecordHash::digest(
            b"driip:order:operator:v1:",
            &[
                self.seals.wallet.hash.as_bytes(),
                &self.block_height.0.to_le_bytes(),
            ],
        )
    }
}

/// Unsealed order builder for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(
        wallet: WalletId,
        currency: Currency,
        amount: Decimal,
        residual_balance: Decimal,
        nonce: u64,
    ) -> Self {
        Self {
            nonce,
            wallet,
            placement: OrderPlacement {
                currency,
                amount,
                residual_balance,
            },
            block_height: Height(1),
            seals: Seals::unsealed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_hash_deterministic() {
        let o = Order::dummy(
            WalletId::new(),
            Currency::fungible("ETH"),
            Decimal::ONE,
            Decimal::TEN,
            4,
        );
        assert_eq!(o.compute_wallet_hash(), o.compute_wallet_hash());
    }

    #[test]
    fn wallet_hash_differs_by_residual() {
        let o1 = Order::dummy(
            WalletId::new(),
            Currency::fungible("ETH"),
            Decimal::ONE,
            Decimal::TEN,
            4,
        );
        let mut o2 = o1.clone();
        o2.placement.residual_balance = Decimal::ONE;
        assert_ne!(o1.compute_wallet_hash(), o2.compute_wallet_hash());
    }

    #[test]
    fn operator_hash_binds_wallet_hash() {
        let mut o = Order::dummy(
            WalletId::new(),
            Currency::fungible("ETH"),
            Decimal::ONE,
            Decimal::TEN,
            4,
        );
        let before = o.compute_operator_hash();
        o.seals.wallet.hash = o.compute_wallet_hash();
        assert_ne!(before, o.compute_operator_hash());
    }
}

//! Finalized settlement records.
//!
//! A settlement is created the first time either party of a driip settles.
//! The two parties settle independently, so a record routinely has one side
//! `done` while the other is still pending. Identity fields never change
//! after creation; only `done` / `done_height` do, and only once per side.

use serde::{Deserialize, Serialize};

use crate::{Height, RecordHash, RecordKind, WalletId};

/// One side of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementParty {
    /// The party's per-wallet nonce in the settled record.
    pub nonce: u64,
    pub wallet: WalletId,
    pub done: bool,
    pub done_height: Option<Height>,
}

impl SettlementParty {
    #[must_use]
    pub fn pending(wallet: WalletId, nonce: u64) -> Self {
        Self {
            nonce,
            wallet,
            done: false,
            done_height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub settled_kind: RecordKind,
    pub settled_hash: RecordHash,
    /// Buyer or sender.
    pub origin: SettlementParty,
    /// Seller or recipient.
    pub target: SettlementParty,
}

impl Settlement {
    /// The side `wallet` is on, origin first.
    #[must_use]
    pub fn party(&self, wallet: WalletId) -> Option<&SettlementParty> {
        if self.origin.wallet == wallet {
            Some(&self.origin)
        } else if self.target.wallet == wallet {
            Some(&self.target)
        } else {
            None
        }
    }

    pub fn party_mut(&mut self, wallet: WalletId) -> Option<&mut SettlementParty> {
        if self.origin.wallet == wallet {
            Some(&mut self.origin)
        } else if self.target.wallet == wallet {
            Some(&mut self.target)
        } else {
            None
        }
    }

    /// Whether both sides have settled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.origin.done && self.target.done
    }
}

/// The most recent completed release for a (wallet, currency) pair, kept
/// for causal-rebalance detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Proposal nonce that was settled.
    pub nonce: u64,
    pub height: Height,
    /// Amount staged by that settlement.
    pub staged: rust_decimal::Decimal,
}

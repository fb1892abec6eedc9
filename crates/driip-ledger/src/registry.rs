//! Fraud and cancellation registries.

use std::collections::{HashMap, HashSet};

use driip_types::{CancelRegistry, FraudRegistry, RecordHash, RecordKind, WalletId};

/// Hashes proven fraudulent and wallets flagged as double spenders.
#[derive(Debug, Default)]
pub struct InMemoryFraudRegistry {
    records: HashMap<RecordHash, RecordKind>,
    double_spenders: HashSet<WalletId>,
}

impl InMemoryFraudRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind_of(&self, hash: &RecordHash) -> Option<RecordKind> {
        self.records.get(hash).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FraudRegistry for InMemoryFraudRegistry {
    fn is_fraudulent(&self, hash: &RecordHash) -> bool {
        self.records.contains_key(hash)
    }

    fn register(&mut self, hash: RecordHash, kind: RecordKind) -> bool {
        if self.records.contains_key(&hash) {
            return false;
        }
        self.records.insert(hash, kind);
        true
    }

    fn is_double_spender(&self, wallet: WalletId) -> bool {
        self.double_spenders.contains(&wallet)
    }

    fn add_double_spender(&mut self, wallet: WalletId) {
        self.double_spenders.insert(wallet);
    }
}

/// Operator hashes of cancelled orders.
#[derive(Debug, Default)]
pub struct InMemoryCancelRegistry {
    cancelled: HashSet<RecordHash>,
}

impl InMemoryCancelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&mut self, order_hash: RecordHash) {
        self.cancelled.insert(order_hash);
    }
}

impl CancelRegistry for InMemoryCancelRegistry {
    fn is_cancelled(&self, order_hash: &RecordHash) -> bool {
        self.cancelled.contains(order_hash)
    }
}

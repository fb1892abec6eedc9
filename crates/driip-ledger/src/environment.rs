//! Bundle of in-memory collaborators.

use driip_types::Collaborators;
use ed25519_dalek::VerifyingKey;

use crate::{
    BondPool, ClientFund, EventLog, InMemoryCancelRegistry, InMemoryFraudRegistry, SealValidator,
};

/// Owns one of each collaborator and lends them to engine operations.
pub struct LedgerEnvironment {
    pub validator: SealValidator,
    pub fraud_registry: InMemoryFraudRegistry,
    pub cancel_registry: InMemoryCancelRegistry,
    pub fund: ClientFund,
    pub bond: BondPool,
    pub events: EventLog,
}

impl LedgerEnvironment {
    /// Empty ledgers trusting records sealed by `operator`.
    #[must_use]
    pub fn new(operator: VerifyingKey) -> Self {
        Self {
            validator: SealValidator::new(operator),
            fraud_registry: InMemoryFraudRegistry::new(),
            cancel_registry: InMemoryCancelRegistry::new(),
            fund: ClientFund::new(),
            bond: BondPool::new(),
            events: EventLog::new(),
        }
    }

    /// Borrow everything for a single operation.
    pub fn collaborators(&mut self) -> Collaborators<'_> {
        Collaborators {
            validator: &self.validator,
            fraud_registry: &mut self.fraud_registry,
            cancel_registry: &self.cancel_registry,
            fund_ledger: &mut self.fund,
            security_bond: &mut self.bond,
            events: &mut self.events,
        }
    }
}

/// Environment plus a matching sealer for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl LedgerEnvironment {
    #[must_use]
    pub fn with_random_operator() -> (Self, crate::OperatorSealer) {
        let sealer = crate::OperatorSealer::random();
        (Self::new(sealer.verifying_key()), sealer)
    }
}

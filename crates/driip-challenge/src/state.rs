//! Engine-owned state.

use crate::{ProposalStore, SettlementLedger};

/// Everything the engine itself persists. Operations borrow it mutably for
/// their whole duration, which serializes them.
#[derive(Debug, Default)]
pub struct SettlementState {
    pub proposals: ProposalStore,
    pub settlements: SettlementLedger,
}

impl SettlementState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

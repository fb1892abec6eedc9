//! Notifications emitted after every successful state change.
//!
//! Events are fire-and-forget: a sink never influences the operation that
//! emitted it. Payloads are serializable so a sink can forward them as JSON.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Currency, Height, OperationalMode, ProposalFamily, RecordHash, RecordKind, RewardOutcome,
    WalletId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    ProposalStarted {
        wallet: WalletId,
        currency: Currency,
        family: ProposalFamily,
        nonce: u64,
        stage: Decimal,
        target_balance: Decimal,
        expiration_height: Height,
        /// `None` for null proposals.
        challenged_hash: Option<RecordHash>,
        wallet_initiated: bool,
    },
    ProposalStopped {
        wallet: WalletId,
        currency: Currency,
        family: ProposalFamily,
        nonce: u64,
    },
    ProposalDisqualified {
        wallet: WalletId,
        currency: Currency,
        challenger: WalletId,
        candidate_hash: RecordHash,
        candidate_kind: RecordKind,
        reward: RewardOutcome,
        /// Challenger whose reward was reversed, if this superseded one.
        superseded_challenger: Option<WalletId>,
    },
    Settled {
        wallet: WalletId,
        currency: Currency,
        family: ProposalFamily,
        nonce: u64,
        staged: Decimal,
        fees_staged: Decimal,
        /// `None` for null settlements.
        settled_hash: Option<RecordHash>,
    },
    Seized {
        wallet: WalletId,
        currency: Currency,
        challenger: WalletId,
        amount: Decimal,
    },
    FraudDetected {
        rule: String,
        hashes: Vec<RecordHash>,
        reporter: WalletId,
        culprit: Option<WalletId>,
        reward: Option<RewardOutcome>,
    },
    ModeChanged {
        mode: OperationalMode,
        version: u64,
    },
}

impl EngineEvent {
    /// Stable short name, used as the log target suffix.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProposalStarted { .. } => "proposal_started",
            Self::ProposalStopped { .. } => "proposal_stopped",
            Self::ProposalDisqualified { .. } => "proposal_disqualified",
            Self::Settled { .. } => "settled",
            Self::Seized { .. } => "seized",
            Self::FraudDetected { .. } => "fraud_detected",
            Self::ModeChanged { .. } => "mode_changed",
        }
    }
}

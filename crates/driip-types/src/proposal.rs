//! # Settlement proposals
//!
//! A proposal is a wallet's claim to release (`stage`) part of its balance in
//! one currency. It is accepted unless contradicted before its
//! `expiration_height`.
//!
//! ## State Machine
//!
//! ```text
//!                 counter-evidence
//!   ┌───────────┐ ───────────────▶ ┌──────────────┐
//!   │ QUALIFIED │                  │ DISQUALIFIED │◀──┐ newer evidence
//!   └─────┬─────┘                  └──────┬───────┘───┘ (supersedes)
//!         │ settle / stop                 │ settle (seize)
//!         ▼                               ▼
//!   ┌────────────────────────────────────────┐
//!   │               TERMINATED               │
//!   └────────────────────────────────────────┘
//! ```
//!
//! Termination is irreversible. Status changes are only legal while the
//! proposal is live and unexpired.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, Height, RecordHash, RecordKind, RewardOutcome, WalletId};

/// Which initiator path created a proposal. Both families share one slot
/// per (wallet, currency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalFamily {
    /// Backed by a trade or payment.
    Driip,
    /// Backed by tracked balance history alone.
    Null,
}

impl std::fmt::Display for ProposalFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Driip => write!(f, "DRIIP"),
            Self::Null => write!(f, "NULL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    Qualified,
    Disqualified,
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Qualified => write!(f, "QUALIFIED"),
            Self::Disqualified => write!(f, "DISQUALIFIED"),
        }
    }
}

/// Who submitted an initiating or stopping call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Initiator {
    /// The proposal's own wallet.
    Wallet,
    /// An operator acting on the wallet's behalf.
    Proxy(WalletId),
}

impl Initiator {
    #[must_use]
    pub fn is_wallet(&self) -> bool {
        matches!(self, Self::Wallet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalAmounts {
    /// Signed net balance the claim reconciles to against tracked history.
    pub cumulative_transfer: Decimal,
    /// Amount to release now.
    pub stage: Decimal,
    /// Balance expected to remain after staging.
    pub target_balance: Decimal,
}

/// The driip a proposal was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengedRecord {
    pub hash: RecordHash,
    pub kind: RecordKind,
}

/// The most recent successful counter-evidence against a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disqualification {
    pub challenger: WalletId,
    pub height: Height,
    pub nonce: u64,
    pub candidate_hash: RecordHash,
    pub candidate_kind: RecordKind,
    /// What the challenger was granted; reversed if superseded.
    pub reward: RewardOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub wallet: WalletId,
    pub currency: Currency,
    pub nonce: u64,
    pub family: ProposalFamily,
    /// Height the claim is anchored to (driip height, or creation height for
    /// null proposals).
    pub reference_height: Height,
    /// Height at which the proposal was written.
    pub definition_height: Height,
    pub amounts: ProposalAmounts,
    /// `None` for null proposals.
    pub challenged: Option<ChallengedRecord>,
    pub wallet_initiated: bool,
    pub status: ProposalStatus,
    pub disqualification: Option<Disqualification>,
    pub expiration_height: Height,
    pub terminated: bool,
}

impl Proposal {
    /// Live means not terminated; an expired proposal is still live until
    /// settled or stopped.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.terminated
    }

    #[must_use]
    pub fn is_expired(&self, now: Height) -> bool {
        now >= self.expiration_height
    }

    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.status == ProposalStatus::Qualified
    }

    /// Nonce any new counter-evidence must reach: the proposal nonce, or the
    /// current disqualification nonce if higher.
    #[must_use]
    pub fn evidence_floor(&self) -> u64 {
        self.disqualification
            .as_ref()
            .map_or(self.nonce, |d| d.nonce.max(self.nonce))
    }

    /// Record a disqualification and return the one it supersedes.
    ///
    /// # Errors
    /// Returns `ProposalTerminated` if the proposal is no longer live.
    pub fn disqualify(
        &mut self,
        disqualification: Disqualification,
    ) -> crate::Result<Option<Disqualification>> {
        if self.terminated {
            return Err(crate::DriipError::ProposalTerminated {
                wallet: self.wallet,
                currency: self.currency.clone(),
            });
        }
        self.status = ProposalStatus::Disqualified;
        Ok(self.disqualification.replace(disqualification))
    }

    /// Mark terminated. Returns `false` if it already was.
    pub fn terminate(&mut self) -> bool {
        !std::mem::replace(&mut self.terminated, true)
    }
}

/// Proposal builder for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Proposal {
    pub fn dummy(wallet: WalletId, currency: Currency, nonce: u64, family: ProposalFamily) -> Self {
        Self {
            wallet,
            currency,
            nonce,
            family,
            reference_height: Height(1),
            definition_height: Height(1),
            amounts: ProposalAmounts {
                cumulative_transfer: Decimal::ZERO,
                stage: Decimal::ZERO,
                target_balance: Decimal::ZERO,
            },
            challenged: None,
            wallet_initiated: true,
            status: ProposalStatus::Qualified,
            disqualification: None,
            expiration_height: Height(100),
            terminated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_disqualification(nonce: u64) -> Disqualification {
        let challenger = WalletId::new();
        Disqualification {
            challenger,
            height: Height(5),
            nonce,
            candidate_hash: RecordHash([1; 32]),
            candidate_kind: RecordKind::Payment,
            reward: RewardOutcome::BondPayout {
                beneficiary: challenger,
                currency: Currency::fungible("ETH"),
                flat: Decimal::ONE,
                fractional: Decimal::ZERO,
            },
        }
    }

    #[test]
    fn expiry_is_inclusive_of_deadline() {
        let p = Proposal::dummy(WalletId::new(), Currency::fungible("ETH"), 1, ProposalFamily::Driip);
        assert!(!p.is_expired(Height(99)));
        assert!(p.is_expired(Height(100)));
    }

    #[test]
    fn disqualify_returns_superseded() {
        let mut p =
            Proposal::dummy(WalletId::new(), Currency::fungible("ETH"), 1, ProposalFamily::Driip);
        assert!(p.disqualify(make_disqualification(2)).unwrap().is_none());
        assert_eq!(p.status, ProposalStatus::Disqualified);
        let previous = p.disqualify(make_disqualification(3)).unwrap();
        assert_eq!(previous.map(|d| d.nonce), Some(2));
        assert_eq!(p.evidence_floor(), 3);
    }

    #[test]
    fn terminated_cannot_be_disqualified() {
        let mut p =
            Proposal::dummy(WalletId::new(), Currency::fungible("ETH"), 1, ProposalFamily::Null);
        assert!(p.terminate());
        assert!(!p.terminate(), "second terminate is a no-op");
        let err = p.disqualify(make_disqualification(2)).unwrap_err();
        assert!(matches!(err, crate::DriipError::ProposalTerminated { .. }));
    }

    #[test]
    fn evidence_floor_defaults_to_nonce() {
        let p = Proposal::dummy(WalletId::new(), Currency::fungible("ETH"), 7, ProposalFamily::Driip);
        assert_eq!(p.evidence_floor(), 7);
    }
}

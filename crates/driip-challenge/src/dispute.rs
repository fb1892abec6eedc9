//! Dispute engine: counter-evidence against live proposals.
//!
//! A candidate record (order, trade or payment) disqualifies a proposal when
//! it is genuine, at least as recent as anything already considered, and
//! attests a balance strictly below the proposal's target balance. The wallet
//! proposed to keep more than the evidence shows it held.
//!
//! Only the newest valid disqualification is rewarded: superseding evidence
//! first reverses the previous challenger's reward, then grants its own.

use driip_types::{
    ChallengeConfig, Collaborators, Currency, Disqualification, DriipError, EngineEvent, Evidence,
    Height, OperationalContext, Result, WalletId,
};
use tracing::{debug, info};

use crate::{RewardPolicy, SettlementState};

/// A challenger's submission against `wallet`'s proposal in `currency`.
#[derive(Debug, Clone)]
pub struct CounterEvidence {
    pub evidence: Evidence,
    pub wallet: WalletId,
    pub currency: Currency,
    pub challenger: WalletId,
}

impl CounterEvidence {
    #[must_use]
    pub fn new(
        evidence: impl Into<Evidence>,
        wallet: WalletId,
        currency: Currency,
        challenger: WalletId,
    ) -> Self {
        Self {
            evidence: evidence.into(),
            wallet,
            currency,
            challenger,
        }
    }
}

pub struct DisputeEngine {
    policy: RewardPolicy,
}

impl DisputeEngine {
    #[must_use]
    pub fn new(config: &ChallengeConfig) -> Self {
        Self {
            policy: RewardPolicy::from_config(config),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &RewardPolicy {
        &self.policy
    }

    /// Disqualify the proposal named by `candidate`.
    ///
    /// The reward is a lock of the attested amount on the wallet's own funds
    /// when they cover it, a bond payout otherwise. Bond exhaustion shrinks
    /// the payout but never fails the call.
    ///
    /// # Errors
    /// - `ExitMode` outside NORMAL
    /// - `NotGenuine`, `FraudulentRecord`, `OrderCancelled` for bad evidence
    /// - `SelfChallenge` if the challenger is the proposal's wallet
    /// - `ProposalNotFound`, `ProposalExpired`
    /// - `StaleEvidence` below the proposal or disqualification nonce
    /// - `DuplicateEvidence` for the challenged driip or the current candidate
    /// - `CurrencyMismatch` if the evidence says nothing about the pair
    /// - `EvidenceConsistent` if the attested balance reaches the target
    pub fn challenge_with(
        &self,
        ctx: &OperationalContext,
        state: &mut SettlementState,
        ports: &mut Collaborators<'_>,
        candidate: CounterEvidence,
        now: Height,
    ) -> Result<Disqualification> {
        let CounterEvidence {
            evidence,
            wallet,
            currency,
            challenger,
        } = candidate;
        let hash = evidence.hash();

        if !ctx.is_normal() {
            return Err(DriipError::ExitMode);
        }
        if !ports.validator.is_genuine_evidence(&evidence) {
            return Err(DriipError::NotGenuine {
                kind: evidence.kind(),
                hash,
            });
        }
        if ports.fraud_registry.is_fraudulent(&hash) {
            return Err(DriipError::FraudulentRecord(hash));
        }
        if let Some(order_hash) = evidence
            .order_hash(wallet)
            .filter(|h| ports.cancel_registry.is_cancelled(h))
        {
            return Err(DriipError::OrderCancelled(order_hash));
        }
        if challenger == wallet {
            return Err(DriipError::SelfChallenge(wallet));
        }

        let proposal = state.proposals.live_mut(wallet, &currency).ok_or_else(|| {
            DriipError::ProposalNotFound {
                wallet,
                currency: currency.clone(),
            }
        })?;
        if proposal.is_expired(now) {
            return Err(DriipError::ProposalExpired {
                wallet,
                currency,
                expiration: proposal.expiration_height,
            });
        }
        let floor = proposal.evidence_floor();
        if evidence.nonce() < floor {
            return Err(DriipError::StaleEvidence {
                nonce: evidence.nonce(),
                floor,
            });
        }
        let already_used = proposal.challenged.is_some_and(|c| c.hash == hash)
            || proposal
                .disqualification
                .as_ref()
                .is_some_and(|d| d.candidate_hash == hash);
        if already_used {
            return Err(DriipError::DuplicateEvidence(hash));
        }
        let target = proposal.amounts.target_balance;
        let attested = evidence
            .attested_balance(wallet, &currency)
            .ok_or_else(|| DriipError::CurrencyMismatch {
                wallet,
                currency: currency.clone(),
                hash,
            })?;
        if attested >= target {
            return Err(DriipError::EvidenceConsistent { attested, target });
        }

        // Effects. Nothing below can fail on a live proposal.
        let superseded = proposal.disqualification.clone();
        if let Some(previous) = &superseded {
            let reversed = self.policy.deprive(ports, &previous.reward);
            debug!(
                previous = %previous.challenger,
                %reversed,
                "superseded disqualification deprived"
            );
        }
        let reward = self
            .policy
            .reward(ports, Some(wallet), challenger, attested, &currency);
        let disqualification = Disqualification {
            challenger,
            height: now,
            nonce: evidence.nonce(),
            candidate_hash: hash,
            candidate_kind: evidence.kind(),
            reward: reward.clone(),
        };
        proposal.disqualify(disqualification.clone())?;

        info!(
            %wallet,
            %currency,
            %challenger,
            candidate = %hash.short(),
            kind = %evidence.kind(),
            %attested,
            %target,
            %reward,
            "proposal disqualified"
        );
        ports.events.emit(EngineEvent::ProposalDisqualified {
            wallet,
            currency,
            challenger,
            candidate_hash: hash,
            candidate_kind: evidence.kind(),
            reward,
            superseded_challenger: superseded.map(|d| d.challenger),
        });
        Ok(disqualification)
    }
}

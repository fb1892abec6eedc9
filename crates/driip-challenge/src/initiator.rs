//! Challenge initiator: opens settlement proposals.
//!
//! Two entry points share one slot per (wallet, currency):
//! - [`ChallengeInitiator::start_from_driip`] claims a stage amount backed by
//!   a trade or payment, one proposal per currency leg.
//! - [`ChallengeInitiator::start_from_absence`] (the null challenge) claims a
//!   stage amount backed by tracked balance history alone.
//!
//! ## Reconciliation
//!
//! ```text
//! B          = tracked balance at the reference height
//! correction = staged amount of the pair's last completion, if that
//!              completion happened after the reference height
//! remaining  = B - correction - stage
//! cumulative_transfer = target_balance = remaining
//! ```
//!
//! A completion at or before the reference height is already reflected in
//! `B` and must not be subtracted again.

use driip_types::{
    ChallengeConfig, ChallengedRecord, Collaborators, Completion, Currency, Driip, DriipError,
    EngineEvent, Height, Initiator, OperationalContext, Proposal, ProposalAmounts,
    ProposalFamily, ProposalStatus, Result, WalletId,
};
use rust_decimal::Decimal;
use tracing::info;

use crate::SettlementState;

/// A wallet's claim against a driip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriipClaim {
    pub wallet: WalletId,
    pub initiator: Initiator,
    /// Stage in the payment currency, or the trade's intended currency.
    pub intended_stage: Decimal,
    /// Stage in the trade's conjugate currency. Ignored for payments.
    pub conjugate_stage: Decimal,
}

impl DriipClaim {
    #[must_use]
    pub fn new(wallet: WalletId, stage: Decimal) -> Self {
        Self {
            wallet,
            initiator: Initiator::Wallet,
            intended_stage: stage,
            conjugate_stage: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn with_conjugate(mut self, stage: Decimal) -> Self {
        self.conjugate_stage = stage;
        self
    }

    #[must_use]
    pub fn by_proxy(mut self, operator: WalletId) -> Self {
        self.initiator = Initiator::Proxy(operator);
        self
    }

    fn stage_for(&self, leg_index: usize) -> Decimal {
        if leg_index == 0 {
            self.intended_stage
        } else {
            self.conjugate_stage
        }
    }
}

/// A wallet's claim without a backing driip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullClaim {
    pub wallet: WalletId,
    pub currency: Currency,
    pub stage: Decimal,
    pub initiator: Initiator,
}

impl NullClaim {
    #[must_use]
    pub fn new(wallet: WalletId, currency: Currency, stage: Decimal) -> Self {
        Self {
            wallet,
            currency,
            stage,
            initiator: Initiator::Wallet,
        }
    }

    #[must_use]
    pub fn by_proxy(mut self, operator: WalletId) -> Self {
        self.initiator = Initiator::Proxy(operator);
        self
    }
}

/// Compute proposal amounts from tracked history.
///
/// # Errors
/// - `InvalidStageAmount` if `stage` is not positive
/// - `InsufficientTrackedBalance` if the corrected balance cannot cover it
pub fn reconcile(
    tracked: Decimal,
    last_completion: Option<Completion>,
    reference_height: Height,
    stage: Decimal,
) -> Result<ProposalAmounts> {
    if stage <= Decimal::ZERO {
        return Err(DriipError::InvalidStageAmount(stage));
    }
    let correction = last_completion
        .filter(|c| c.height > reference_height)
        .map_or(Decimal::ZERO, |c| c.staged);
    let balance = tracked - correction;
    if stage > balance {
        return Err(DriipError::InsufficientTrackedBalance {
            needed: stage,
            available: balance,
        });
    }
    let remaining = balance - stage;
    Ok(ProposalAmounts {
        cumulative_transfer: remaining,
        stage,
        target_balance: remaining,
    })
}

pub struct ChallengeInitiator {
    config: ChallengeConfig,
}

impl ChallengeInitiator {
    #[must_use]
    pub fn new(config: &ChallengeConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ChallengeConfig {
        &self.config
    }

    fn authorize(&self, initiator: Initiator) -> Result<()> {
        match initiator {
            Initiator::Wallet => Ok(()),
            Initiator::Proxy(operator) if self.config.is_authorized_proxy(operator) => Ok(()),
            Initiator::Proxy(operator) => Err(DriipError::Unauthorized(operator)),
        }
    }

    /// Open one proposal per currency leg of `driip` with a positive stage.
    ///
    /// Every leg must be free and above its pair's `MaxNonce`, but legs whose
    /// stage is zero open no proposal. Nothing is written unless every leg
    /// passes its checks.
    ///
    /// # Errors
    /// - `Unauthorized` for an unlisted proxy
    /// - `ExitModeFrozen` in EXIT when the driip nonce exceeds the safe nonce
    /// - `NotGenuine`, `FraudulentRecord`, `NotParty`, `WalletLocked`
    /// - `BelowEarliestHeight` if the driip predates the earliest settlement height
    /// - `NonceNotIncreasing` if a leg's pair already settled this nonce or a later one
    /// - `ProposalConflict` if a leg's slot is occupied
    /// - `InvalidStageAmount`, `InsufficientTrackedBalance` from reconciliation
    pub fn start_from_driip(
        &self,
        ctx: &OperationalContext,
        state: &mut SettlementState,
        ports: &mut Collaborators<'_>,
        driip: &Driip,
        claim: DriipClaim,
        now: Height,
    ) -> Result<Vec<Proposal>> {
        let wallet = claim.wallet;
        let hash = driip.hash();
        let nonce = driip.nonce();
        self.authorize(claim.initiator)?;

        let safe_nonce = state.settlements.max_driip_nonce();
        if !ctx.admits(nonce, safe_nonce) {
            return Err(DriipError::ExitModeFrozen { nonce, safe_nonce });
        }
        if !ports.validator.is_genuine_driip(driip) {
            return Err(DriipError::NotGenuine {
                kind: driip.kind(),
                hash,
            });
        }
        if ports.fraud_registry.is_fraudulent(&hash) {
            return Err(DriipError::FraudulentRecord(hash));
        }
        if !ports.validator.is_party(wallet, driip) {
            return Err(DriipError::NotParty { wallet, hash });
        }
        if ports.fund_ledger.is_locked(wallet) {
            return Err(DriipError::WalletLocked(wallet));
        }
        let reference_height = driip.reference_height();
        if reference_height < self.config.earliest_settlement_height {
            return Err(DriipError::BelowEarliestHeight {
                height: reference_height,
                earliest: self.config.earliest_settlement_height,
            });
        }

        let mut planned = Vec::new();
        for (index, leg) in driip.legs(wallet).into_iter().enumerate() {
            let stage = claim.stage_for(index);
            if stage.is_sign_negative() {
                return Err(DriipError::InvalidStageAmount(stage));
            }
            let max_nonce = state.settlements.max_nonce(wallet, &leg.currency);
            if nonce <= max_nonce {
                return Err(DriipError::NonceNotIncreasing {
                    wallet,
                    currency: leg.currency,
                    nonce,
                    max_nonce,
                });
            }
            if let Some(holder) = state.proposals.holder(wallet, &leg.currency) {
                return Err(DriipError::ProposalConflict {
                    wallet,
                    currency: leg.currency,
                    holder,
                });
            }
            if stage.is_zero() {
                continue;
            }
            let amounts = reconcile(
                ports
                    .fund_ledger
                    .tracked_balance(wallet, &leg.currency, reference_height),
                state.settlements.last_completion(wallet, &leg.currency),
                reference_height,
                stage,
            )?;
            planned.push(Proposal {
                wallet,
                currency: leg.currency,
                nonce,
                family: ProposalFamily::Driip,
                reference_height,
                definition_height: now,
                amounts,
                challenged: Some(ChallengedRecord {
                    hash,
                    kind: driip.kind(),
                }),
                wallet_initiated: claim.initiator.is_wallet(),
                status: ProposalStatus::Qualified,
                disqualification: None,
                expiration_height: now.plus(self.config.challenge_timeout),
                terminated: false,
            });
        }
        if planned.is_empty() {
            return Err(DriipError::InvalidStageAmount(Decimal::ZERO));
        }

        for proposal in &planned {
            state.proposals.upsert(proposal.clone())?;
            Self::announce(ports, proposal);
        }
        Ok(planned)
    }

    /// Open a null proposal from tracked balance history alone.
    ///
    /// The nonce continues from the pair's highest settled nonce or the
    /// preceding proposal's nonce, whichever is higher. Null challenges stay
    /// open in EXIT mode: they are how funds leave a halted system.
    ///
    /// # Errors
    /// - `Unauthorized`, `WalletLocked`, `ProposalConflict`
    /// - `InvalidStageAmount`, `InsufficientTrackedBalance`
    pub fn start_from_absence(
        &self,
        state: &mut SettlementState,
        ports: &mut Collaborators<'_>,
        claim: NullClaim,
        now: Height,
    ) -> Result<Proposal> {
        let NullClaim {
            wallet,
            currency,
            stage,
            initiator,
        } = claim;
        self.authorize(initiator)?;
        if ports.fund_ledger.is_locked(wallet) {
            return Err(DriipError::WalletLocked(wallet));
        }
        if let Some(holder) = state.proposals.holder(wallet, &currency) {
            return Err(DriipError::ProposalConflict {
                wallet,
                currency,
                holder,
            });
        }

        let amounts = reconcile(
            ports.fund_ledger.tracked_balance(wallet, &currency, now),
            state.settlements.last_completion(wallet, &currency),
            now,
            stage,
        )?;
        let previous_nonce = state
            .proposals
            .last(wallet, &currency)
            .map_or(0, |p| p.nonce);
        let nonce = state
            .settlements
            .max_nonce(wallet, &currency)
            .max(previous_nonce)
            + 1;

        let proposal = Proposal {
            wallet,
            currency,
            nonce,
            family: ProposalFamily::Null,
            reference_height: now,
            definition_height: now,
            amounts,
            challenged: None,
            wallet_initiated: initiator.is_wallet(),
            status: ProposalStatus::Qualified,
            disqualification: None,
            expiration_height: now.plus(self.config.challenge_timeout),
            terminated: false,
        };
        state.proposals.upsert(proposal.clone())?;
        Self::announce(ports, &proposal);
        Ok(proposal)
    }

    /// Withdraw a live proposal before its window closes.
    ///
    /// # Errors
    /// - `Unauthorized` for an unlisted proxy
    /// - `ProposalNotFound` if the slot is empty
    /// - `ProposalExpired` once the window has closed
    /// - `ProposalDisqualified` if counter-evidence already landed
    pub fn stop_challenge(
        &self,
        state: &mut SettlementState,
        ports: &mut Collaborators<'_>,
        wallet: WalletId,
        currency: &Currency,
        caller: Initiator,
        now: Height,
    ) -> Result<Proposal> {
        self.authorize(caller)?;
        let proposal = state
            .proposals
            .live(wallet, currency)
            .ok_or_else(|| DriipError::ProposalNotFound {
                wallet,
                currency: currency.clone(),
            })?;
        if proposal.is_expired(now) {
            return Err(DriipError::ProposalExpired {
                wallet,
                currency: currency.clone(),
                expiration: proposal.expiration_height,
            });
        }
        if !proposal.is_qualified() {
            return Err(DriipError::ProposalDisqualified {
                wallet,
                currency: currency.clone(),
            });
        }

        let mut stopped = proposal.clone();
        state.proposals.terminate(wallet, currency);
        stopped.terminated = true;

        info!(%wallet, %currency, nonce = stopped.nonce, family = %stopped.family, "proposal stopped");
        ports.events.emit(EngineEvent::ProposalStopped {
            wallet,
            currency: currency.clone(),
            family: stopped.family,
            nonce: stopped.nonce,
        });
        Ok(stopped)
    }

    fn announce(ports: &mut Collaborators<'_>, proposal: &Proposal) {
        info!(
            wallet = %proposal.wallet,
            currency = %proposal.currency,
            nonce = proposal.nonce,
            family = %proposal.family,
            stage = %proposal.amounts.stage,
            target = %proposal.amounts.target_balance,
            expiration = %proposal.expiration_height,
            "proposal started"
        );
        ports.events.emit(EngineEvent::ProposalStarted {
            wallet: proposal.wallet,
            currency: proposal.currency.clone(),
            family: proposal.family,
            nonce: proposal.nonce,
            stage: proposal.amounts.stage,
            target_balance: proposal.amounts.target_balance,
            expiration_height: proposal.expiration_height,
            challenged_hash: proposal.challenged.map(|c| c.hash),
            wallet_initiated: proposal.wallet_initiated,
        });
    }
}

//! Settlement finalizer.
//!
//! Once a proposal's challenge window has elapsed, `settle` resolves it:
//! 1. Check the driip (genuine, not fraudulent, party, not a double spender)
//! 2. Check the operational mode admits the driip nonce
//! 3. Check the party has not completed settlement at its nonce
//! 4. Find the expired proposals this driip backs, one per currency leg
//! 5. Precheck that every release is fundable
//! 6. QUALIFIED legs: stage the amount and the owed fee delta, advance
//!    `MaxNonce`, record the completion. DISQUALIFIED legs: seize the
//!    challenger's locked reward and advance `MaxNonce` past the claim.
//! 7. Terminate the proposals and mark the party done
//!
//! Steps 1 to 5 write nothing, so a failed call changes no state.

use driip_challenge::{SeizureRecord, SettlementState};
use driip_types::{
    ChallengeConfig, Collaborators, Completion, Currency, Driip, DriipError, EngineEvent, Height,
    OperationalContext, Proposal, ProposalFamily, RecordHash, Result, WalletId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What settlement did with one currency leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegOutcome {
    /// Qualified: `amount` staged to the wallet, `fees` to the beneficiary.
    Staged {
        currency: Currency,
        amount: Decimal,
        fees: Decimal,
    },
    /// Disqualified: the challenger's locked reward moved to the challenger.
    Seized {
        currency: Currency,
        challenger: WalletId,
        amount: Decimal,
    },
}

impl LegOutcome {
    #[must_use]
    pub fn currency(&self) -> &Currency {
        match self {
            Self::Staged { currency, .. } | Self::Seized { currency, .. } => currency,
        }
    }

    #[must_use]
    pub fn is_staged(&self) -> bool {
        matches!(self, Self::Staged { .. })
    }
}

/// A validated leg, ready to apply.
enum Plan {
    Release { proposal: Proposal, fees: Decimal },
    Seize { proposal: Proposal, challenger: WalletId },
}

pub struct SettlementFinalizer {
    fee_beneficiary: WalletId,
}

impl SettlementFinalizer {
    #[must_use]
    pub fn new(config: &ChallengeConfig) -> Self {
        Self {
            fee_beneficiary: config.fee_beneficiary,
        }
    }

    /// Settle `wallet`'s side of `driip`.
    ///
    /// Returns one outcome per currency leg that had a proposal.
    ///
    /// # Errors
    /// - `NotGenuine`, `FraudulentRecord`, `NotParty`, `DoubleSpender`
    /// - `ExitModeFrozen` in EXIT beyond the safe nonce
    /// - `AlreadySettled` if the party already completed at its nonce
    /// - `ProposalNotFound` / `ProposalMismatch` if no leg's live proposal
    ///   was started from this driip
    /// - `ProposalNotExpired` while a window is still open
    /// - `NonceNotIncreasing`, `InsufficientFunds` for unfundable releases
    pub fn settle(
        &self,
        ctx: &OperationalContext,
        state: &mut SettlementState,
        ports: &mut Collaborators<'_>,
        driip: &Driip,
        wallet: WalletId,
        now: Height,
    ) -> Result<Vec<LegOutcome>> {
        let hash = driip.hash();
        let nonce = driip.nonce();

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
        if ports.fraud_registry.is_double_spender(wallet) {
            return Err(DriipError::DoubleSpender(wallet));
        }
        let safe_nonce = state.settlements.max_driip_nonce();
        if !ctx.admits(nonce, safe_nonce) {
            return Err(DriipError::ExitModeFrozen { nonce, safe_nonce });
        }

        let legs = driip.legs(wallet);
        if let Some(party_nonce) = legs.first().map(|leg| leg.party_nonce) {
            if state.settlements.is_done(wallet, party_nonce) {
                return Err(DriipError::AlreadySettled {
                    wallet,
                    nonce: party_nonce,
                });
            }
        }

        let mut plans = Vec::new();
        let mut mismatched = false;
        for leg in &legs {
            let Some(proposal) = state.proposals.live(wallet, &leg.currency) else {
                continue;
            };
            if proposal.challenged.map(|c| c.hash) != Some(hash) {
                mismatched = true;
                continue;
            }
            let fees = leg.fees.map_or(Decimal::ZERO, |f| {
                (f.total - state.settlements.fees_staged(wallet, &leg.currency)).max(Decimal::ZERO)
            });
            plans.push(self.plan(state, ports, proposal, fees, now)?);
        }
        if plans.is_empty() {
            let currency = legs
                .first()
                .map_or_else(|| Currency::fungible(""), |leg| leg.currency.clone());
            return Err(if mismatched {
                DriipError::ProposalMismatch {
                    wallet,
                    currency,
                    hash,
                }
            } else {
                DriipError::ProposalNotFound { wallet, currency }
            });
        }

        let outcomes = plans
            .into_iter()
            .map(|plan| self.apply(state, ports, plan, now))
            .collect::<Result<Vec<_>>>()?;

        if outcomes.iter().any(LegOutcome::is_staged) {
            state.settlements.complete(driip, wallet, now)?;
            state.settlements.advance_max_driip_nonce(nonce);
        }
        Ok(outcomes)
    }

    /// Settle `wallet`'s expired null proposal in `currency`.
    ///
    /// Stays available in EXIT mode.
    ///
    /// # Errors
    /// - `DoubleSpender`
    /// - `ProposalNotFound` if no null proposal is live for the pair
    /// - `ProposalNotExpired`, `NonceNotIncreasing`, `InsufficientFunds`
    pub fn settle_null(
        &self,
        state: &mut SettlementState,
        ports: &mut Collaborators<'_>,
        wallet: WalletId,
        currency: &Currency,
        now: Height,
    ) -> Result<LegOutcome> {
        if ports.fraud_registry.is_double_spender(wallet) {
            return Err(DriipError::DoubleSpender(wallet));
        }
        let proposal = state
            .proposals
            .live(wallet, currency)
            .filter(|p| p.family == ProposalFamily::Null)
            .ok_or_else(|| DriipError::ProposalNotFound {
                wallet,
                currency: currency.clone(),
            })?;
        let plan = self.plan(state, ports, proposal, Decimal::ZERO, now)?;
        self.apply(state, ports, plan, now)
    }

    /// Validate one proposal for settlement without writing anything.
    fn plan(
        &self,
        state: &SettlementState,
        ports: &Collaborators<'_>,
        proposal: &Proposal,
        fees: Decimal,
        now: Height,
    ) -> Result<Plan> {
        let wallet = proposal.wallet;
        let currency = &proposal.currency;
        if !proposal.is_expired(now) {
            return Err(DriipError::ProposalNotExpired {
                wallet,
                currency: currency.clone(),
                expiration: proposal.expiration_height,
            });
        }

        if let Some(disqualification) = &proposal.disqualification {
            return Ok(Plan::Seize {
                proposal: proposal.clone(),
                challenger: disqualification.challenger,
            });
        }

        let max_nonce = state.settlements.max_nonce(wallet, currency);
        if proposal.nonce <= max_nonce {
            return Err(DriipError::NonceNotIncreasing {
                wallet,
                currency: currency.clone(),
                nonce: proposal.nonce,
                max_nonce,
            });
        }
        let needed = proposal.amounts.stage + fees;
        let available = ports.fund_ledger.available(wallet, currency);
        if available < needed {
            return Err(DriipError::InsufficientFunds {
                wallet,
                currency: currency.clone(),
                needed,
                available,
            });
        }
        Ok(Plan::Release {
            proposal: proposal.clone(),
            fees,
        })
    }

    fn apply(
        &self,
        state: &mut SettlementState,
        ports: &mut Collaborators<'_>,
        plan: Plan,
        now: Height,
    ) -> Result<LegOutcome> {
        match plan {
            Plan::Release { proposal, fees } => self.release(state, ports, &proposal, fees, now),
            Plan::Seize {
                proposal,
                challenger,
            } => Ok(Self::seize(state, ports, &proposal, challenger, now)),
        }
    }

    fn release(
        &self,
        state: &mut SettlementState,
        ports: &mut Collaborators<'_>,
        proposal: &Proposal,
        fees: Decimal,
        now: Height,
    ) -> Result<LegOutcome> {
        let wallet = proposal.wallet;
        let currency = &proposal.currency;
        let amount = proposal.amounts.stage;

        // Funding was checked in `plan`.
        ports.fund_ledger.stage(wallet, amount, currency, now)?;
        if fees > Decimal::ZERO {
            ports
                .fund_ledger
                .stage_to_beneficiary(wallet, self.fee_beneficiary, fees, currency, now)?;
            state.settlements.add_fees_staged(wallet, currency, fees);
        }
        state
            .settlements
            .advance_max_nonce(wallet, currency, proposal.nonce);
        state.settlements.record_completion(
            wallet,
            currency,
            Completion {
                nonce: proposal.nonce,
                height: now,
                staged: amount + fees,
            },
        );
        state.proposals.terminate(wallet, currency);

        let settled_hash: Option<RecordHash> = proposal.challenged.map(|c| c.hash);
        info!(
            %wallet,
            %currency,
            nonce = proposal.nonce,
            family = %proposal.family,
            %amount,
            %fees,
            "proposal settled"
        );
        ports.events.emit(EngineEvent::Settled {
            wallet,
            currency: currency.clone(),
            family: proposal.family,
            nonce: proposal.nonce,
            staged: amount,
            fees_staged: fees,
            settled_hash,
        });
        Ok(LegOutcome::Staged {
            currency: currency.clone(),
            amount,
            fees,
        })
    }

    fn seize(
        state: &mut SettlementState,
        ports: &mut Collaborators<'_>,
        proposal: &Proposal,
        challenger: WalletId,
        now: Height,
    ) -> LegOutcome {
        let wallet = proposal.wallet;
        let currency = &proposal.currency;
        let amount = ports.fund_ledger.seize(wallet, challenger, currency, now);

        state.settlements.record_seizure(SeizureRecord {
            wallet,
            currency: currency.clone(),
            challenger,
            amount,
            proposal_nonce: proposal.nonce,
            challenged_hash: proposal.challenged.map(|c| c.hash),
            height: now,
        });
        // The disqualified nonce is consumed: the same claim cannot be proposed again.
        state
            .settlements
            .advance_max_nonce(wallet, currency, proposal.nonce);
        state.proposals.terminate(wallet, currency);

        warn!(%wallet, %currency, %challenger, %amount, nonce = proposal.nonce, "disqualified proposal seized");
        ports.events.emit(EngineEvent::Seized {
            wallet,
            currency: currency.clone(),
            challenger,
            amount,
        });
        LegOutcome::Seized {
            currency: currency.clone(),
            challenger,
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use driip_ledger::LedgerEnvironment;
    use driip_types::{FraudRegistry, Payment};

    use super::*;

    fn eth() -> Currency {
        Currency::fungible("ETH")
    }

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn finalizer() -> SettlementFinalizer {
        SettlementFinalizer::new(&ChallengeConfig::with_beneficiary(WalletId::new()))
    }

    fn null_proposal(state: &mut SettlementState, wallet: WalletId, stage: i64) {
        let mut proposal = Proposal::dummy(wallet, eth(), 1, ProposalFamily::Null);
        proposal.amounts.stage = dec(stage);
        state.proposals.upsert(proposal).unwrap();
    }

    #[test]
    fn null_settlement_stages_after_expiry() {
        let (mut env, _) = LedgerEnvironment::with_random_operator();
        let mut state = SettlementState::new();
        let wallet = WalletId::new();
        env.fund.deposit(wallet, dec(1_000), &eth(), Height(1));
        null_proposal(&mut state, wallet, 100);

        let err = finalizer()
            .settle_null(&mut state, &mut env.collaborators(), wallet, &eth(), Height(99))
            .unwrap_err();
        assert!(matches!(err, DriipError::ProposalNotExpired { .. }));

        let outcome = finalizer()
            .settle_null(&mut state, &mut env.collaborators(), wallet, &eth(), Height(100))
            .unwrap();
        assert_eq!(
            outcome,
            LegOutcome::Staged {
                currency: eth(),
                amount: dec(100),
                fees: Decimal::ZERO
            }
        );
        assert_eq!(env.fund.staged(wallet, &eth()), dec(100));
        assert_eq!(state.settlements.max_nonce(wallet, &eth()), 1);
        assert!(state.proposals.live(wallet, &eth()).is_none());
    }

    #[test]
    fn null_settlement_requires_funds() {
        let (mut env, _) = LedgerEnvironment::with_random_operator();
        let mut state = SettlementState::new();
        let wallet = WalletId::new();
        env.fund.deposit(wallet, dec(50), &eth(), Height(1));
        null_proposal(&mut state, wallet, 100);

        let err = finalizer()
            .settle_null(&mut state, &mut env.collaborators(), wallet, &eth(), Height(100))
            .unwrap_err();
        assert!(matches!(err, DriipError::InsufficientFunds { .. }));
        assert!(state.proposals.live(wallet, &eth()).is_some());
    }

    #[test]
    fn double_spender_cannot_settle() {
        let (mut env, _) = LedgerEnvironment::with_random_operator();
        let mut state = SettlementState::new();
        let wallet = WalletId::new();
        env.fraud_registry.add_double_spender(wallet);
        null_proposal(&mut state, wallet, 1);

        let err = finalizer()
            .settle_null(&mut state, &mut env.collaborators(), wallet, &eth(), Height(100))
            .unwrap_err();
        assert!(matches!(err, DriipError::DoubleSpender(_)));
    }

    #[test]
    fn unsealed_driip_rejected() {
        let (mut env, _) = LedgerEnvironment::with_random_operator();
        let mut state = SettlementState::new();
        let wallet = WalletId::new();
        let driip = Driip::from(Payment::dummy(wallet, WalletId::new(), eth(), dec(1), 3));

        let err = finalizer()
            .settle(
                &OperationalContext::new(),
                &mut state,
                &mut env.collaborators(),
                &driip,
                wallet,
                Height(100),
            )
            .unwrap_err();
        assert!(matches!(err, DriipError::NotGenuine { .. }));
    }
}

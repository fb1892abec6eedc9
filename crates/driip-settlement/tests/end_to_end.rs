//! End-to-end tests across initiation, disputes, fraud and finality.
//!
//! Each test drives the engine the way a ledger would: one serialized
//! operation at a time against a shared state, with heights supplied by the
//! caller.

use driip_challenge::{
    ChallengeInitiator, CounterEvidence, DisputeEngine, DriipClaim, NullClaim, SettlementState,
};
use driip_fraud::FraudDetector;
use driip_ledger::{LedgerEnvironment, OperatorSealer};
use driip_settlement::{LegOutcome, SettlementFinalizer};
use driip_types::{
    BalanceTransition, ChallengeConfig, Currency, Driip, DriipError, Fees, Height,
    OperationalContext, Payment, Result, Trade, WalletId,
};
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn eth() -> Currency {
    Currency::fungible("ETH")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Helper: the whole engine over one in-memory ledger.
struct World {
    env: LedgerEnvironment,
    sealer: OperatorSealer,
    state: SettlementState,
    ctx: OperationalContext,
    initiator: ChallengeInitiator,
    disputes: DisputeEngine,
    finalizer: SettlementFinalizer,
    detector: FraudDetector,
    beneficiary: WalletId,
}

impl World {
    fn new() -> Self {
        init_tracing();
        let (env, sealer) = LedgerEnvironment::with_random_operator();
        let beneficiary = WalletId::new();
        let mut config = ChallengeConfig::with_beneficiary(beneficiary);
        config.challenge_timeout = 10;
        Self {
            env,
            sealer,
            state: SettlementState::new(),
            ctx: OperationalContext::new(),
            initiator: ChallengeInitiator::new(&config),
            disputes: DisputeEngine::new(&config),
            finalizer: SettlementFinalizer::new(&config),
            detector: FraudDetector::new(&config),
            beneficiary,
        }
    }

    /// A sealed payment from `sender` with the given global nonce, sender
    /// party nonce, anchor height and cumulative sender fee.
    fn payment(&self, sender: WalletId, nonce: u64, party_nonce: u64, height: u64, fee_total: i64) -> Payment {
        let mut payment = Payment::dummy(sender, WalletId::new(), eth(), dec(1), nonce);
        payment.sender.nonce = party_nonce;
        payment.sender.fees = Fees::new(dec(fee_total), dec(fee_total));
        payment.block_height = Height(height);
        self.sealer.seal_payment(&mut payment);
        payment
    }

    fn start(&mut self, driip: &Driip, wallet: WalletId, stage: i64, now: u64) -> Result<()> {
        self.initiator
            .start_from_driip(
                &self.ctx,
                &mut self.state,
                &mut self.env.collaborators(),
                driip,
                DriipClaim::new(wallet, dec(stage)),
                Height(now),
            )
            .map(|_| ())
    }

    fn settle(&mut self, driip: &Driip, wallet: WalletId, now: u64) -> Result<Vec<LegOutcome>> {
        self.finalizer.settle(
            &self.ctx,
            &mut self.state,
            &mut self.env.collaborators(),
            driip,
            wallet,
            Height(now),
        )
    }
}

// =============================================================================
// Qualified settlement
// =============================================================================
#[test]
fn unchallenged_proposal_settles_one_side() {
    let mut w = World::new();
    let wallet = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));
    let payment = w.payment(wallet, 5, 3, 5, 0);
    let recipient = payment.recipient.wallet;
    let driip = Driip::from(payment);

    w.start(&driip, wallet, 100, 6).unwrap();

    let err = w.settle(&driip, wallet, 15).unwrap_err();
    assert!(matches!(err, DriipError::ProposalNotExpired { .. }));

    let outcomes = w.settle(&driip, wallet, 16).unwrap();
    assert_eq!(
        outcomes,
        vec![LegOutcome::Staged {
            currency: eth(),
            amount: dec(100),
            fees: Decimal::ZERO,
        }]
    );
    assert_eq!(w.env.fund.staged(wallet, &eth()), dec(100));
    assert_eq!(w.env.fund.deposited(wallet, &eth()), dec(9_900));

    let settlement = w.state.settlements.settlement(&driip.hash()).unwrap();
    assert!(settlement.origin.done);
    assert_eq!(settlement.origin.done_height, Some(Height(16)));
    assert!(!settlement.target.done, "counterpart settles independently");
    assert!(w.state.settlements.is_done(wallet, 3));
    assert!(!w.state.settlements.is_done(recipient, 1));

    assert_eq!(w.state.settlements.max_nonce(wallet, &eth()), 5);
    assert_eq!(w.state.settlements.max_driip_nonce(), 5);
    assert!(w.state.proposals.live(wallet, &eth()).is_none());
    assert_eq!(w.env.events.count("settled"), 1);
}

#[test]
fn second_settle_for_same_party_fails() {
    let mut w = World::new();
    let wallet = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));
    let driip = Driip::from(w.payment(wallet, 5, 3, 5, 0));
    w.start(&driip, wallet, 100, 6).unwrap();
    w.settle(&driip, wallet, 16).unwrap();

    let err = w.settle(&driip, wallet, 17).unwrap_err();
    assert!(matches!(err, DriipError::AlreadySettled { nonce: 3, .. }));
    assert_eq!(w.env.fund.staged(wallet, &eth()), dec(100));
}

#[test]
fn max_nonce_blocks_older_driips() {
    let mut w = World::new();
    let wallet = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));
    let newer = Driip::from(w.payment(wallet, 5, 3, 5, 0));
    w.start(&newer, wallet, 100, 6).unwrap();
    w.settle(&newer, wallet, 16).unwrap();

    let older = Driip::from(w.payment(wallet, 4, 2, 4, 0));
    let err = w.start(&older, wallet, 10, 17).unwrap_err();
    assert!(matches!(err, DriipError::NonceNotIncreasing { nonce: 4, max_nonce: 5, .. }));
    assert_eq!(w.state.settlements.max_nonce(wallet, &eth()), 5);
}

#[test]
fn fees_stage_only_the_unpaid_delta() {
    let mut w = World::new();
    let wallet = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));

    let first = Driip::from(w.payment(wallet, 5, 3, 5, 5));
    w.start(&first, wallet, 100, 6).unwrap();
    let outcomes = w.settle(&first, wallet, 16).unwrap();
    assert!(matches!(&outcomes[0], LegOutcome::Staged { fees, .. } if *fees == dec(5)));

    let second = Driip::from(w.payment(wallet, 6, 4, 20, 8));
    w.start(&second, wallet, 100, 21).unwrap();
    let outcomes = w.settle(&second, wallet, 31).unwrap();
    assert!(matches!(&outcomes[0], LegOutcome::Staged { fees, .. } if *fees == dec(3)));

    assert_eq!(w.env.fund.staged(w.beneficiary, &eth()), dec(8));
    assert_eq!(w.state.settlements.fees_staged(wallet, &eth()), dec(8));
}

#[test]
fn settled_driip_must_match_the_proposal() {
    let mut w = World::new();
    let wallet = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));
    let proposed = Driip::from(w.payment(wallet, 5, 3, 5, 0));
    let other = Driip::from(w.payment(wallet, 6, 4, 5, 0));
    w.start(&proposed, wallet, 100, 6).unwrap();

    let err = w.settle(&other, wallet, 16).unwrap_err();
    assert!(matches!(err, DriipError::ProposalMismatch { .. }));

    let stranger = WalletId::new();
    let unproposed = Driip::from(w.payment(stranger, 7, 1, 5, 0));
    let err = w.settle(&unproposed, stranger, 16).unwrap_err();
    assert!(matches!(err, DriipError::ProposalNotFound { .. }));
}

#[test]
fn trade_settles_both_currency_legs() {
    let mut w = World::new();
    let wallet = WalletId::new();
    let dai = Currency::fungible("DAI");
    w.env.fund.deposit(wallet, dec(1_000), &eth(), Height(1));
    w.env.fund.deposit(wallet, dec(1_000), &dai, Height(1));

    let mut trade = Trade::dummy(wallet, WalletId::new(), eth(), dai.clone(), 9);
    trade.block_height = Height(2);
    w.sealer.seal_trade(&mut trade);
    let driip = Driip::from(trade);

    w.initiator
        .start_from_driip(
            &w.ctx,
            &mut w.state,
            &mut w.env.collaborators(),
            &driip,
            DriipClaim::new(wallet, dec(10)).with_conjugate(dec(20)),
            Height(3),
        )
        .unwrap();
    let outcomes = w.settle(&driip, wallet, 13).unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(w.env.fund.staged(wallet, &eth()), dec(10));
    assert_eq!(w.env.fund.staged(wallet, &dai), dec(20));
    assert_eq!(w.state.settlements.max_nonce(wallet, &dai), 9);
}

// =============================================================================
// Disputes and seizure
// =============================================================================
#[test]
fn scenario_disqualified_proposal_is_seized() {
    let mut w = World::new();
    let wallet = WalletId::new();
    let challenger = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));
    let supply = w.env.fund.total_supply(&eth());

    let driip = Driip::from(w.payment(wallet, 5, 3, 5, 0));
    w.start(&driip, wallet, 100, 6).unwrap();
    assert_eq!(
        w.state.proposals.live(wallet, &eth()).unwrap().amounts.target_balance,
        dec(9_900)
    );

    let mut evidence = Trade::dummy(wallet, WalletId::new(), eth(), Currency::fungible("DAI"), 6);
    evidence.buyer.intended = BalanceTransition::new(dec(600), dec(500));
    w.sealer.seal_trade(&mut evidence);
    w.disputes
        .challenge_with(
            &w.ctx,
            &mut w.state,
            &mut w.env.collaborators(),
            CounterEvidence::new(evidence, wallet, eth(), challenger),
            Height(8),
        )
        .unwrap();
    assert_eq!(w.env.fund.locked_by(wallet, challenger, &eth()), dec(500));

    let outcomes = w.settle(&driip, wallet, 16).unwrap();
    assert_eq!(
        outcomes,
        vec![LegOutcome::Seized {
            currency: eth(),
            challenger,
            amount: dec(500),
        }]
    );
    assert_eq!(w.env.fund.staged(challenger, &eth()), dec(500));
    assert_eq!(w.env.fund.staged(wallet, &eth()), Decimal::ZERO);
    assert_eq!(w.state.settlements.seizures().len(), 1);
    assert!(!w.state.settlements.is_done(wallet, 3));
    assert!(w.state.proposals.live(wallet, &eth()).is_none());
    assert_eq!(w.env.fund.total_supply(&eth()), supply);
}

#[test]
fn seized_driip_cannot_be_proposed_again() {
    let mut w = World::new();
    let wallet = WalletId::new();
    let challenger = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));
    let driip = Driip::from(w.payment(wallet, 5, 3, 5, 0));
    w.start(&driip, wallet, 100, 6).unwrap();

    let mut evidence = Trade::dummy(wallet, WalletId::new(), eth(), Currency::fungible("DAI"), 6);
    evidence.buyer.intended = BalanceTransition::new(dec(600), dec(500));
    w.sealer.seal_trade(&mut evidence);
    w.disputes
        .challenge_with(
            &w.ctx,
            &mut w.state,
            &mut w.env.collaborators(),
            CounterEvidence::new(evidence, wallet, eth(), challenger),
            Height(8),
        )
        .unwrap();
    let outcomes = w.settle(&driip, wallet, 16).unwrap();
    assert!(!outcomes[0].is_staged());
    assert_eq!(w.state.settlements.max_nonce(wallet, &eth()), 5);

    // The lock is gone, but the claim is spent.
    let err = w.start(&driip, wallet, 100, 17).unwrap_err();
    assert!(matches!(err, DriipError::NonceNotIncreasing { nonce: 5, max_nonce: 5, .. }));
    let err = w.settle(&driip, wallet, 30).unwrap_err();
    assert!(matches!(err, DriipError::ProposalNotFound { .. }));
    assert_eq!(w.env.fund.staged(wallet, &eth()), Decimal::ZERO);
}

// =============================================================================
// Causal rebalance
// =============================================================================
#[test]
fn completion_after_anchor_is_subtracted_once() {
    let mut w = World::new();
    let wallet = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));

    let first = Driip::from(w.payment(wallet, 5, 3, 5, 0));
    w.start(&first, wallet, 100, 6).unwrap();
    w.settle(&first, wallet, 20).unwrap();

    // Anchored before the completion: history still shows 10,000.
    let stale_anchor = Driip::from(w.payment(wallet, 6, 4, 10, 0));
    w.start(&stale_anchor, wallet, 50, 21).unwrap();
    assert_eq!(
        w.state.proposals.live(wallet, &eth()).unwrap().amounts.target_balance,
        dec(9_850)
    );
    w.initiator
        .stop_challenge(
            &mut w.state,
            &mut w.env.collaborators(),
            wallet,
            &eth(),
            driip_types::Initiator::Wallet,
            Height(22),
        )
        .unwrap();

    // Anchored after the completion: already reflected, no correction.
    let fresh_anchor = Driip::from(w.payment(wallet, 7, 5, 25, 0));
    w.start(&fresh_anchor, wallet, 50, 26).unwrap();
    assert_eq!(
        w.state.proposals.live(wallet, &eth()).unwrap().amounts.target_balance,
        dec(9_850)
    );
}

// =============================================================================
// Fraud and EXIT mode
// =============================================================================
#[test]
fn scenario_fraud_freezes_newer_claims() {
    let mut w = World::new();
    let wallet = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));
    w.env.bond.fund(dec(1_000), &eth());

    let settled = Driip::from(w.payment(wallet, 5, 3, 5, 0));
    w.start(&settled, wallet, 100, 6).unwrap();
    let in_flight = Driip::from(w.payment(wallet, 6, 4, 5, 0));
    w.settle(&settled, wallet, 16).unwrap();
    w.start(&in_flight, wallet, 100, 17).unwrap();

    let a = w.payment(WalletId::new(), 7, 1, 5, 0);
    let b = w.payment(WalletId::new(), 7, 1, 5, 0);
    let reporter = WalletId::new();
    w.detector
        .challenge_duplicate_payment_nonce(&mut w.ctx, &mut w.env.collaborators(), &a, &b, reporter)
        .unwrap();
    assert!(w.ctx.is_exit());

    let err = w.settle(&in_flight, wallet, 27).unwrap_err();
    assert!(matches!(err, DriipError::ExitModeFrozen { nonce: 6, safe_nonce: 5 }));

    let newer = Driip::from(w.payment(wallet, 8, 5, 5, 0));
    let err = w.start(&newer, wallet, 1, 27).unwrap_err();
    assert!(matches!(err, DriipError::ExitModeFrozen { .. }));

    // Null challenges remain the way out.
    let other = WalletId::new();
    w.env.fund.deposit(other, dec(300), &eth(), Height(1));
    w.initiator
        .start_from_absence(
            &mut w.state,
            &mut w.env.collaborators(),
            NullClaim::new(other, eth(), dec(300)),
            Height(27),
        )
        .unwrap();
    let outcome = w
        .finalizer
        .settle_null(&mut w.state, &mut w.env.collaborators(), other, &eth(), Height(37))
        .unwrap();
    assert!(outcome.is_staged());
    assert_eq!(w.env.fund.staged(other, &eth()), dec(300));
}

#[test]
fn exit_mode_honors_claims_up_to_safe_nonce() {
    let mut w = World::new();
    let sender = WalletId::new();
    w.env.fund.deposit(sender, dec(10_000), &eth(), Height(1));
    w.env.bond.fund(dec(1_000), &eth());

    let payment = w.payment(sender, 5, 3, 5, 0);
    let recipient = payment.recipient.wallet;
    w.env.fund.deposit(recipient, dec(1_000), &eth(), Height(1));
    let driip = Driip::from(payment);
    w.start(&driip, sender, 100, 6).unwrap();
    w.settle(&driip, sender, 16).unwrap();
    assert_eq!(w.state.settlements.max_driip_nonce(), 5);

    let a = w.payment(WalletId::new(), 9, 1, 5, 0);
    let b = w.payment(WalletId::new(), 9, 1, 5, 0);
    w.detector
        .challenge_duplicate_payment_nonce(&mut w.ctx, &mut w.env.collaborators(), &a, &b, WalletId::new())
        .unwrap();
    assert!(w.ctx.is_exit());

    // Nonce 5 is at the safe nonce: the counterpart can still claim and settle.
    w.start(&driip, recipient, 40, 17).unwrap();
    assert_eq!(
        w.state.proposals.live(recipient, &eth()).unwrap().amounts.target_balance,
        dec(960)
    );
    let outcomes = w.settle(&driip, recipient, 27).unwrap();
    assert_eq!(
        outcomes,
        vec![LegOutcome::Staged {
            currency: eth(),
            amount: dec(40),
            fees: Decimal::ZERO,
        }]
    );
    assert_eq!(w.env.fund.staged(recipient, &eth()), dec(40));

    let settlement = w.state.settlements.settlement(&driip.hash()).unwrap();
    assert!(settlement.origin.done);
    assert!(settlement.target.done);
    assert_eq!(settlement.target.done_height, Some(Height(27)));
}

#[test]
fn fraud_flagged_wallet_cannot_settle() {
    let mut w = World::new();
    let wallet = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));
    let driip = Driip::from(w.payment(wallet, 5, 3, 5, 0));
    w.start(&driip, wallet, 100, 6).unwrap();

    let mut first = w.payment(wallet, 1, 1, 1, 0);
    first.sender.balance = BalanceTransition::new(dec(10), dec(9));
    w.sealer.seal_payment(&mut first);
    let mut second = w.payment(wallet, 2, 2, 1, 0);
    second.sender.balance = BalanceTransition::new(dec(3), dec(2));
    w.sealer.seal_payment(&mut second);
    w.detector
        .challenge_successive_payments(
            &mut w.ctx,
            &mut w.env.collaborators(),
            &first,
            &second,
            wallet,
            WalletId::new(),
        )
        .unwrap();

    let err = w.settle(&driip, wallet, 16).unwrap_err();
    assert!(matches!(err, DriipError::DoubleSpender(_)));
}

#[test]
fn engine_events_serialize_for_audit() {
    let mut w = World::new();
    let wallet = WalletId::new();
    w.env.fund.deposit(wallet, dec(10_000), &eth(), Height(1));
    let driip = Driip::from(w.payment(wallet, 5, 3, 5, 0));
    w.start(&driip, wallet, 100, 6).unwrap();
    w.settle(&driip, wallet, 16).unwrap();

    let lines = w.env.events.to_json_lines().unwrap();
    let events: Vec<serde_json::Value> = lines
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1]["event"]["event"], "settled");
}

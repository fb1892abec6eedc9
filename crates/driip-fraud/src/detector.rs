//! Fraud detector: provable inconsistencies between sealed records.
//!
//! Every rule is stateless per call. A positive finding:
//! 1. registers the offending hash(es) in the fraud registry
//! 2. halts the system (NORMAL → EXIT), once
//! 3. flags the culpable wallet as a double spender, for wallet rules
//! 4. rewards the reporter through the shared [`RewardPolicy`]
//!
//! Wallet rules (successive records) can lock the wallet's own funds.
//! Operator rules (duplicate nonce, broken seals) are paid from the bond.

use driip_challenge::RewardPolicy;
use driip_types::{
    ChallengeConfig, Collaborators, Currency, DriipError, EngineEvent, OperationalContext, Order,
    Payment, RecordHash, RecordKind, Result, RewardOutcome, Trade, WalletId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FraudRule {
    /// Two distinct payments carry the same operator nonce.
    DuplicatePaymentNonce,
    /// A wallet's consecutive payments do not chain balance or fees.
    SuccessivePayments,
    /// A wallet's consecutive trades do not chain balance or fees.
    SuccessiveTrades,
    /// An operator-sealed order whose wallet hash does not match.
    OrderSeal,
    /// An operator-sealed payment whose wallet hash does not match.
    PaymentSeal,
}

impl std::fmt::Display for FraudRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicatePaymentNonce => write!(f, "DUPLICATE_PAYMENT_NONCE"),
            Self::SuccessivePayments => write!(f, "SUCCESSIVE_PAYMENTS"),
            Self::SuccessiveTrades => write!(f, "SUCCESSIVE_TRADES"),
            Self::OrderSeal => write!(f, "ORDER_SEAL"),
            Self::PaymentSeal => write!(f, "PAYMENT_SEAL"),
        }
    }
}

/// A proven fraud and what the reporter received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudFinding {
    pub rule: FraudRule,
    pub hashes: Vec<RecordHash>,
    /// `None` when the operator is at fault.
    pub culprit: Option<WalletId>,
    pub reward: RewardOutcome,
}

struct Conviction {
    rule: FraudRule,
    offenders: Vec<(RecordHash, RecordKind)>,
    culprit: Option<WalletId>,
    /// Amount a lock on the culprit's funds would take.
    amount: Decimal,
    currency: Currency,
}

fn no_fraud(reason: impl Into<String>) -> DriipError {
    DriipError::NoFraudProven {
        reason: reason.into(),
    }
}

pub struct FraudDetector {
    policy: RewardPolicy,
}

impl FraudDetector {
    #[must_use]
    pub fn new(config: &ChallengeConfig) -> Self {
        Self {
            policy: RewardPolicy::from_config(config),
        }
    }

    /// Two payments sharing an operator nonce.
    ///
    /// Payments with the same wallet hash are the same wallet-signed payment
    /// sealed twice and prove nothing.
    pub fn challenge_duplicate_payment_nonce(
        &self,
        ctx: &mut OperationalContext,
        ports: &mut Collaborators<'_>,
        first: &Payment,
        second: &Payment,
        reporter: WalletId,
    ) -> Result<FraudFinding> {
        require_genuine_payment(ports, first)?;
        require_genuine_payment(ports, second)?;
        if first.hash() == second.hash() {
            return Err(no_fraud("same payment submitted twice"));
        }
        if first.nonce != second.nonce {
            return Err(no_fraud(format!(
                "nonces differ: {} vs {}",
                first.nonce, second.nonce
            )));
        }
        if first.seals.wallet.hash == second.seals.wallet.hash {
            return Err(no_fraud("payments share a wallet hash"));
        }

        self.convict(
            ctx,
            ports,
            Conviction {
                rule: FraudRule::DuplicatePaymentNonce,
                offenders: vec![
                    (first.hash(), RecordKind::Payment),
                    (second.hash(), RecordKind::Payment),
                ],
                culprit: None,
                amount: Decimal::ZERO,
                currency: first.currency.clone(),
            },
            reporter,
        )
    }

    /// `second` must continue `first` for `wallet`.
    pub fn challenge_successive_payments(
        &self,
        ctx: &mut OperationalContext,
        ports: &mut Collaborators<'_>,
        first: &Payment,
        second: &Payment,
        wallet: WalletId,
        reporter: WalletId,
    ) -> Result<FraudFinding> {
        require_genuine_payment(ports, first)?;
        require_genuine_payment(ports, second)?;
        let (Some(a), Some(b)) = (first.party(wallet), second.party(wallet)) else {
            let hash = if first.is_party(wallet) {
                second.hash()
            } else {
                first.hash()
            };
            return Err(DriipError::NotParty { wallet, hash });
        };
        if first.currency != second.currency {
            return Err(DriipError::CurrencyMismatch {
                wallet,
                currency: first.currency.clone(),
                hash: second.hash(),
            });
        }
        if b.nonce != a.nonce + 1 {
            return Err(DriipError::NotSuccessive {
                first: a.nonce,
                second: b.nonce,
            });
        }
        if ports
            .validator
            .successive_payments_consistent(wallet, first, second)
        {
            return Err(no_fraud("successive payments are consistent"));
        }

        self.convict(
            ctx,
            ports,
            Conviction {
                rule: FraudRule::SuccessivePayments,
                offenders: vec![(second.hash(), RecordKind::Payment)],
                culprit: Some(wallet),
                amount: b.balance.current,
                currency: second.currency.clone(),
            },
            reporter,
        )
    }

    /// `second` must continue `first` for `wallet` in `currency`.
    #[allow(clippy::too_many_arguments)]
    pub fn challenge_successive_trades(
        &self,
        ctx: &mut OperationalContext,
        ports: &mut Collaborators<'_>,
        first: &Trade,
        second: &Trade,
        wallet: WalletId,
        currency: &Currency,
        reporter: WalletId,
    ) -> Result<FraudFinding> {
        for trade in [first, second] {
            if !ports.validator.is_genuine_trade(trade) {
                return Err(DriipError::NotGenuine {
                    kind: RecordKind::Trade,
                    hash: trade.hash(),
                });
            }
        }
        let leg_of = |trade: &Trade| {
            trade
                .legs(wallet)
                .into_iter()
                .find(|leg| &leg.currency == currency)
        };
        let (Some(a), Some(b)) = (leg_of(first), leg_of(second)) else {
            let offending = if leg_of(first).is_none() { first } else { second };
            return Err(if offending.is_party(wallet) {
                DriipError::CurrencyMismatch {
                    wallet,
                    currency: currency.clone(),
                    hash: offending.hash(),
                }
            } else {
                DriipError::NotParty {
                    wallet,
                    hash: offending.hash(),
                }
            });
        };
        if b.party_nonce != a.party_nonce + 1 {
            return Err(DriipError::NotSuccessive {
                first: a.party_nonce,
                second: b.party_nonce,
            });
        }
        if ports
            .validator
            .successive_trades_consistent(wallet, currency, first, second)
        {
            return Err(no_fraud("successive trades are consistent"));
        }

        self.convict(
            ctx,
            ports,
            Conviction {
                rule: FraudRule::SuccessiveTrades,
                offenders: vec![(second.hash(), RecordKind::Trade)],
                culprit: Some(wallet),
                amount: b.balance.current,
                currency: currency.clone(),
            },
            reporter,
        )
    }

    /// An order the operator sealed although its wallet hash is wrong.
    pub fn challenge_order_seal(
        &self,
        ctx: &mut OperationalContext,
        ports: &mut Collaborators<'_>,
        order: &Order,
        reporter: WalletId,
    ) -> Result<FraudFinding> {
        if !ports.validator.is_genuine_order_operator_seal(order) {
            return Err(DriipError::NotGenuine {
                kind: RecordKind::Order,
                hash: order.hash(),
            });
        }
        if ports.validator.is_genuine_order_wallet_seal(order) {
            return Err(no_fraud("order seals agree"));
        }
        self.convict(
            ctx,
            ports,
            Conviction {
                rule: FraudRule::OrderSeal,
                offenders: vec![(order.hash(), RecordKind::Order)],
                culprit: None,
                amount: Decimal::ZERO,
                currency: order.placement.currency.clone(),
            },
            reporter,
        )
    }

    /// A payment the operator sealed although its wallet hash is wrong.
    pub fn challenge_payment_seal(
        &self,
        ctx: &mut OperationalContext,
        ports: &mut Collaborators<'_>,
        payment: &Payment,
        reporter: WalletId,
    ) -> Result<FraudFinding> {
        if !ports.validator.is_genuine_payment_operator_seal(payment) {
            return Err(DriipError::NotGenuine {
                kind: RecordKind::Payment,
                hash: payment.hash(),
            });
        }
        if ports.validator.is_genuine_payment_wallet_seal(payment) {
            return Err(no_fraud("payment seals agree"));
        }
        self.convict(
            ctx,
            ports,
            Conviction {
                rule: FraudRule::PaymentSeal,
                offenders: vec![(payment.hash(), RecordKind::Payment)],
                culprit: None,
                amount: Decimal::ZERO,
                currency: payment.currency.clone(),
            },
            reporter,
        )
    }

    fn convict(
        &self,
        ctx: &mut OperationalContext,
        ports: &mut Collaborators<'_>,
        conviction: Conviction,
        reporter: WalletId,
    ) -> Result<FraudFinding> {
        let Conviction {
            rule,
            offenders,
            culprit,
            amount,
            currency,
        } = conviction;
        let reported = offenders
            .iter()
            .all(|(hash, _)| ports.fraud_registry.is_fraudulent(hash));
        if let Some((hash, _)) = offenders.first().filter(|_| reported) {
            return Err(DriipError::FraudAlreadyReported(*hash));
        }

        let mut hashes = Vec::with_capacity(offenders.len());
        for (hash, kind) in offenders {
            ports.fraud_registry.register(hash, kind);
            hashes.push(hash);
        }

        if let Some(wallet) = culprit {
            ports.fraud_registry.add_double_spender(wallet);
        }
        if ctx.halt() {
            warn!(version = ctx.version(), %rule, "operational mode changed to EXIT");
            ports.events.emit(EngineEvent::ModeChanged {
                mode: ctx.mode(),
                version: ctx.version(),
            });
        }

        let reward = self
            .policy
            .reward(ports, culprit, reporter, amount, &currency);
        warn!(
            %rule,
            %reporter,
            culprit = ?culprit,
            hashes = ?hashes.iter().map(RecordHash::short).collect::<Vec<_>>(),
            "fraud detected"
        );
        info!(%reporter, %reward, "fraud reporter rewarded");
        ports.events.emit(EngineEvent::FraudDetected {
            rule: rule.to_string(),
            hashes: hashes.clone(),
            reporter,
            culprit,
            reward: Some(reward.clone()),
        });
        Ok(FraudFinding {
            rule,
            hashes,
            culprit,
            reward,
        })
    }
}

fn require_genuine_payment(ports: &Collaborators<'_>, payment: &Payment) -> Result<()> {
    if ports.validator.is_genuine_payment(payment) {
        Ok(())
    } else {
        Err(DriipError::NotGenuine {
            kind: RecordKind::Payment,
            hash: payment.hash(),
        })
    }
}

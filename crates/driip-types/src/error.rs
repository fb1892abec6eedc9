//! Error types for the settlement engine.
//!
//! All errors use the `DS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Record errors (genuineness, parties, cancellation)
//! - 2xx: Proposal errors
//! - 3xx: Settlement errors
//! - 4xx: Operational mode errors
//! - 5xx: Fraud challenge errors
//! - 6xx: Fund ledger errors
//! - 9xx: General / internal errors
//!
//! Every variant names the violated precondition so a caller can decide
//! whether to resubmit with different evidence or wait.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Currency, Height, ProposalFamily, RecordHash, RecordKind, WalletId};

/// How a failure should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The call can never succeed as submitted.
    Precondition,
    /// The slot is occupied; wait for expiration or termination.
    Conflict,
    /// A bug or a misconfigured deployment.
    Internal,
}

/// Central error enum for all engine operations.
#[derive(Debug, Error)]
pub enum DriipError {
    // =================================================================
    // Record Errors (1xx)
    // =================================================================
    /// The validator rejected the record's hash or seal.
    #[error("DS_ERR_100: {kind} {hash} is not genuine")]
    NotGenuine { kind: RecordKind, hash: RecordHash },

    /// The record has been registered as fraudulent.
    #[error("DS_ERR_101: Record {0} is registered as fraudulent")]
    FraudulentRecord(RecordHash),

    /// The order (or the order behind a trade) was cancelled.
    #[error("DS_ERR_102: Order {0} has been cancelled")]
    OrderCancelled(RecordHash),

    /// The wallet is not a party of the record.
    #[error("DS_ERR_103: {wallet} is not a party of {hash}")]
    NotParty { wallet: WalletId, hash: RecordHash },

    /// The record says nothing about this wallet's balance in this currency.
    #[error("DS_ERR_104: Record {hash} does not involve {wallet} in {currency}")]
    CurrencyMismatch {
        wallet: WalletId,
        currency: Currency,
        hash: RecordHash,
    },

    /// Two records were presented as successive but their party nonces are not.
    #[error("DS_ERR_105: Records are not successive: party nonces {first} and {second}")]
    NotSuccessive { first: u64, second: u64 },

    // =================================================================
    // Proposal Errors (2xx)
    // =================================================================
    /// No live proposal for the pair.
    #[error("DS_ERR_200: No live proposal for {wallet} in {currency}")]
    ProposalNotFound { wallet: WalletId, currency: Currency },

    /// A live proposal already occupies the pair's slot.
    #[error("DS_ERR_201: Live {holder} proposal already exists for {wallet} in {currency}")]
    ProposalConflict {
        wallet: WalletId,
        currency: Currency,
        holder: ProposalFamily,
    },

    /// The challenge window has closed.
    #[error("DS_ERR_202: Proposal for {wallet} in {currency} expired at {expiration}")]
    ProposalExpired {
        wallet: WalletId,
        currency: Currency,
        expiration: Height,
    },

    /// The challenge window is still open.
    #[error("DS_ERR_203: Proposal for {wallet} in {currency} open until {expiration}")]
    ProposalNotExpired {
        wallet: WalletId,
        currency: Currency,
        expiration: Height,
    },

    /// The proposal was already terminated.
    #[error("DS_ERR_204: Proposal for {wallet} in {currency} is terminated")]
    ProposalTerminated { wallet: WalletId, currency: Currency },

    /// The operation requires a qualified proposal.
    #[error("DS_ERR_205: Proposal for {wallet} in {currency} is disqualified")]
    ProposalDisqualified { wallet: WalletId, currency: Currency },

    /// The live proposal was started from a different record (or none).
    #[error("DS_ERR_206: Live proposal for {wallet} in {currency} was not started from {hash}")]
    ProposalMismatch {
        wallet: WalletId,
        currency: Currency,
        hash: RecordHash,
    },

    /// The claim's nonce does not exceed the highest settled nonce.
    #[error("DS_ERR_207: Nonce {nonce} not above max settled nonce {max_nonce} for {wallet} in {currency}")]
    NonceNotIncreasing {
        wallet: WalletId,
        currency: Currency,
        nonce: u64,
        max_nonce: u64,
    },

    /// Counter-evidence older than the proposal or current disqualification.
    #[error("DS_ERR_208: Evidence nonce {nonce} below required {floor}")]
    StaleEvidence { nonce: u64, floor: u64 },

    /// The evidence does not contradict the proposal.
    #[error("DS_ERR_209: Evidence balance {attested} does not undercut target balance {target}")]
    EvidenceConsistent { attested: Decimal, target: Decimal },

    /// The exact same record already backs this proposal or its disqualification.
    #[error("DS_ERR_210: Evidence {0} was already applied to this proposal")]
    DuplicateEvidence(RecordHash),

    /// Stage amounts must be strictly positive.
    #[error("DS_ERR_211: Invalid stage amount {0}")]
    InvalidStageAmount(Decimal),

    /// The tracked balance cannot cover the stage amount.
    #[error("DS_ERR_212: Tracked balance {available} cannot cover stage {needed}")]
    InsufficientTrackedBalance { needed: Decimal, available: Decimal },

    /// A wallet may not challenge its own proposal.
    #[error("DS_ERR_213: {0} cannot challenge its own proposal")]
    SelfChallenge(WalletId),

    /// The caller is neither the wallet nor an authorized proxy.
    #[error("DS_ERR_214: {0} is not authorized to act for this wallet")]
    Unauthorized(WalletId),

    /// The driip predates the earliest settleable height.
    #[error("DS_ERR_215: Record height {height} below earliest settlement height {earliest}")]
    BelowEarliestHeight { height: Height, earliest: Height },

    // =================================================================
    // Settlement Errors (3xx)
    // =================================================================
    /// The party already completed settlement of this nonce.
    #[error("DS_ERR_300: {wallet} already settled nonce {nonce}")]
    AlreadySettled { wallet: WalletId, nonce: u64 },

    /// No settlement exists for the hash.
    #[error("DS_ERR_301: Settlement not found: {0}")]
    SettlementNotFound(RecordHash),

    /// The wallet is flagged as a double spender.
    #[error("DS_ERR_302: {0} is flagged as a double spender")]
    DoubleSpender(WalletId),

    /// A challenger holds a lock on the wallet's balance.
    #[error("DS_ERR_303: {0} is locked by a challenger")]
    WalletLocked(WalletId),

    // =================================================================
    // Operational Mode Errors (4xx)
    // =================================================================
    /// Disputes are disabled once the system has halted.
    #[error("DS_ERR_400: Operational mode is EXIT")]
    ExitMode,

    /// In EXIT only claims at or below the last safe nonce proceed.
    #[error("DS_ERR_401: Operational mode is EXIT and nonce {nonce} exceeds safe nonce {safe_nonce}")]
    ExitModeFrozen { nonce: u64, safe_nonce: u64 },

    // =================================================================
    // Fraud Challenge Errors (5xx)
    // =================================================================
    /// The presented records are consistent.
    #[error("DS_ERR_500: No fraud proven: {reason}")]
    NoFraudProven { reason: String },

    /// Every offending hash has already been registered.
    #[error("DS_ERR_501: Fraud already reported for {0}")]
    FraudAlreadyReported(RecordHash),

    // =================================================================
    // Fund Ledger Errors (6xx)
    // =================================================================
    /// Not enough unlocked balance.
    #[error("DS_ERR_600: {wallet} has {available} {currency} available, needs {needed}")]
    InsufficientFunds {
        wallet: WalletId,
        currency: Currency,
        needed: Decimal,
        available: Decimal,
    },

    /// No lock held by `locker` on `wallet`.
    #[error("DS_ERR_601: No lock on {wallet} held by {locker}")]
    LockNotFound { wallet: WalletId, locker: WalletId },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("DS_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("DS_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("DS_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl DriipError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ProposalConflict { .. } => ErrorClass::Conflict,
            Self::Internal(_) | Self::Serialization(_) | Self::Configuration(_) => {
                ErrorClass::Internal
            }
            _ => ErrorClass::Precondition,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, DriipError>;

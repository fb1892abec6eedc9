//! # driip-challenge
//!
//! The optimistic half of driip settlement: wallets claim, anyone disputes.
//!
//! - [`ProposalStore`]: one live proposal per (wallet, currency), shared by
//!   the driip and null families behind an explicit ownership tag
//! - [`SettlementLedger`]: completed settlements, `MaxNonce` high-water marks,
//!   staged fees, completions and seizures
//! - [`ChallengeInitiator`]: opens proposals from a driip or from tracked
//!   balance history alone, and stops them
//! - [`DisputeEngine`]: disqualifies proposals with counter-evidence
//! - [`RewardPolicy`]: the single reward/deprival rule, shared with fraud
//!   challenges
//!
//! ## Proposal Lifecycle
//!
//! ```text
//!  start_from_driip ─┐                  ┌─ challenge_with (repeatable)
//!  start_from_absence┴─▶ QUALIFIED ─────┴─▶ DISQUALIFIED
//!                           │                    │
//!           stop_challenge / settle        settle (seize)
//!                           ▼                    ▼
//!                        TERMINATED ◀────────────┘
//! ```
//!
//! Every operation takes `&mut SettlementState` and a
//! [`driip_types::Collaborators`] bundle for its whole duration and checks
//! every precondition before its first write.

pub mod dispute;
pub mod initiator;
pub mod proposal_store;
pub mod reward;
pub mod settlement_ledger;
pub mod state;

pub use dispute::{CounterEvidence, DisputeEngine};
pub use initiator::{ChallengeInitiator, DriipClaim, NullClaim, reconcile};
pub use proposal_store::ProposalStore;
pub use reward::RewardPolicy;
pub use settlement_ledger::{SeizureRecord, SettlementLedger};
pub use state::SettlementState;

//! # driip-types
//!
//! Shared types, errors, and configuration for the **driip settlement**
//! engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`WalletId`], [`RecordHash`], [`Currency`], [`Height`]
//! - **Records**: [`Order`], [`Trade`], [`Payment`], and the [`Driip`] / [`Evidence`] unions
//! - **Proposal model**: [`Proposal`], [`ProposalFamily`], [`ProposalStatus`], [`Disqualification`]
//! - **Settlement model**: [`Settlement`], [`SettlementParty`], [`Completion`]
//! - **Rewards**: [`RewardOutcome`]
//! - **Operational mode**: [`OperationalContext`], [`OperationalMode`]
//! - **Configuration**: [`ChallengeConfig`]
//! - **Events**: [`EngineEvent`]
//! - **Collaborator ports**: [`Validator`], [`FundLedger`], [`SecurityBond`], [`Collaborators`], ...
//! - **Errors**: [`DriipError`] with `DS_ERR_` prefix codes
//! - **Constants**: system-wide defaults

pub mod config;
pub mod constants;
pub mod driip;
pub mod error;
pub mod event;
pub mod ids;
pub mod mode;
pub mod order;
pub mod payment;
pub mod ports;
pub mod proposal;
pub mod reward;
pub mod settlement;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use driip_types::{Proposal, Driip, WalletId, ...};

pub use config::*;
pub use driip::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use mode::*;
pub use order::*;
pub use payment::*;
pub use ports::*;
pub use proposal::*;
pub use reward::*;
pub use settlement::*;
pub use trade::*;

// Constants are accessed via `driip_types::constants::FOO`
// (not re-exported to avoid name collisions).

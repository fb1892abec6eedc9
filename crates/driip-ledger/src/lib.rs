//! # driip-ledger
//!
//! **Collaborator plane**: in-memory implementations of every port the
//! settlement engine consumes.
//!
//! ## Components
//!
//! 1. **ClientFund**: deposited/staged/locked balances per (wallet, currency)
//!    plus the height-indexed history behind `tracked_balance`
//! 2. **BondPool**: the shared security bond
//! 3. **InMemoryFraudRegistry** / **InMemoryCancelRegistry**
//! 4. **SealValidator**: recomputes record hashes and verifies operator
//!    signatures; **OperatorSealer** produces them
//! 5. **EventLog**: timestamped engine events
//!
//! [`LedgerEnvironment`] owns one of each and lends them to an operation as
//! a [`driip_types::Collaborators`] bundle.

pub mod client_fund;
pub mod environment;
pub mod event_log;
pub mod registry;
pub mod security_bond;
pub mod validator;

pub use client_fund::ClientFund;
pub use environment::LedgerEnvironment;
pub use event_log::{EventLog, LoggedEvent};
pub use registry::{InMemoryCancelRegistry, InMemoryFraudRegistry};
pub use security_bond::BondPool;
pub use validator::{OperatorSealer, SealValidator};

//! # driip-settlement
//!
//! **Finality**: resolving proposals whose challenge window has elapsed.
//!
//! [`SettlementFinalizer::settle`] releases a QUALIFIED proposal's stage
//! amount (and any owed fee) to the wallet, or seizes a DISQUALIFIED
//! proposal's locked reward for its challenger. Either way the proposal is
//! terminated. [`SettlementFinalizer::settle_null`] does the same for null
//! proposals and stays open in EXIT mode.
//!
//! Each party settles its own side of a driip independently; a settlement
//! record may show the origin done while the target is still pending.

pub mod finalizer;

pub use finalizer::{LegOutcome, SettlementFinalizer};

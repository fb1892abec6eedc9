//! # driip-fraud
//!
//! **Global halt**: rules that prove the operator or a wallet cheated.
//!
//! A proven fraud registers the offending records, switches the
//! [`driip_types::OperationalContext`] to EXIT and rewards the reporter with
//! the same policy disputes use. In EXIT, only claims at or below the last
//! safe driip nonce and null settlements can still move funds.

pub mod detector;

pub use detector::{FraudDetector, FraudFinding, FraudRule};

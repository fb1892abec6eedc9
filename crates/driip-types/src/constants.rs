//! System-wide constants for the settlement engine.

/// Default challenge window length, in ledger heights.
pub const DEFAULT_CHALLENGE_TIMEOUT_HEIGHTS: u64 = 5_760;

/// Default earliest height a driip may be anchored to and still be settled.
pub const DEFAULT_EARLIEST_SETTLEMENT_HEIGHT: u64 = 0;

/// Default flat challenger reward, in units of the disputed currency.
/// Expressed as `(mantissa, scale)` for `Decimal::new`.
pub const DEFAULT_FLAT_REWARD: (i64, u32) = (10, 0);

/// Default fractional challenger reward: share of the remaining security
/// bond balance (`(mantissa, scale)` → 0.05).
pub const DEFAULT_FRACTIONAL_REWARD: (i64, u32) = (5, 2);

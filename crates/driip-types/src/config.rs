//! Configuration for the challenge and settlement engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{DriipError, Height, Result, WalletId, constants};

/// Engine configuration. Values are consumed, never mutated, by operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// Challenge window length in heights.
    pub challenge_timeout: u64,
    /// Driips anchored below this height cannot be challenged into settlement.
    pub earliest_settlement_height: Height,
    /// Flat component of a bond-funded reward.
    pub flat_reward: Decimal,
    /// Fraction (0..=1) of the bond's remaining balance paid on top of the
    /// flat component.
    pub fractional_reward: Decimal,
    /// Wallet that receives staged fees.
    pub fee_beneficiary: WalletId,
    /// Operators allowed to start or stop challenges on a wallet's behalf.
    #[serde(default)]
    pub authorized_proxies: Vec<WalletId>,
}

impl ChallengeConfig {
    /// Default configuration sending fees to `fee_beneficiary`.
    #[must_use]
    pub fn with_beneficiary(fee_beneficiary: WalletId) -> Self {
        Self {
            challenge_timeout: constants::DEFAULT_CHALLENGE_TIMEOUT_HEIGHTS,
            earliest_settlement_height: Height(constants::DEFAULT_EARLIEST_SETTLEMENT_HEIGHT),
            flat_reward: Decimal::new(constants::DEFAULT_FLAT_REWARD.0, constants::DEFAULT_FLAT_REWARD.1),
            fractional_reward: Decimal::new(
                constants::DEFAULT_FRACTIONAL_REWARD.0,
                constants::DEFAULT_FRACTIONAL_REWARD.1,
            ),
            fee_beneficiary,
            authorized_proxies: Vec::new(),
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DriipError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no engine should run with.
    pub fn validate(&self) -> Result<()> {
        if self.challenge_timeout == 0 {
            return Err(DriipError::Configuration(
                "challenge_timeout must be at least one height".into(),
            ));
        }
        if self.flat_reward.is_sign_negative() {
            return Err(DriipError::Configuration(format!(
                "flat_reward must not be negative, got {}",
                self.flat_reward
            )));
        }
        if self.fractional_reward.is_sign_negative() || self.fractional_reward > Decimal::ONE {
            return Err(DriipError::Configuration(format!(
                "fractional_reward must be within [0, 1], got {}",
                self.fractional_reward
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_authorized_proxy(&self, operator: WalletId) -> bool {
        self.authorized_proxies.contains(&operator)
    }
}

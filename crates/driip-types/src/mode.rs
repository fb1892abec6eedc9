//! Operational mode: the global emergency halt.
//!
//! The mode lives in an explicit, versioned [`OperationalContext`] that every
//! operation receives. Only the fraud path moves it from `Normal` to `Exit`;
//! there is no way back to `Normal` within a context.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationalMode {
    Normal,
    /// Systemic fraud was proven. Claims whose nonce exceeds the last safe
    /// settled nonce are frozen.
    Exit,
}

impl std::fmt::Display for OperationalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Exit => write!(f, "EXIT"),
        }
    }
}

/// Shared mode state. `version` increments on every transition so callers
/// can tell whether the mode changed between two reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalContext {
    mode: OperationalMode,
    version: u64,
}

impl OperationalContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: OperationalMode::Normal,
            version: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> OperationalMode {
        self.mode
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn is_normal(&self) -> bool {
        self.mode == OperationalMode::Normal
    }

    #[must_use]
    pub fn is_exit(&self) -> bool {
        self.mode == OperationalMode::Exit
    }

    /// Whether a claim with `nonce` may proceed given the last safe settled
    /// nonce. Always true in `Normal`.
    #[must_use]
    pub fn admits(&self, nonce: u64, safe_nonce: u64) -> bool {
        self.is_normal() || nonce <= safe_nonce
    }

    /// Enter `Exit`. Returns `true` if this call changed the mode.
    ///
    /// Called by the fraud detector only.
    pub fn halt(&mut self) -> bool {
        if self.is_exit() {
            return false;
        }
        self.mode = OperationalMode::Exit;
        self.version += 1;
        true
    }
}

impl Default for OperationalContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_normal() {
        let ctx = OperationalContext::new();
        assert!(ctx.is_normal());
        assert_eq!(ctx.version(), 0);
        assert!(ctx.admits(1_000, 0));
    }

    #[test]
    fn halt_is_one_way_and_versioned() {
        let mut ctx = OperationalContext::new();
        assert!(ctx.halt());
        assert_eq!(ctx.mode(), OperationalMode::Exit);
        assert_eq!(ctx.version(), 1);

        assert!(!ctx.halt(), "second halt changes nothing");
        assert_eq!(ctx.version(), 1);
    }

    #[test]
    fn exit_admits_only_safe_nonces() {
        let mut ctx = OperationalContext::new();
        ctx.halt();
        assert!(ctx.admits(5, 5));
        assert!(ctx.admits(4, 5));
        assert!(!ctx.admits(6, 5));
    }
}

//! Identifiers used throughout the settlement engine.
//!
//! Wallets use UUIDv7 (time-ordered), record hashes are SHA-256 digests of the
//! canonical record payload, and ledger positions are plain block heights.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// WalletId
// ---------------------------------------------------------------------------

/// Identifier of a wallet (a settling party, a challenger, or a proxy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct WalletId(pub Uuid);

impl WalletId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wallet:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RecordHash
// ---------------------------------------------------------------------------

/// SHA-256 digest identifying an order, trade or payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RecordHash(pub [u8; 32]);

impl RecordHash {
    /// The all-zero hash, used for unsealed records.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Hash `domain || parts...` with SHA-256.
    #[must_use]
    pub fn digest(domain: &[u8], parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First four bytes in hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for RecordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// A currency is identified by its token contract and a token id
/// (non-zero only for multi-token contracts).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Currency {
    pub contract: String,
    pub id: u64,
}

impl Currency {
    #[must_use]
    pub fn new(contract: impl Into<String>, id: u64) -> Self {
        Self {
            contract: contract.into(),
            id,
        }
    }

    /// Shorthand for a single-token contract (`id = 0`).
    #[must_use]
    pub fn fungible(contract: impl Into<String>) -> Self {
        Self::new(contract, 0)
    }

    /// Bytes fed into record hashes.
    #[must_use]
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.contract.len() + 8);
        out.extend_from_slice(self.contract.as_bytes());
        out.extend_from_slice(&self.id.to_le_bytes());
        out
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.contract, self.id)
    }
}

// ---------------------------------------------------------------------------
// Height
// ---------------------------------------------------------------------------

/// Ledger block height. All deadlines are expressed in heights, never in
/// wall-clock time.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Height(pub u64);

impl Height {
    /// The height `delta` blocks after this one (saturating).
    #[must_use]
    pub fn plus(self, delta: u64) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

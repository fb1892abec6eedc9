//! Seal validation and operator sealing.
//!
//! Every record carries an operator seal: the SHA-256 operator hash of the
//! record and an ed25519 signature over it by the operator key. Orders and
//! payments also carry a wallet seal whose hash covers only the content the
//! wallet authorised.
//!
//! [`SealValidator`] recomputes both hashes and verifies the operator
//! signature. [`OperatorSealer`] produces seals for records the operator
//! commits to.

use driip_types::{Order, Payment, RecordHash, Seal, Trade, Validator};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

// ---------------------------------------------------------------------------
// SealValidator
// ---------------------------------------------------------------------------

/// Validates records against the operator's public key.
#[derive(Debug, Clone)]
pub struct SealValidator {
    operator: VerifyingKey,
}

impl SealValidator {
    #[must_use]
    pub fn new(operator: VerifyingKey) -> Self {
        Self { operator }
    }

    /// Whether `seal` carries `expected` and a valid operator signature over it.
    fn verify_seal(&self, seal: &Seal, expected: RecordHash) -> bool {
        if seal.hash != expected {
            return false;
        }
        let Ok(signature) = Signature::from_slice(&seal.signature) else {
            return false;
        };
        self.operator
            .verify(seal.hash.as_bytes(), &signature)
            .is_ok()
    }
}

impl Validator for SealValidator {
    fn is_genuine_trade(&self, trade: &Trade) -> bool {
        self.verify_seal(&trade.seal, trade.compute_hash())
    }

    fn is_genuine_order_wallet_seal(&self, order: &Order) -> bool {
        order.seals.wallet.hash == order.compute_wallet_hash()
    }

    fn is_genuine_order_operator_seal(&self, order: &Order) -> bool {
        self.verify_seal(&order.seals.operator, order.compute_operator_hash())
    }

    fn is_genuine_payment_wallet_seal(&self, payment: &Payment) -> bool {
        payment.seals.wallet.hash == payment.compute_wallet_hash()
    }

    fn is_genuine_payment_operator_seal(&self, payment: &Payment) -> bool {
        self.verify_seal(&payment.seals.operator, payment.compute_operator_hash())
    }
}

// ---------------------------------------------------------------------------
// OperatorSealer
// ---------------------------------------------------------------------------

/// Seals records with the operator's signing key.
pub struct OperatorSealer {
    key: SigningKey,
}

impl OperatorSealer {
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    #[must_use]
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        Self::new(SigningKey::from_bytes(secret))
    }

    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// A validator that accepts exactly what this sealer signs.
    #[must_use]
    pub fn validator(&self) -> SealValidator {
        SealValidator::new(self.verifying_key())
    }

    fn sign(&self, hash: RecordHash) -> Seal {
        Seal {
            hash,
            signature: self.key.sign(hash.as_bytes()).to_bytes().to_vec(),
        }
    }

    /// Fill in the wallet hash and the operator seal.
    pub fn seal_payment(&self, payment: &mut Payment) {
        payment.seals.wallet = Seal {
            hash: payment.compute_wallet_hash(),
            signature: Vec::new(),
        };
        payment.seals.operator = self.sign(payment.compute_operator_hash());
    }

    pub fn seal_trade(&self, trade: &mut Trade) {
        trade.seal = self.sign(trade.compute_hash());
    }

    pub fn seal_order(&self, order: &mut Order) {
        order.seals.wallet = Seal {
            hash: order.compute_wallet_hash(),
            signature: Vec::new(),
        };
        order.seals.operator = self.sign(order.compute_operator_hash());
    }
}

/// Random-key sealer for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl OperatorSealer {
    #[must_use]
    pub fn random() -> Self {
        Self::from_bytes(&rand::random::<[u8; 32]>())
    }
}

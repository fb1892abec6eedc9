//! Settlement ledger: finalized settlements and nonce high-water marks.
//!
//! Like a UTXO set: each (wallet, party nonce) can complete settlement only
//! once. Attempting to complete it a second time returns
//! [`DriipError::AlreadySettled`].
//!
//! The ledger also keeps the per-(wallet, currency) `MaxNonce`, the global
//! highest settled driip nonce (the safe nonce while in EXIT mode), the fees
//! already staged per pair, the most recent completion per pair (for
//! causal-rebalance detection) and an audit trail of seizures.

use std::collections::HashMap;

use driip_types::{
    Completion, Currency, Driip, DriipError, Height, RecordHash, Result, Settlement,
    SettlementParty, WalletId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A disqualified proposal whose locked value went to the challenger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizureRecord {
    pub wallet: WalletId,
    pub currency: Currency,
    pub challenger: WalletId,
    pub amount: Decimal,
    pub proposal_nonce: u64,
    /// `None` for null proposals.
    pub challenged_hash: Option<RecordHash>,
    pub height: Height,
}

#[derive(Debug, Default)]
pub struct SettlementLedger {
    settlements: HashMap<RecordHash, Settlement>,
    by_wallet: HashMap<WalletId, Vec<RecordHash>>,
    by_wallet_nonce: HashMap<(WalletId, u64), RecordHash>,
    max_nonce: HashMap<(WalletId, Currency), u64>,
    max_driip_nonce: u64,
    fees_staged: HashMap<(WalletId, Currency), Decimal>,
    completions: HashMap<(WalletId, Currency), Completion>,
    seizures: Vec<SeizureRecord>,
}

impl SettlementLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Settlements
    // -----------------------------------------------------------------

    /// Whether `wallet` already completed settlement at `party_nonce`.
    #[must_use]
    pub fn is_done(&self, wallet: WalletId, party_nonce: u64) -> bool {
        self.by_wallet_nonce(wallet, party_nonce)
            .and_then(|s| s.party(wallet))
            .is_some_and(|p| p.nonce == party_nonce && p.done)
    }

    /// Mark `wallet`'s side of `driip` done at `at`, creating the settlement
    /// record on first use.
    ///
    /// # Errors
    /// - `NotParty` if `wallet` is not in the driip
    /// - `AlreadySettled` if that side is already done
    pub fn complete(&mut self, driip: &Driip, wallet: WalletId, at: Height) -> Result<&Settlement> {
        let hash = driip.hash();
        let (origin_wallet, origin_nonce) = driip.origin();
        let (target_wallet, target_nonce) = driip.target();
        let party_nonce = if wallet == origin_wallet {
            origin_nonce
        } else if wallet == target_wallet {
            target_nonce
        } else {
            return Err(DriipError::NotParty { wallet, hash });
        };

        if self.is_done(wallet, party_nonce) {
            return Err(DriipError::AlreadySettled {
                wallet,
                nonce: party_nonce,
            });
        }

        let settlement = self.settlements.entry(hash).or_insert_with(|| Settlement {
            settled_kind: driip.kind(),
            settled_hash: hash,
            origin: SettlementParty::pending(origin_wallet, origin_nonce),
            target: SettlementParty::pending(target_wallet, target_nonce),
        });
        if let Some(party) = settlement.party_mut(wallet) {
            party.done = true;
            party.done_height = Some(at);
        }

        for (w, n) in [(origin_wallet, origin_nonce), (target_wallet, target_nonce)] {
            let hashes = self.by_wallet.entry(w).or_default();
            if !hashes.contains(&hash) {
                hashes.push(hash);
            }
            self.by_wallet_nonce.entry((w, n)).or_insert(hash);
        }
        self.settlements
            .get(&hash)
            .ok_or(DriipError::SettlementNotFound(hash))
    }

    #[must_use]
    pub fn settlement(&self, hash: &RecordHash) -> Option<&Settlement> {
        self.settlements.get(hash)
    }

    /// Settlements `wallet` is a party of, in creation order.
    #[must_use]
    pub fn by_wallet(&self, wallet: WalletId) -> Vec<&Settlement> {
        self.by_wallet
            .get(&wallet)
            .into_iter()
            .flatten()
            .filter_map(|hash| self.settlements.get(hash))
            .collect()
    }

    #[must_use]
    pub fn by_wallet_nonce(&self, wallet: WalletId, party_nonce: u64) -> Option<&Settlement> {
        self.by_wallet_nonce
            .get(&(wallet, party_nonce))
            .and_then(|hash| self.settlements.get(hash))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.settlements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settlements.is_empty()
    }

    // -----------------------------------------------------------------
    // Nonces
    // -----------------------------------------------------------------

    /// Highest nonce settled for the pair (0 if none).
    #[must_use]
    pub fn max_nonce(&self, wallet: WalletId, currency: &Currency) -> u64 {
        self.max_nonce
            .get(&(wallet, currency.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Raise the pair's `MaxNonce` to `nonce`. Never lowers it.
    pub fn advance_max_nonce(&mut self, wallet: WalletId, currency: &Currency, nonce: u64) {
        let entry = self.max_nonce.entry((wallet, currency.clone())).or_insert(0);
        *entry = (*entry).max(nonce);
    }

    /// Highest driip nonce settled by anyone: the last known safe nonce.
    #[must_use]
    pub fn max_driip_nonce(&self) -> u64 {
        self.max_driip_nonce
    }

    pub fn advance_max_driip_nonce(&mut self, nonce: u64) {
        self.max_driip_nonce = self.max_driip_nonce.max(nonce);
    }

    // -----------------------------------------------------------------
    // Fees, completions, seizures
    // -----------------------------------------------------------------

    /// Running total of fees already staged for the pair.
    #[must_use]
    pub fn fees_staged(&self, wallet: WalletId, currency: &Currency) -> Decimal {
        self.fees_staged
            .get(&(wallet, currency.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn add_fees_staged(&mut self, wallet: WalletId, currency: &Currency, amount: Decimal) {
        *self
            .fees_staged
            .entry((wallet, currency.clone()))
            .or_default() += amount;
    }

    /// The most recent completed release for the pair.
    #[must_use]
    pub fn last_completion(&self, wallet: WalletId, currency: &Currency) -> Option<Completion> {
        self.completions.get(&(wallet, currency.clone())).copied()
    }

    pub fn record_completion(&mut self, wallet: WalletId, currency: &Currency, completion: Completion) {
        self.completions.insert((wallet, currency.clone()), completion);
    }

    pub fn record_seizure(&mut self, record: SeizureRecord) {
        self.seizures.push(record);
    }

    #[must_use]
    pub fn seizures(&self) -> &[SeizureRecord] {
        &self.seizures
    }
}

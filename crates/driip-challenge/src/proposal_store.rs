//! Proposal store: one slot per (wallet, currency).
//!
//! Each slot keeps the full proposal history plus an explicit ownership tag
//! naming the family whose proposal is currently live. The driip and null
//! initiators share the slot: a write by one family while the other holds it
//! is a conflict, never a silent overwrite.
//!
//! All writes validate first and then mutate, so a failed call leaves the
//! store unchanged.

use std::collections::HashMap;

use driip_types::{Currency, DriipError, Proposal, ProposalFamily, Result, WalletId};
use tracing::debug;

#[derive(Debug, Default)]
struct Slot {
    /// Family of the live proposal, if any.
    holder: Option<ProposalFamily>,
    /// Every proposal ever written for the pair, oldest first.
    history: Vec<Proposal>,
}

impl Slot {
    fn live(&self) -> Option<&Proposal> {
        self.holder?;
        self.history.last().filter(|p| p.is_live())
    }

    fn live_mut(&mut self) -> Option<&mut Proposal> {
        self.holder?;
        self.history.last_mut().filter(|p| p.is_live())
    }
}

#[derive(Debug, Default)]
pub struct ProposalStore {
    slots: HashMap<(WalletId, Currency), Slot>,
    /// `(wallet, nonce)` → currencies with a proposal at that nonce.
    by_nonce: HashMap<(WalletId, u64), Vec<Currency>>,
}

impl ProposalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------

    /// Write `proposal` into its pair's slot.
    ///
    /// If the slot is free the proposal is appended. If the same family
    /// holds it, the live proposal is replaced in place.
    ///
    /// # Errors
    /// `ProposalConflict` if the other family holds the slot.
    pub fn upsert(&mut self, proposal: Proposal) -> Result<()> {
        let key = (proposal.wallet, proposal.currency.clone());
        if let Some(holder) = self.holder(proposal.wallet, &proposal.currency) {
            if holder != proposal.family {
                return Err(DriipError::ProposalConflict {
                    wallet: proposal.wallet,
                    currency: proposal.currency,
                    holder,
                });
            }
        }
        self.write(key, proposal);
        Ok(())
    }

    /// Like [`upsert`](Self::upsert), but first terminates a live proposal
    /// of the other family instead of failing.
    pub fn upsert_migrating(&mut self, proposal: Proposal) -> Result<()> {
        if self
            .holder(proposal.wallet, &proposal.currency)
            .is_some_and(|holder| holder != proposal.family)
        {
            self.terminate(proposal.wallet, &proposal.currency);
        }
        self.upsert(proposal)
    }

    fn write(&mut self, key: (WalletId, Currency), proposal: Proposal) {
        let wallet = proposal.wallet;
        let nonce = proposal.nonce;
        let slot = self.slots.entry(key.clone()).or_default();
        let live = proposal.is_live();
        match slot.live_mut() {
            Some(current) => {
                let previous_nonce = current.nonce;
                *current = proposal;
                if previous_nonce != nonce {
                    self.unindex(wallet, previous_nonce, &key.1);
                    self.index(wallet, nonce, key.1.clone());
                }
            }
            None => {
                slot.history.push(proposal);
                self.index(wallet, nonce, key.1.clone());
            }
        }
        let slot = self.slots.entry(key).or_default();
        slot.holder = if live {
            slot.history.last().map(|p| p.family)
        } else {
            None
        };
    }

    fn index(&mut self, wallet: WalletId, nonce: u64, currency: Currency) {
        let entry = self.by_nonce.entry((wallet, nonce)).or_default();
        if !entry.contains(&currency) {
            entry.push(currency);
        }
    }

    fn unindex(&mut self, wallet: WalletId, nonce: u64, currency: &Currency) {
        let key = (wallet, nonce);
        let still_present = self.slots.get(&(wallet, currency.clone())).is_some_and(|slot| {
            slot.history.iter().any(|p| p.nonce == nonce)
        });
        if still_present {
            return;
        }
        if let Some(currencies) = self.by_nonce.get_mut(&key) {
            currencies.retain(|c| c != currency);
            if currencies.is_empty() {
                self.by_nonce.remove(&key);
            }
        }
    }

    /// Terminate the live proposal of the pair, whichever family holds it.
    /// Returns `false` if there was nothing to terminate.
    pub fn terminate(&mut self, wallet: WalletId, currency: &Currency) -> bool {
        let Some(slot) = self.slots.get_mut(&(wallet, currency.clone())) else {
            return false;
        };
        let terminated = slot.live_mut().is_some_and(Proposal::terminate);
        slot.holder = None;
        if terminated {
            debug!(%wallet, %currency, "proposal terminated");
        }
        terminated
    }

    /// Mutable access to the live proposal, for in-place status changes.
    pub fn live_mut(&mut self, wallet: WalletId, currency: &Currency) -> Option<&mut Proposal> {
        self.slots
            .get_mut(&(wallet, currency.clone()))
            .and_then(Slot::live_mut)
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    #[must_use]
    pub fn holder(&self, wallet: WalletId, currency: &Currency) -> Option<ProposalFamily> {
        self.slots
            .get(&(wallet, currency.clone()))
            .and_then(|slot| slot.live().map(|p| p.family))
    }

    #[must_use]
    pub fn live(&self, wallet: WalletId, currency: &Currency) -> Option<&Proposal> {
        self.slots
            .get(&(wallet, currency.clone()))
            .and_then(Slot::live)
    }

    /// Most recent proposal for the pair, live or terminated.
    #[must_use]
    pub fn last(&self, wallet: WalletId, currency: &Currency) -> Option<&Proposal> {
        self.slots
            .get(&(wallet, currency.clone()))
            .and_then(|slot| slot.history.last())
    }

    /// The `index`-th proposal ever written for the pair (0 = oldest).
    #[must_use]
    pub fn by_index(&self, wallet: WalletId, currency: &Currency, index: usize) -> Option<&Proposal> {
        self.slots
            .get(&(wallet, currency.clone()))
            .and_then(|slot| slot.history.get(index))
    }

    /// Every proposal of `wallet` written at `nonce`, across currencies.
    #[must_use]
    pub fn by_nonce(&self, wallet: WalletId, nonce: u64) -> Vec<&Proposal> {
        self.by_nonce
            .get(&(wallet, nonce))
            .into_iter()
            .flatten()
            .filter_map(|currency| self.slots.get(&(wallet, currency.clone())))
            .flat_map(|slot| slot.history.iter().filter(|p| p.nonce == nonce))
            .collect()
    }

    #[must_use]
    pub fn count(&self, wallet: WalletId, currency: &Currency) -> usize {
        self.slots
            .get(&(wallet, currency.clone()))
            .map_or(0, |slot| slot.history.len())
    }

    /// Number of live proposals across all pairs.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.values().filter(|slot| slot.live().is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth() -> Currency {
        Currency::fungible("ETH")
    }

    #[test]
    fn upsert_then_lookup() {
        let mut store = ProposalStore::new();
        let wallet = WalletId::new();
        store
            .upsert(Proposal::dummy(wallet, eth(), 5, ProposalFamily::Driip))
            .unwrap();

        assert_eq!(store.holder(wallet, &eth()), Some(ProposalFamily::Driip));
        assert_eq!(store.live(wallet, &eth()).map(|p| p.nonce), Some(5));
        assert_eq!(store.by_nonce(wallet, 5).len(), 1);
        assert_eq!(store.count(wallet, &eth()), 1);
    }

    #[test]
    fn other_family_conflicts() {
        let mut store = ProposalStore::new();
        let wallet = WalletId::new();
        store
            .upsert(Proposal::dummy(wallet, eth(), 5, ProposalFamily::Driip))
            .unwrap();

        let err = store
            .upsert(Proposal::dummy(wallet, eth(), 6, ProposalFamily::Null))
            .unwrap_err();
        assert!(matches!(
            err,
            DriipError::ProposalConflict {
                holder: ProposalFamily::Driip,
                ..
            }
        ));
        // Store unchanged
        assert_eq!(store.count(wallet, &eth()), 1);
        assert_eq!(store.live(wallet, &eth()).map(|p| p.nonce), Some(5));
    }

    #[test]
    fn same_family_replaces_live() {
        let mut store = ProposalStore::new();
        let wallet = WalletId::new();
        store
            .upsert(Proposal::dummy(wallet, eth(), 5, ProposalFamily::Null))
            .unwrap();
        store
            .upsert(Proposal::dummy(wallet, eth(), 6, ProposalFamily::Null))
            .unwrap();

        assert_eq!(store.count(wallet, &eth()), 1);
        assert!(store.by_nonce(wallet, 5).is_empty());
        assert_eq!(store.by_nonce(wallet, 6).len(), 1);
    }

    #[test]
    fn migration_terminates_other_family() {
        let mut store = ProposalStore::new();
        let wallet = WalletId::new();
        store
            .upsert(Proposal::dummy(wallet, eth(), 5, ProposalFamily::Driip))
            .unwrap();
        store
            .upsert_migrating(Proposal::dummy(wallet, eth(), 6, ProposalFamily::Null))
            .unwrap();

        assert_eq!(store.holder(wallet, &eth()), Some(ProposalFamily::Null));
        assert_eq!(store.count(wallet, &eth()), 2);
        assert!(store.by_index(wallet, &eth(), 0).unwrap().terminated);
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn terminate_is_idempotent_and_frees_slot() {
        let mut store = ProposalStore::new();
        let wallet = WalletId::new();
        store
            .upsert(Proposal::dummy(wallet, eth(), 5, ProposalFamily::Driip))
            .unwrap();

        assert!(store.terminate(wallet, &eth()));
        assert!(!store.terminate(wallet, &eth()));
        assert!(store.live(wallet, &eth()).is_none());
        assert!(store.last(wallet, &eth()).unwrap().terminated);

        // Either family may now take the slot.
        store
            .upsert(Proposal::dummy(wallet, eth(), 6, ProposalFamily::Null))
            .unwrap();
        assert_eq!(store.count(wallet, &eth()), 2);
    }

    #[test]
    fn terminate_unknown_pair_is_noop() {
        let mut store = ProposalStore::new();
        assert!(!store.terminate(WalletId::new(), &eth()));
    }

    #[test]
    fn by_nonce_spans_currencies() {
        let mut store = ProposalStore::new();
        let wallet = WalletId::new();
        let dai = Currency::fungible("DAI");
        store
            .upsert(Proposal::dummy(wallet, eth(), 9, ProposalFamily::Driip))
            .unwrap();
        store
            .upsert(Proposal::dummy(wallet, dai, 9, ProposalFamily::Driip))
            .unwrap();
        assert_eq!(store.by_nonce(wallet, 9).len(), 2);
        assert!(store.by_nonce(WalletId::new(), 9).is_empty());
    }
}

//! Insertion-ordered account ledger.

use std::collections::HashMap;

use alpen_rollup_primitives::{AccountId, Balance};
use num_bigint::BigUint;

/// Mapping from account to balance with dense, insertion-ordered leaf indices.
///
/// An account's leaf index is assigned on first insertion and never changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    accounts: Vec<(AccountId, Balance)>,
    index: HashMap<AccountId, usize>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays `(id, balance)` pairs through [`Ledger::upsert`] in iteration order.
    pub fn from_snapshot<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (AccountId, Balance)>,
    {
        let mut ledger = Self::new();
        for (id, balance) in entries {
            ledger.upsert(id, balance);
        }
        ledger
    }

    /// Sets the balance of `id`, inserting at the next free leaf index if unseen.
    ///
    /// Returns the account's leaf index.
    pub fn upsert(&mut self, id: AccountId, balance: Balance) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            self.accounts[idx].1 = balance;
            return idx;
        }

        let idx = self.accounts.len();
        self.index.insert(id.clone(), idx);
        self.accounts.push((id, balance));
        idx
    }

    /// Balance of `id`, or zero for an account never seen.
    pub fn balance_of(&self, id: &AccountId) -> Balance {
        self.index
            .get(id)
            .map(|&idx| self.accounts[idx].1.clone())
            .unwrap_or_default()
    }

    pub fn leaf_index(&self, id: &AccountId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterates accounts in leaf-index order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &Balance)> + '_ {
        self.accounts.iter().map(|(id, bal)| (id, bal))
    }

    /// Owned copy of the accounts in leaf-index order.
    pub fn snapshot(&self) -> Vec<(AccountId, Balance)> {
        self.accounts.clone()
    }

    /// Sum of all balances. Not itself a balance, so it may exceed the field order.
    pub fn total_balance(&self) -> BigUint {
        self.accounts.iter().map(|(_, b)| b.as_biguint()).sum()
    }
}

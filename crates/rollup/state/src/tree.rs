//! Poseidon commitment tree over the ledger.

use alpen_rollup_primitives::{AccountId, FieldElement, PairHasher, PrimitivesError};
use tracing::trace;

use crate::{Ledger, MerkleProof};

/// Complete binary tree over the ledger's leaves in index order.
///
/// Every level is retained after [`CommitmentTree::rebuild`] so inclusion
/// proofs can be read off directly. Level 0 holds the padded leaves and the
/// last level holds the single root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitmentTree {
    levels: Vec<Vec<FieldElement>>,
    leaf_count: usize,
}

impl CommitmentTree {
    /// Builds a tree for `ledger`.
    pub fn from_ledger(ledger: &Ledger) -> Result<Self, PrimitivesError> {
        let mut tree = Self::default();
        tree.rebuild(ledger)?;
        Ok(tree)
    }

    /// Recomputes every leaf and internal node from scratch.
    ///
    /// With no accounts the tree is empty and the root is the zero sentinel.
    /// Otherwise the leaf level is padded with the sentinel to
    /// `max(2, next_power_of_two(n))`, so a lone account is still hashed
    /// once against the sentinel.
    pub fn rebuild(&mut self, ledger: &Ledger) -> Result<(), PrimitivesError> {
        self.levels.clear();
        self.leaf_count = ledger.len();
        if ledger.is_empty() {
            return Ok(());
        }

        let mut hasher = PairHasher::new()?;
        let width = ledger.len().next_power_of_two().max(2);
        let mut level = Vec::with_capacity(width);
        for (id, balance) in ledger.iter() {
            level.push(hasher.hash_leaf(id, balance)?);
        }
        level.resize(width, FieldElement::zero());

        while level.len() > 1 {
            let next = level
                .chunks_exact(2)
                .map(|pair| hasher.hash(&pair[0], &pair[1]))
                .collect::<Result<Vec<_>, _>>()?;
            self.levels.push(level);
            level = next;
        }
        self.levels.push(level);

        trace!(leaves = self.leaf_count, depth = self.depth(), root = %self.root(), "rebuilt commitment tree");
        Ok(())
    }

    /// Current root, or the zero sentinel for an empty tree.
    pub fn root(&self) -> FieldElement {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or_else(FieldElement::zero)
    }

    /// Number of hashing rounds between a leaf and the root.
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Inclusion proof for the account at `leaf_index`.
    pub fn proof_at(&self, leaf_index: usize) -> Option<MerkleProof> {
        if leaf_index >= self.leaf_count {
            return None;
        }

        let leaf = *self.levels.first()?.get(leaf_index)?;
        let mut path_elements = Vec::with_capacity(self.depth());
        let mut path_indices = Vec::with_capacity(self.depth());
        let mut idx = leaf_index;
        for level in &self.levels[..self.depth()] {
            path_elements.push(*level.get(idx ^ 1)?);
            path_indices.push((idx & 1) as u8);
            idx >>= 1;
        }

        Some(MerkleProof {
            leaf_index,
            leaf,
            path_elements,
            path_indices,
            root: self.root(),
        })
    }

    /// Inclusion proof for `id`, using `ledger` to resolve its leaf index.
    ///
    /// `ledger` must be the one this tree was last rebuilt from.
    pub fn proof(&self, ledger: &Ledger, id: &AccountId) -> Option<MerkleProof> {
        self.proof_at(ledger.leaf_index(id)?)
    }
}

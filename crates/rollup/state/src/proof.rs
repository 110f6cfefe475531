//! Merkle inclusion proofs and root recomputation.

use alpen_rollup_primitives::{FieldElement, PairHasher, PrimitivesError};
use serde::{Deserialize, Serialize};

/// Merkle inclusion proof of a single leaf.
///
/// `path_indices[i]` is 0 when the running node is the left child at level
/// `i` and 1 when it is the right child.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub leaf: FieldElement,
    pub path_elements: Vec<FieldElement>,
    pub path_indices: Vec<u8>,
    pub root: FieldElement,
}

impl MerkleProof {
    /// Folds the leaf up the path.
    pub fn compute_root(&self) -> Result<FieldElement, PrimitivesError> {
        let mut hasher = PairHasher::new()?;
        let mut node = self.leaf;
        for (sibling, side) in self.path_elements.iter().zip(&self.path_indices) {
            node = if *side == 0 {
                hasher.hash(&node, sibling)?
            } else {
                hasher.hash(sibling, &node)?
            };
        }
        Ok(node)
    }

    /// Checks the path is well formed and leads to `root`.
    pub fn verify(&self) -> Result<bool, PrimitivesError> {
        if self.path_elements.len() != self.path_indices.len()
            || self.path_indices.iter().any(|i| *i > 1)
        {
            return Ok(false);
        }
        Ok(self.compute_root()? == self.root)
    }
}

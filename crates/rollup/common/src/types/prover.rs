use alpen_rollup_primitives::FieldElement;
use alpen_rollup_state::TransferWitness;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::BatchIdx;

/// Input handed to the prover for one committed batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverInput {
    pub batch_idx: BatchIdx,
    pub old_root: FieldElement,
    pub new_root: FieldElement,
    pub transfers: Vec<TransferWitness>,
}

/// Proof returned by the prover.
///
/// `proof` is opaque. `public_signals` must begin with the old and new roots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofMaterial {
    pub proof: Value,
    pub public_signals: Vec<FieldElement>,
}

impl ProofMaterial {
    pub fn new(proof: Value, public_signals: Vec<FieldElement>) -> Self {
        Self {
            proof,
            public_signals,
        }
    }

    /// The `(old_root, new_root)` pair exposed by the proof, if present.
    pub fn public_roots(&self) -> Option<(FieldElement, FieldElement)> {
        match self.public_signals.as_slice() {
            [old, new, ..] => Some((*old, *new)),
            _ => None,
        }
    }
}

/// How proof generation ended for a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum ProofStatus {
    /// A proof was produced and its public roots matched.
    Generated,
    /// No prover is configured.
    Disabled,
    /// The prover failed or returned a proof for different roots.
    Failed(String),
    /// The prover did not answer within the configured timeout.
    TimedOut,
}

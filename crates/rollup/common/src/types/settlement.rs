use alpen_rollup_primitives::FieldElement;
use serde::{Deserialize, Serialize};

use crate::{BatchIdx, ProofMaterial};

/// What gets sent to the settlement layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlementSubmission {
    pub batch_idx: BatchIdx,
    pub proof: ProofMaterial,
    pub old_root: FieldElement,
    pub new_root: FieldElement,
}

/// Receipt returned by the settlement layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Settlement-layer transaction reference.
    pub tx_ref: String,
    pub block_number: Option<u64>,
    pub finalized: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SettlementOutcome {
    /// Nothing was submitted.
    Skipped { reason: String },
    Submitted(SettlementReceipt),
    Failed { reason: String },
}

impl SettlementOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl ToString) -> Self {
        Self::Failed {
            reason: reason.to_string(),
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

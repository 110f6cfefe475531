use alpen_rollup_primitives::{FieldElement, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ProofMaterial, ProofStatus, SettlementOutcome};

/// Index of a committed batch, starting at 1.
pub type BatchIdx = u64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum PersistenceStatus {
    Persisted,
    Failed(String),
}

/// Published once per committed batch, after persistence has been attempted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchNotification {
    pub batch_idx: BatchIdx,
    pub transactions: Vec<Transaction>,
    pub old_root: FieldElement,
    pub new_root: FieldElement,
    pub proof: Option<ProofMaterial>,
    pub proof_status: ProofStatus,
    pub settlement: SettlementOutcome,
    pub persistence: PersistenceStatus,
    pub timestamp: DateTime<Utc>,
}

impl BatchNotification {
    pub fn proof_present(&self) -> bool {
        self.proof.is_some()
    }

    /// True if any of proving, settlement or persistence did not go through.
    pub fn is_degraded(&self) -> bool {
        !self.proof_present()
            || !self.settlement.is_submitted()
            || self.persistence != PersistenceStatus::Persisted
    }
}

use alpen_rollup_common::BatchIdx;
use alpen_rollup_primitives::FieldElement;
use serde::Serialize;

/// Point-in-time view of the sequencer for health and state queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SequencerStatus {
    /// False once a persistence write has failed.
    pub healthy: bool,
    pub root: FieldElement,
    /// Index of the last committed batch, carried across restarts.
    pub batch_idx: BatchIdx,
    pub accounts: usize,
    pub pending: usize,
    /// Batches processed by this process since start.
    pub batches_processed: u64,
    /// Batches that failed to apply since start. Their transactions were dropped.
    pub batches_failed: u64,
    pub txs_dropped: u64,
    pub prover_enabled: bool,
    pub settlement_enabled: bool,
}

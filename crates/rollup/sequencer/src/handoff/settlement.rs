use std::{sync::Arc, time::Duration};

use alpen_rollup_common::{
    BatchIdx, ProofMaterial, SettlementClient, SettlementOutcome, SettlementSubmission,
};
use alpen_rollup_primitives::FieldElement;
use tokio::time;
use tracing::{debug, info, warn};

pub(crate) struct SettlementHandoff {
    client: Option<Arc<dyn SettlementClient>>,
    timeout: Duration,
}

impl SettlementHandoff {
    pub(crate) fn new(client: Option<Arc<dyn SettlementClient>>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub(crate) async fn settle(
        &self,
        batch_idx: BatchIdx,
        proof: Option<&ProofMaterial>,
        old_root: FieldElement,
        new_root: FieldElement,
    ) -> SettlementOutcome {
        let Some(proof) = proof else {
            debug!(batch_idx, "no proof, skipping settlement");
            return SettlementOutcome::skipped("no proof available");
        };
        let Some(client) = &self.client else {
            debug!(batch_idx, "no settlement client configured, running in demo mode");
            return SettlementOutcome::skipped("no settlement client configured");
        };

        let submission = SettlementSubmission {
            batch_idx,
            proof: proof.clone(),
            old_root,
            new_root,
        };

        let attempt = async {
            if !client.is_connected().await {
                return SettlementOutcome::skipped("settlement client not connected");
            }
            match client.submit(submission).await {
                Ok(receipt) => {
                    info!(batch_idx, tx_ref = %receipt.tx_ref, block = ?receipt.block_number, "batch submitted for settlement");
                    SettlementOutcome::Submitted(receipt)
                }
                Err(e) => {
                    warn!(batch_idx, error = %e, "settlement submission failed");
                    SettlementOutcome::failed(e)
                }
            }
        };

        match time::timeout(self.timeout, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(batch_idx, timeout = ?self.timeout, "settlement timed out");
                SettlementOutcome::failed(format!("timed out after {:?}", self.timeout))
            }
        }
    }
}

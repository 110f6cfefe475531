use std::{sync::Arc, time::Duration};

use alpen_rollup_common::{BatchProver, ProofMaterial, ProofStatus, ProverInput};
use tokio::time;
use tracing::{info, warn};

pub(crate) struct ProofHandoff {
    prover: Option<Arc<dyn BatchProver>>,
    timeout: Duration,
}

impl ProofHandoff {
    pub(crate) fn new(prover: Option<Arc<dyn BatchProver>>, timeout: Duration) -> Self {
        Self { prover, timeout }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.prover.is_some()
    }

    /// Requests a proof for the batch described by `input`.
    ///
    /// A proof whose leading public signals are not the batch's roots is
    /// treated as a failure.
    pub(crate) async fn generate(&self, input: ProverInput) -> (Option<ProofMaterial>, ProofStatus) {
        let Some(prover) = &self.prover else {
            return (None, ProofStatus::Disabled);
        };

        let batch_idx = input.batch_idx;
        let expected = (input.old_root, input.new_root);

        match time::timeout(self.timeout, prover.generate_proof(input)).await {
            Err(_) => {
                warn!(batch_idx, timeout = ?self.timeout, "proof generation timed out, batch is commitment-only");
                (None, ProofStatus::TimedOut)
            }
            Ok(Err(e)) => {
                warn!(batch_idx, error = %e, "proof generation failed, batch is commitment-only");
                (None, ProofStatus::Failed(e.to_string()))
            }
            Ok(Ok(proof)) => match proof.public_roots() {
                Some(roots) if roots != expected => {
                    let reason = format!(
                        "proof public roots ({}, {}) do not match batch roots ({}, {})",
                        roots.0, roots.1, expected.0, expected.1
                    );
                    warn!(batch_idx, %reason, "discarding proof");
                    (None, ProofStatus::Failed(reason))
                }
                _ => {
                    info!(batch_idx, signals = proof.public_signals.len(), "proof generated");
                    (Some(proof), ProofStatus::Generated)
                }
            },
        }
    }
}

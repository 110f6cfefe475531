use async_trait::async_trait;

use crate::{ProofMaterial, ProverError, ProverInput};

/// Interface between the sequencer and the external proving toolchain.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait BatchProver: Send + Sync + 'static {
    /// Generates a validity proof for one committed batch.
    ///
    /// The returned material is opaque to the sequencer apart from the two
    /// leading public signals, which must be the batch's old and new roots.
    async fn generate_proof(&self, input: ProverInput) -> Result<ProofMaterial, ProverError>;
}

//! Types and traits shared between the sequencer and its collaborators.

pub mod logging;
mod errors;
mod traits;
mod types;

pub use errors::{ProverError, SettlementError, StorageError};
#[cfg(feature = "test-utils")]
pub use traits::{MockBatchProver, MockSettlementClient, MockStateStore};
pub use traits::{BatchProver, SettlementClient, StateStore};
pub use types::{
    BatchIdx, BatchNotification, PersistedState, PersistenceStatus, ProofMaterial, ProofStatus,
    ProverInput, SettlementOutcome, SettlementReceipt, SettlementSubmission,
    PERSISTED_STATE_VERSION,
};

mod batch;
mod persisted;
mod prover;
mod settlement;

pub use batch::{BatchIdx, BatchNotification, PersistenceStatus};
pub use persisted::{PersistedState, PERSISTED_STATE_VERSION};
pub use prover::{ProofMaterial, ProofStatus, ProverInput};
pub use settlement::{SettlementOutcome, SettlementReceipt, SettlementSubmission};

mod prover;
mod settlement;
mod storage;

#[cfg(feature = "test-utils")]
pub use prover::MockBatchProver;
pub use prover::BatchProver;
#[cfg(feature = "test-utils")]
pub use settlement::MockSettlementClient;
pub use settlement::SettlementClient;
#[cfg(feature = "test-utils")]
pub use storage::MockStateStore;
pub use storage::StateStore;

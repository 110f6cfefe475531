use alpen_rollup_common::StorageError;
use alpen_rollup_primitives::{AccountId, Balance, FieldElement, PrimitivesError};
use alpen_rollup_state::TransitionError;
use thiserror::Error;

/// A transaction was rejected before it reached the pending queue.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("sender {sender} holds {balance}, needs {amount}")]
    InsufficientBalance {
        sender: AccountId,
        balance: Balance,
        amount: Balance,
    },

    #[error("amount must be positive")]
    InvalidAmount,

    #[error("sender and receiver are the same account")]
    SelfTransfer,

    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
}

/// A batch could not be applied. The ledger is unchanged.
#[derive(Debug, Error)]
#[error("batch of {batch_len} transactions failed to apply: {source}")]
pub struct BatchApplicationError {
    pub batch_len: usize,
    #[source]
    pub source: TransitionError,
}

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    BatchApplication(#[from] BatchApplicationError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// The restored snapshot's root does not match the root recomputed from its accounts.
    #[error("snapshot root mismatch: stored {stored}, recomputed {recomputed}")]
    RootMismatch {
        stored: FieldElement,
        recomputed: FieldElement,
    },

    #[error("hashing: {0}")]
    Hash(#[from] PrimitivesError),

    /// A blocking worker panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),
}

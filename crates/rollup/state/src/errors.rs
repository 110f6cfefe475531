use alpen_rollup_primitives::{AccountId, Balance, PrimitivesError, TxSeq};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitionError {
    /// A transfer's sender was spent down by an earlier transfer in the same batch.
    #[error("tx {seq}: sender {sender} holds {balance}, needs {amount}")]
    InsufficientBalance {
        seq: TxSeq,
        sender: AccountId,
        balance: Balance,
        amount: Balance,
    },

    /// Crediting the receiver would reach the field order.
    #[error("tx {seq}: receiver {receiver} balance would overflow the field")]
    BalanceOverflow { seq: TxSeq, receiver: AccountId },

    #[error("transfer amount must be positive (tx {0})")]
    ZeroAmount(TxSeq),

    #[error("sender and receiver are the same account (tx {0})")]
    SelfTransfer(TxSeq),

    /// Rebuilt tree has no leaf for an account that was just written.
    #[error("no leaf for account {0} after rebuild")]
    MissingLeaf(AccountId),

    #[error("hashing: {0}")]
    Hash(#[from] PrimitivesError),
}

impl TransitionError {
    pub(crate) fn missing_leaf(id: &AccountId) -> Self {
        Self::MissingLeaf(id.clone())
    }
}

use thiserror::Error;

/// Errors raised while constructing or hashing primitive values.
#[derive(Debug, Error)]
pub enum PrimitivesError {
    /// Identifier cannot be encoded as a field element.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Text is not a valid field element numeral.
    #[error("invalid field element: {0:?}")]
    InvalidFieldElement(String),

    /// Text is not a valid non-negative integer.
    #[error("invalid balance: {0:?}")]
    InvalidBalance(String),

    /// Balance does not fit below the field order and cannot be committed.
    #[error("balance {0} is not below the field order")]
    BalanceOutOfRange(String),

    /// The Poseidon backend rejected its parameters or inputs.
    #[error("poseidon: {0}")]
    Hash(String),
}

impl PrimitivesError {
    pub fn invalid_identifier(id: impl Into<String>) -> Self {
        Self::InvalidIdentifier(id.into())
    }

    pub fn hash(msg: impl ToString) -> Self {
        Self::Hash(msg.to_string())
    }
}

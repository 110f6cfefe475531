use std::io;

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying database or filesystem operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Failed to serialize data.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Failed to deserialize data.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Snapshot was written by a newer format than this build understands.
    #[error("unsupported snapshot version {found} (max supported {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Creates a database error.
    pub fn database(msg: impl ToString) -> Self {
        Self::Database(msg.to_string())
    }

    /// Creates a serialization error.
    pub fn serialization(msg: impl ToString) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Creates a deserialization error.
    pub fn deserialization(msg: impl ToString) -> Self {
        Self::Deserialization(msg.to_string())
    }
}

/// Failures reported by a [`BatchProver`](crate::BatchProver).
#[derive(Debug, Error)]
pub enum ProverError {
    /// The toolchain could not be started at all.
    #[error("prover unavailable: {0}")]
    Unavailable(String),

    /// The toolchain ran but exited unsuccessfully.
    #[error("prover exited with {status}: {stderr}")]
    Toolchain { status: String, stderr: String },

    /// Output files were missing or not in the expected shape.
    #[error("malformed prover output: {0}")]
    MalformedOutput(String),

    /// The witness does not describe a valid transition.
    #[error("invalid witness: {0}")]
    InvalidWitness(String),

    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl ProverError {
    pub fn malformed(msg: impl ToString) -> Self {
        Self::MalformedOutput(msg.to_string())
    }

    pub fn invalid_witness(msg: impl ToString) -> Self {
        Self::InvalidWitness(msg.to_string())
    }
}

/// Failures reported by a [`SettlementClient`](crate::SettlementClient).
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("settlement client not connected")]
    NotConnected,

    /// The settlement layer refused the submission.
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("transport: {0}")]
    Transport(String),
}

//! Error types for initialization and configuration.

use std::io;

use alpen_rollup_common::StorageError;
use alpen_rollup_sequencer::SequencerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum InitError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("runtime: {0}")]
    RuntimeBuild(#[source] io::Error),

    #[error("config toml: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("prover backend `command` needs `prover.program`")]
    MissingProverProgram,

    #[error("transactions file: {0}")]
    MalformedTxs(#[from] serde_json::Error),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("sequencer: {0}")]
    Sequencer(#[from] SequencerError),
}

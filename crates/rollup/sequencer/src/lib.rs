//! Batch sequencer for the rollup.
//!
//! [`Sequencer`] owns the ledger and its commitment tree. It accepts transfers,
//! groups them into fixed-size batches and drives each batch through
//! proving, settlement and persistence. Outcomes are published as
//! [`BatchNotification`](alpen_rollup_common::BatchNotification)s.

mod config;
mod errors;
mod handoff;
mod notifier;
mod queue;
mod sequencer;
mod status;

pub use config::{SequencerConfig, SequencerConfigToml};
pub use errors::{BatchApplicationError, SequencerError, ValidationError};
pub use sequencer::{Sequencer, SequencerBuilder};
pub use status::SequencerStatus;

use std::{num::NonZeroUsize, time::Duration};

use serde::Deserialize;

/// Default number of transactions per batch.
const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(4).unwrap();
/// Default bound on a single proof generation.
const DEFAULT_PROOF_TIMEOUT_SECS: u64 = 120;
/// Default bound on a single settlement submission.
const DEFAULT_SETTLEMENT_TIMEOUT_SECS: u64 = 60;
/// Default number of notifications buffered per subscriber.
const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

#[derive(Clone, Debug)]
pub struct SequencerConfig {
    /// Pending transactions that trigger a batch.
    batch_size: NonZeroUsize,
    proof_timeout: Duration,
    settlement_timeout: Duration,
    /// Broadcast buffer per subscriber. Slower subscribers observe a lag.
    notification_capacity: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            proof_timeout: Duration::from_secs(DEFAULT_PROOF_TIMEOUT_SECS),
            settlement_timeout: Duration::from_secs(DEFAULT_SETTLEMENT_TIMEOUT_SECS),
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl SequencerConfig {
    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_proof_timeout(mut self, proof_timeout: Duration) -> Self {
        self.proof_timeout = proof_timeout;
        self
    }

    pub fn with_settlement_timeout(mut self, settlement_timeout: Duration) -> Self {
        self.settlement_timeout = settlement_timeout;
        self
    }

    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity.max(1);
        self
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub fn proof_timeout(&self) -> Duration {
        self.proof_timeout
    }

    pub fn settlement_timeout(&self) -> Duration {
        self.settlement_timeout
    }

    pub fn notification_capacity(&self) -> usize {
        self.notification_capacity
    }
}

/// File-facing form of [`SequencerConfig`]. Missing fields take defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SequencerConfigToml {
    pub batch_size: Option<NonZeroUsize>,
    pub proof_timeout_secs: Option<u64>,
    pub settlement_timeout_secs: Option<u64>,
    pub notification_capacity: Option<usize>,
}

impl From<SequencerConfigToml> for SequencerConfig {
    fn from(value: SequencerConfigToml) -> Self {
        let mut config = SequencerConfig::default();
        if let Some(n) = value.batch_size {
            config = config.with_batch_size(n);
        }
        if let Some(secs) = value.proof_timeout_secs {
            config = config.with_proof_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = value.settlement_timeout_secs {
            config = config.with_settlement_timeout(Duration::from_secs(secs));
        }
        if let Some(cap) = value.notification_capacity {
            config = config.with_notification_capacity(cap);
        }
        config
    }
}

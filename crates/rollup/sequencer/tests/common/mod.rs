//! Shared fixtures for the sequencer integration tests.

#![allow(dead_code, unreachable_pub, reason = "not every test binary uses every helper")]

use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use alpen_rollup_common::{
    BatchProver, ProofMaterial, ProverError, ProverInput, SettlementClient, SettlementError,
    SettlementReceipt, SettlementSubmission, StateStore,
};
use alpen_rollup_database::InMemoryStateStore;
use alpen_rollup_primitives::{AccountId, Balance};
use alpen_rollup_sequencer::{Sequencer, SequencerBuilder, SequencerConfig};
use async_trait::async_trait;
use serde_json::json;

pub fn id(s: &str) -> AccountId {
    AccountId::new(s).unwrap()
}

pub fn config(batch_size: usize) -> SequencerConfig {
    SequencerConfig::default()
        .with_batch_size(NonZeroUsize::new(batch_size).unwrap())
        .with_proof_timeout(Duration::from_secs(5))
        .with_settlement_timeout(Duration::from_secs(5))
}

pub fn builder(store: Arc<dyn StateStore>, batch_size: usize) -> SequencerBuilder {
    Sequencer::builder(store).with_config(config(batch_size))
}

/// Seeds `{a: 1000, b: 500, c: 200, d: 100}` in that order.
pub async fn seed_abcd(seq: &Sequencer) {
    for (name, bal) in [("a", 1000u64), ("b", 500), ("c", 200), ("d", 100)] {
        seq.seed_account(id(name), Balance::from(bal)).await.unwrap();
    }
}

pub async fn abcd_sequencer(batch_size: usize) -> (Sequencer, Arc<InMemoryStateStore>) {
    let store = Arc::new(InMemoryStateStore::new());
    let seq = builder(store.clone(), batch_size).build().await.unwrap();
    seed_abcd(&seq).await;
    (seq, store)
}

pub fn balance(seq: &Sequencer, name: &str) -> Balance {
    seq.balance_of(&id(name))
}

/// Prover that answers only after `delay`.
#[derive(Debug)]
pub struct SlowProver {
    pub delay: Duration,
}

#[async_trait]
impl BatchProver for SlowProver {
    async fn generate_proof(&self, input: ProverInput) -> Result<ProofMaterial, ProverError> {
        tokio::time::sleep(self.delay).await;
        Ok(ProofMaterial::new(json!({}), vec![input.old_root, input.new_root]))
    }
}

/// Connected settlement client that answers only after `delay`.
#[derive(Debug)]
pub struct SlowSettlement {
    pub delay: Duration,
}

#[async_trait]
impl SettlementClient for SlowSettlement {
    async fn is_connected(&self) -> bool {
        true
    }

    async fn submit(
        &self,
        submission: SettlementSubmission,
    ) -> Result<SettlementReceipt, SettlementError> {
        tokio::time::sleep(self.delay).await;
        Ok(SettlementReceipt {
            tx_ref: submission.new_root.to_string(),
            block_number: None,
            finalized: false,
        })
    }
}

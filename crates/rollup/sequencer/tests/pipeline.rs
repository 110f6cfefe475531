//! Batch formation, application and notification.

mod common;

use std::sync::Arc;

use alpen_rollup_common::{PersistenceStatus, ProofStatus, SettlementOutcome};
use alpen_rollup_database::InMemoryStateStore;
use alpen_rollup_primitives::{Balance, FieldElement};
use alpen_rollup_prover::NativeProver;
use alpen_rollup_sequencer::{Sequencer, SequencerError, ValidationError};
use alpen_rollup_state::{CommitmentTree, Ledger};
use common::*;
use num_bigint::BigUint;
use tokio::sync::broadcast::error::TryRecvError;

#[tokio::test]
async fn test_round_robin_batch_fires_on_fourth_submit() {
    let (seq, _store) = abcd_sequencer(4).await;
    let mut rx = seq.subscribe();
    let root0 = seq.root();

    seq.submit_transaction("A", "B", 100u64).await.unwrap();
    seq.submit_transaction("B", "C", 50u64).await.unwrap();
    seq.submit_transaction("C", "D", 25u64).await.unwrap();
    assert_eq!(seq.pending_count(), 3);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    // nothing applied yet
    assert_eq!(balance(&seq, "a"), Balance::from(1000));

    seq.submit_transaction("D", "A", 10u64).await.unwrap();
    assert_eq!(seq.pending_count(), 0);

    assert_eq!(balance(&seq, "a"), Balance::from(910));
    assert_eq!(balance(&seq, "b"), Balance::from(550));
    assert_eq!(balance(&seq, "c"), Balance::from(225));
    assert_eq!(balance(&seq, "d"), Balance::from(115));
    let total: BigUint = seq.accounts().iter().map(|(_, b)| b.as_biguint()).sum();
    assert_eq!(total, BigUint::from(1800u32));

    let note = rx.try_recv().unwrap();
    assert_eq!(note.batch_idx, 1);
    assert_eq!(note.transactions.len(), 4);
    assert_eq!(note.old_root, root0);
    assert_eq!(note.new_root, seq.root());
    assert!(!note.proof_present());
    assert_eq!(note.proof_status, ProofStatus::Disabled);
    assert!(matches!(note.settlement, SettlementOutcome::Skipped { .. }));
    assert_eq!(note.persistence, PersistenceStatus::Persisted);
}

#[tokio::test]
async fn test_fifo_batching_leaves_fifth_pending() {
    let (seq, _store) = abcd_sequencer(4).await;
    let mut rx = seq.subscribe();

    let mut seqs = Vec::new();
    for _ in 0..5 {
        seqs.push(seq.submit_transaction("a", "b", 1u64).await.unwrap().seq());
    }

    let note = rx.try_recv().unwrap();
    let batched: Vec<_> = note.transactions.iter().map(|t| t.seq()).collect();
    assert_eq!(batched, seqs[..4]);
    assert_eq!(seq.pending_count(), 1);
    assert_eq!(balance(&seq, "a"), Balance::from(996));
}

#[tokio::test]
async fn test_empty_process_batch_is_noop() {
    let (seq, store) = abcd_sequencer(4).await;
    let mut rx = seq.subscribe();
    let root = seq.root();
    let saved = store.current();

    assert!(seq.process_batch().await.unwrap().is_none());
    assert!(seq.flush().await.unwrap().is_none());

    assert_eq!(seq.root(), root);
    assert_eq!(store.current(), saved);
    assert_eq!(seq.status().batch_idx, 0);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_flush_processes_partial_batch() {
    let (seq, _store) = abcd_sequencer(4).await;
    seq.submit_transaction("a", "e", 30u64).await.unwrap();
    seq.submit_transaction("b", "e", 20u64).await.unwrap();

    let note = seq.flush().await.unwrap().unwrap();
    assert_eq!(note.transactions.len(), 2);
    assert_eq!(balance(&seq, "e"), Balance::from(50));
    assert_eq!(seq.pending_count(), 0);
    assert_eq!(seq.accounts().last().unwrap().0, id("e"));
}

#[tokio::test]
async fn test_validation_rejects_without_queueing() {
    let (seq, _store) = abcd_sequencer(4).await;

    let err = seq.submit_transaction("d", "a", 101u64).await.unwrap_err();
    assert!(matches!(
        err,
        SequencerError::Validation(ValidationError::InsufficientBalance { .. })
    ));
    assert!(matches!(
        seq.submit_transaction("a", "b", 0u64).await,
        Err(SequencerError::Validation(ValidationError::InvalidAmount))
    ));
    assert!(matches!(
        seq.submit_transaction("", "b", 1u64).await,
        Err(SequencerError::Validation(ValidationError::InvalidIdentifier(_)))
    ));
    assert!(matches!(
        seq.submit_transaction("a", "A", 1u64).await,
        Err(SequencerError::Validation(ValidationError::SelfTransfer))
    ));
    // unknown senders hold nothing
    assert!(seq.submit_transaction("ghost", "a", 1u64).await.is_err());

    assert_eq!(seq.pending_count(), 0);
}

#[tokio::test]
async fn test_queued_debits_count_against_sender() {
    let (seq, _store) = abcd_sequencer(3).await;
    let mut rx = seq.subscribe();

    seq.submit_transaction("a", "e", 5u64).await.unwrap();
    seq.submit_transaction("d", "b", 80u64).await.unwrap();
    // d holds 100 but 80 is already queued
    match seq.submit_transaction("d", "c", 80u64).await.unwrap_err() {
        SequencerError::Validation(ValidationError::InsufficientBalance { balance, .. }) => {
            assert_eq!(balance, Balance::from(20));
        }
        other => panic!("expected insufficient balance, got {other:?}"),
    }
    assert_eq!(seq.pending_count(), 2);

    // a third party fills the batch and it lands with everyone's transfers
    seq.submit_transaction("b", "c", 1u64).await.unwrap();
    let note = rx.try_recv().unwrap();
    assert_eq!(note.transactions.len(), 3);
    assert_eq!(balance(&seq, "e"), Balance::from(5));
    assert_eq!(balance(&seq, "d"), Balance::from(20));
    assert_eq!(balance(&seq, "c"), Balance::from(201));

    let status = seq.status();
    assert_eq!(status.batch_idx, 1);
    assert_eq!(status.batches_failed, 0);
    assert_eq!(status.txs_dropped, 0);

    // committed debits no longer count twice
    seq.submit_transaction("d", "c", 20u64).await.unwrap();
    assert_eq!(seq.pending_count(), 1);
}

#[tokio::test]
async fn test_batch_failing_at_apply_is_dropped_and_counted() {
    let (seq, _store) = abcd_sequencer(2).await;
    let mut rx = seq.subscribe();

    seq.submit_transaction("d", "a", 80u64).await.unwrap();
    // lowering d under its queued debit invalidates the batch
    let root = seq.seed_account(id("d"), Balance::from(10)).await.unwrap();

    let err = seq.submit_transaction("a", "e", 5u64).await.unwrap_err();
    assert!(matches!(err, SequencerError::BatchApplication(_)));

    assert_eq!(seq.root(), root);
    assert_eq!(balance(&seq, "d"), Balance::from(10));
    assert_eq!(balance(&seq, "a"), Balance::from(1000));
    assert_eq!(balance(&seq, "e"), Balance::zero());
    assert_eq!(seq.pending_count(), 0);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    let status = seq.status();
    assert_eq!(status.batch_idx, 0);
    assert_eq!(status.batches_processed, 0);
    assert_eq!(status.batches_failed, 1);
    assert_eq!(status.txs_dropped, 2);

    // the dropped debit is released
    seq.submit_transaction("d", "a", 10u64).await.unwrap();
    assert_eq!(seq.pending_count(), 1);
}

#[tokio::test]
async fn test_lagging_or_dropped_observers_do_not_block_others() {
    let store = Arc::new(InMemoryStateStore::new());
    let seq = Sequencer::builder(store)
        .with_config(config(1).with_notification_capacity(2))
        .build()
        .await
        .unwrap();
    seed_abcd(&seq).await;

    let mut live = seq.subscribe();
    let mut lagging = seq.subscribe();
    drop(seq.subscribe());

    let mut seen = Vec::new();
    for _ in 0..5 {
        seq.submit_transaction("a", "b", 1u64).await.unwrap();
        seen.push(live.try_recv().unwrap().batch_idx);
    }
    assert_eq!(seen, [1, 2, 3, 4, 5]);
    assert_eq!(seq.status().batches_processed, 5);
    assert_eq!(balance(&seq, "b"), Balance::from(505));

    // the slow observer skips ahead to what the channel still holds
    assert!(matches!(lagging.try_recv(), Err(TryRecvError::Lagged(3))));
    assert_eq!(lagging.try_recv().unwrap().batch_idx, 4);
    assert_eq!(lagging.try_recv().unwrap().batch_idx, 5);
}

#[tokio::test]
async fn test_root_matches_fresh_rebuild() {
    let (seq, _store) = abcd_sequencer(3).await;
    for (from, to, amt) in [("a", "x", 5u64), ("c", "b", 2), ("c", "a", 9), ("b", "y", 1)] {
        seq.submit_transaction(from, to, amt).await.unwrap();
    }
    seq.flush().await.unwrap();

    let ledger = Ledger::from_snapshot(seq.accounts());
    let rebuilt = CommitmentTree::from_ledger(&ledger).unwrap();
    assert_eq!(rebuilt.root(), seq.root());
    assert_ne!(seq.root(), FieldElement::zero());
}

#[tokio::test]
async fn test_account_proof_verifies_against_root() {
    let (seq, _store) = abcd_sequencer(4).await;
    let proof = seq.account_proof(&id("c")).unwrap();
    assert_eq!(proof.root, seq.root());
    assert_eq!(proof.leaf_index, 2);
    assert!(proof.verify().unwrap());
    assert!(seq.account_proof(&id("nobody")).is_none());
}

#[tokio::test]
async fn test_native_prover_path_reports_proof() {
    let store = Arc::new(InMemoryStateStore::new());
    let seq = builder(store, 2)
        .with_prover(Arc::new(NativeProver))
        .build()
        .await
        .unwrap();
    seed_abcd(&seq).await;

    seq.submit_transaction("a", "b", 1u64).await.unwrap();
    seq.submit_transaction("b", "c", 2u64).await.unwrap();
    let note = seq.flush().await.unwrap();
    assert!(note.is_none(), "threshold already drained the queue");

    let status = seq.status();
    assert!(status.prover_enabled);
    assert!(!status.settlement_enabled);
    assert_eq!(status.batch_idx, 1);
}

#[tokio::test]
async fn test_native_prover_notification_has_roots() {
    let store = Arc::new(InMemoryStateStore::new());
    let seq = builder(store, 2)
        .with_prover(Arc::new(NativeProver))
        .build()
        .await
        .unwrap();
    seed_abcd(&seq).await;
    let mut rx = seq.subscribe();

    seq.submit_transaction("a", "b", 1u64).await.unwrap();
    seq.submit_transaction("b", "c", 2u64).await.unwrap();

    let note = rx.recv().await.unwrap();
    assert!(note.proof_present());
    assert_eq!(note.proof_status, ProofStatus::Generated);
    let proof = note.proof.as_ref().unwrap();
    assert_eq!(proof.public_roots(), Some((note.old_root, note.new_root)));
    // no settlement client configured
    assert!(matches!(note.settlement, SettlementOutcome::Skipped { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submits_conserve_balance() {
    let (seq, _store) = abcd_sequencer(4).await;
    let seq = Arc::new(seq);

    let mut handles = Vec::new();
    for i in 0..40u64 {
        let seq = seq.clone();
        handles.push(tokio::spawn(async move {
            let (from, to) = if i % 2 == 0 { ("a", "b") } else { ("b", "a") };
            seq.submit_transaction(from, to, 1u64).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }
    seq.flush().await.unwrap();

    assert_eq!(seq.pending_count(), 0);
    assert_eq!(seq.status().batch_idx, 10);
    let total: BigUint = seq.accounts().iter().map(|(_, b)| b.as_biguint()).sum();
    assert_eq!(total, BigUint::from(1800u32));
    assert_eq!(balance(&seq, "a"), Balance::from(1000));
    assert_eq!(balance(&seq, "b"), Balance::from(500));
}

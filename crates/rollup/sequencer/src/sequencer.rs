//! The batch sequencer: ingress, batching and the per-batch pipeline.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use alpen_rollup_common::{
    BatchIdx, BatchNotification, BatchProver, PersistedState, PersistenceStatus, ProverInput,
    SettlementClient, StateStore,
};
use alpen_rollup_primitives::{AccountId, Balance, FieldElement, PrimitivesError, Transaction};
use alpen_rollup_state::{apply_transfers, CommitmentTree, Ledger, MerkleProof};
use chrono::Utc;
use parking_lot::RwLock;
use tokio::{
    sync::{broadcast, Mutex},
    task,
};
use tracing::{debug, error, field, info, instrument, warn, Span};

use crate::{
    handoff::{ProofHandoff, SettlementHandoff},
    notifier::BatchNotifier,
    queue::PendingQueue,
    BatchApplicationError, SequencerConfig, SequencerError, SequencerStatus, ValidationError,
};

/// Ledger, tree and batch counter as of the last committed batch.
#[derive(Clone, Debug, Default)]
struct CommittedState {
    ledger: Ledger,
    tree: CommitmentTree,
    batch_idx: BatchIdx,
}

impl CommittedState {
    fn to_persisted(&self) -> PersistedState {
        PersistedState::new(self.tree.root(), self.batch_idx, self.ledger.snapshot())
    }
}

async fn blocking<T, F>(f: F) -> Result<T, SequencerError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| SequencerError::Worker(e.to_string()))
}

/// Builds a [`Sequencer`], restoring state from the store.
pub struct SequencerBuilder {
    config: SequencerConfig,
    store: Arc<dyn StateStore>,
    prover: Option<Arc<dyn BatchProver>>,
    settlement: Option<Arc<dyn SettlementClient>>,
}

impl fmt::Debug for SequencerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencerBuilder")
            .field("config", &self.config)
            .field("prover", &self.prover.is_some())
            .field("settlement", &self.settlement.is_some())
            .finish_non_exhaustive()
    }
}

impl SequencerBuilder {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            config: SequencerConfig::default(),
            store,
            prover: None,
            settlement: None,
        }
    }

    pub fn with_config(mut self, config: SequencerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_prover(mut self, prover: Arc<dyn BatchProver>) -> Self {
        self.prover = Some(prover);
        self
    }

    pub fn with_settlement_client(mut self, client: Arc<dyn SettlementClient>) -> Self {
        self.settlement = Some(client);
        self
    }

    /// Loads the persisted snapshot, if any, and starts the sequencer on it.
    ///
    /// Accounts are replayed in snapshot order, so leaf indices come back as
    /// they were. A root that does not match the replayed accounts is fatal,
    /// except for unversioned snapshots, which only warn.
    pub async fn build(self) -> Result<Sequencer, SequencerError> {
        let state = match self.store.load().await? {
            Some(snapshot) => restore(snapshot).await?,
            None => {
                info!("no persisted state, starting with an empty ledger");
                CommittedState::default()
            }
        };

        Ok(Sequencer {
            proof: ProofHandoff::new(self.prover, self.config.proof_timeout()),
            settlement: SettlementHandoff::new(self.settlement, self.config.settlement_timeout()),
            notifier: BatchNotifier::new(self.config.notification_capacity()),
            config: self.config,
            state: RwLock::new(state),
            queue: PendingQueue::new(),
            batch_lock: Mutex::new(()),
            store: self.store,
            healthy: AtomicBool::new(true),
            batches_processed: AtomicU64::new(0),
            batches_failed: AtomicU64::new(0),
            txs_dropped: AtomicU64::new(0),
        })
    }
}

async fn restore(snapshot: PersistedState) -> Result<CommittedState, SequencerError> {
    let legacy = snapshot.is_legacy();
    let stored_root = snapshot.root;
    let batch_idx = snapshot.batch_idx;

    let (ledger, tree) = blocking(move || {
        let ledger = Ledger::from_snapshot(snapshot.accounts);
        CommitmentTree::from_ledger(&ledger).map(|tree| (ledger, tree))
    })
    .await??;

    let recomputed = tree.root();
    if recomputed != stored_root {
        if !legacy {
            error!(%stored_root, %recomputed, "persisted root does not match accounts");
            return Err(SequencerError::RootMismatch {
                stored: stored_root,
                recomputed,
            });
        }
        warn!(%stored_root, %recomputed, "unversioned snapshot root differs, using recomputed root");
    }

    info!(accounts = ledger.len(), batch_idx, root = %recomputed, "restored persisted state");
    Ok(CommittedState {
        ledger,
        tree,
        batch_idx,
    })
}

/// Layer-2 transaction sequencer.
///
/// Validates incoming transfers against committed balances less the sender's
/// queued debits, queues them, and
/// whenever `batch_size` are pending runs one batch through
/// apply, commit, prove, settle, persist and notify. At most one batch runs
/// at a time. Queries only take a read lock and never wait on a batch.
pub struct Sequencer {
    config: SequencerConfig,
    state: RwLock<CommittedState>,
    queue: PendingQueue,
    /// Serializes batch processing, seeding and shutdown.
    batch_lock: Mutex<()>,
    proof: ProofHandoff,
    settlement: SettlementHandoff,
    store: Arc<dyn StateStore>,
    notifier: BatchNotifier,
    healthy: AtomicBool,
    batches_processed: AtomicU64,
    batches_failed: AtomicU64,
    txs_dropped: AtomicU64,
}

impl fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("config", &self.config)
            .field("pending", &self.queue.len())
            .field("healthy", &self.is_healthy())
            .finish_non_exhaustive()
    }
}

impl Sequencer {
    pub fn builder(store: Arc<dyn StateStore>) -> SequencerBuilder {
        SequencerBuilder::new(store)
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Parses raw identifiers and submits a transfer.
    pub async fn submit_transaction(
        &self,
        from: &str,
        to: &str,
        amount: impl Into<Balance>,
    ) -> Result<Transaction, SequencerError> {
        let sender =
            AccountId::new(from).map_err(|_| ValidationError::InvalidIdentifier(from.to_owned()))?;
        let receiver =
            AccountId::new(to).map_err(|_| ValidationError::InvalidIdentifier(to.to_owned()))?;
        self.add_transaction(sender, receiver, amount.into()).await
    }

    /// Validates and enqueues a transfer.
    ///
    /// The sender must cover `amount` from its committed balance after the
    /// debits it already has queued. If this fills a batch, the batch is
    /// processed before returning. An error from that batch is returned here
    /// too: the transfer was dropped with its batch and will not be applied.
    pub async fn add_transaction(
        &self,
        sender: AccountId,
        receiver: AccountId,
        amount: Balance,
    ) -> Result<Transaction, SequencerError> {
        Self::validate(&sender, &receiver, &amount)?;

        // State before queue, the same order commit takes them in.
        let (tx, pending) = {
            let state = self.state.read();
            let committed = state.ledger.balance_of(&sender);
            self.queue.push(sender, receiver, amount, &committed)?
        };
        debug!(seq = tx.seq(), sender = %tx.sender(), receiver = %tx.receiver(), amount = %tx.amount(), pending, "accepted transaction");

        let batch_size = self.config.batch_size().get();
        if pending >= batch_size {
            while self.run_batch(batch_size).await?.is_some() {}
        }
        Ok(tx)
    }

    fn validate(
        sender: &AccountId,
        receiver: &AccountId,
        amount: &Balance,
    ) -> Result<(), ValidationError> {
        if amount.is_zero() {
            return Err(ValidationError::InvalidAmount);
        }
        if sender == receiver {
            return Err(ValidationError::SelfTransfer);
        }
        Ok(())
    }

    /// Processes one batch of up to `batch_size` pending transactions.
    ///
    /// Returns `None` without touching any state if nothing is pending.
    pub async fn process_batch(&self) -> Result<Option<Arc<BatchNotification>>, SequencerError> {
        self.run_batch(1).await
    }

    /// Forces a batch even below the size threshold.
    pub async fn flush(&self) -> Result<Option<Arc<BatchNotification>>, SequencerError> {
        let pending = self.queue.len();
        if pending > 0 {
            info!(pending, "flushing pending transactions");
        }
        self.process_batch().await
    }

    /// Runs a batch if at least `min` transactions are pending once the batch lock is held.
    #[instrument(skip(self), fields(batch_idx = field::Empty))]
    async fn run_batch(
        &self,
        min: usize,
    ) -> Result<Option<Arc<BatchNotification>>, SequencerError> {
        let _guard = self.batch_lock.lock().await;

        let Some(txs) = self.queue.take_batch(min, self.config.batch_size().get()) else {
            return Ok(None);
        };

        // apply
        let current = self.state.read().clone();
        let batch_len = txs.len();
        let applied = {
            let txs = txs.clone();
            blocking(move || apply_transfers(&current.ledger, &current.tree, &txs)).await?
        };
        let transition = match applied {
            Ok(t) => t,
            Err(source) => {
                self.queue.release(&txs);
                self.batches_failed.fetch_add(1, Ordering::Relaxed);
                self.txs_dropped.fetch_add(batch_len as u64, Ordering::Relaxed);
                let first = txs.first().map(Transaction::seq);
                let last = txs.last().map(Transaction::seq);
                error!(error = %source, batch_len, ?first, ?last, "batch failed to apply, dropping its transactions");
                return Err(BatchApplicationError { batch_len, source }.into());
            }
        };

        // commit
        let (batch_idx, persisted) = {
            let mut state = self.state.write();
            state.batch_idx += 1;
            state.ledger = transition.ledger;
            state.tree = transition.tree;
            // under the write lock so ingress never sees the debits twice
            self.queue.release(&txs);
            (state.batch_idx, state.to_persisted())
        };
        Span::current().record("batch_idx", batch_idx);
        let (old_root, new_root) = (transition.old_root, transition.new_root);
        info!(batch_idx, batch_len, %old_root, %new_root, "committed batch");

        // prove
        let input = ProverInput {
            batch_idx,
            old_root,
            new_root,
            transfers: transition.witnesses,
        };
        let (proof, proof_status) = self.proof.generate(input).await;

        // settle
        let settlement = self
            .settlement
            .settle(batch_idx, proof.as_ref(), old_root, new_root)
            .await;

        // persist
        let persistence = self.persist(persisted).await;

        // notify
        let notification = Arc::new(BatchNotification {
            batch_idx,
            transactions: txs,
            old_root,
            new_root,
            proof,
            proof_status,
            settlement,
            persistence,
            timestamp: Utc::now(),
        });
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.notifier.publish(notification.clone());

        if notification.is_degraded() {
            warn!(batch_idx, proof_present = notification.proof_present(), settlement = ?notification.settlement, "batch completed in degraded mode");
        }
        Ok(Some(notification))
    }

    async fn persist(&self, snapshot: PersistedState) -> PersistenceStatus {
        let batch_idx = snapshot.batch_idx;
        match self.store.save(snapshot).await {
            Ok(()) => PersistenceStatus::Persisted,
            Err(e) => {
                self.healthy.store(false, Ordering::SeqCst);
                error!(batch_idx, error = %e, "failed to persist state, marking sequencer unhealthy");
                PersistenceStatus::Failed(e.to_string())
            }
        }
    }

    /// Sets an account balance directly and persists the result.
    ///
    /// Used for genesis allocations and deposits. Runs under the batch lock.
    pub async fn seed_account(
        &self,
        id: AccountId,
        balance: Balance,
    ) -> Result<FieldElement, SequencerError> {
        let _guard = self.batch_lock.lock().await;

        let mut next = self.state.read().clone();
        next.ledger.upsert(id.clone(), balance.clone());
        let next = blocking(move || -> Result<CommittedState, PrimitivesError> {
            next.tree.rebuild(&next.ledger)?;
            Ok(next)
        })
        .await??;

        let root = next.tree.root();
        let persisted = next.to_persisted();
        *self.state.write() = next;
        info!(account = %id, %balance, %root, "seeded account");

        if let Err(e) = self.store.save(persisted).await {
            self.healthy.store(false, Ordering::SeqCst);
            error!(error = %e, "failed to persist seeded state");
            return Err(e.into());
        }
        Ok(root)
    }

    /// Writes a final snapshot. Pending, unbatched transactions are discarded.
    pub async fn shutdown(&self) -> Result<(), SequencerError> {
        let _guard = self.batch_lock.lock().await;

        let pending = self.queue.len();
        if pending > 0 {
            warn!(pending, "shutting down with unbatched transactions, they will be lost");
        }

        let snapshot = self.state.read().to_persisted();
        let root = snapshot.root;
        if let Err(e) = self.store.save(snapshot).await {
            self.healthy.store(false, Ordering::SeqCst);
            error!(error = %e, "final persistence flush failed");
            return Err(e.into());
        }
        info!(%root, "sequencer shut down");
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BatchNotification>> {
        self.notifier.subscribe()
    }

    /// Committed balance, zero for unknown accounts.
    pub fn balance_of(&self, id: &AccountId) -> Balance {
        self.state.read().ledger.balance_of(id)
    }

    pub fn root(&self) -> FieldElement {
        self.state.read().tree.root()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Inclusion proof of `id` against the current root.
    pub fn account_proof(&self, id: &AccountId) -> Option<MerkleProof> {
        let state = self.state.read();
        state.tree.proof(&state.ledger, id)
    }

    /// Committed accounts in leaf-index order.
    pub fn accounts(&self) -> Vec<(AccountId, Balance)> {
        self.state.read().ledger.snapshot()
    }

    /// False once any persistence write has failed.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SequencerStatus {
        let state = self.state.read();
        SequencerStatus {
            healthy: self.is_healthy(),
            root: state.tree.root(),
            batch_idx: state.batch_idx,
            accounts: state.ledger.len(),
            pending: self.queue.len(),
            batches_processed: self.batches_processed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            txs_dropped: self.txs_dropped.load(Ordering::Relaxed),
            prover_enabled: self.proof.is_enabled(),
            settlement_enabled: self.settlement.is_enabled(),
        }
    }
}

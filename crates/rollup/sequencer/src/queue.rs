//! FIFO queue of accepted, not yet batched transactions.

use std::collections::{HashMap, VecDeque};

use alpen_rollup_primitives::{AccountId, Balance, Transaction, TxSeq};
use chrono::Utc;
use parking_lot::Mutex;

use crate::ValidationError;

#[derive(Debug, Default)]
struct QueueState {
    txs: VecDeque<Transaction>,
    next_seq: TxSeq,
    /// Debits of accepted transfers not yet committed, per sender.
    reserved: HashMap<AccountId, Balance>,
}

/// Not durable. Anything still queued at crash time is lost.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    state: Mutex<QueueState>,
}

impl PendingQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stamps and enqueues a transfer if `committed` minus the sender's
    /// queued debits covers `amount`. Returns it with the queue length after
    /// insertion.
    ///
    /// Sequence numbers and reservations are updated under the queue lock, so
    /// queue order and `seq` order always agree and concurrent pushes cannot
    /// both spend the same balance.
    pub(crate) fn push(
        &self,
        sender: AccountId,
        receiver: AccountId,
        amount: Balance,
        committed: &Balance,
    ) -> Result<(Transaction, usize), ValidationError> {
        let mut st = self.state.lock();

        let reserved = st.reserved.get(&sender).cloned().unwrap_or_default();
        let available = committed.checked_sub(&reserved).unwrap_or_default();
        let new_reserved = match reserved.checked_add(&amount) {
            Some(r) if available >= amount => r,
            _ => {
                return Err(ValidationError::InsufficientBalance {
                    sender,
                    balance: available,
                    amount,
                })
            }
        };
        st.reserved.insert(sender.clone(), new_reserved);

        st.next_seq += 1;
        let tx = Transaction::new(st.next_seq, sender, receiver, amount, Utc::now());
        st.txs.push_back(tx.clone());
        Ok((tx, st.txs.len()))
    }

    /// Drops the reservations of transactions that were committed or discarded.
    pub(crate) fn release(&self, txs: &[Transaction]) {
        let mut st = self.state.lock();
        for tx in txs {
            let Some(reserved) = st.reserved.get_mut(tx.sender()) else {
                continue;
            };
            match reserved.checked_sub(tx.amount()) {
                Some(left) if !left.is_zero() => *reserved = left,
                _ => {
                    st.reserved.remove(tx.sender());
                }
            }
        }
    }

    /// Debits queued, or taken but not yet committed, for `sender`.
    #[cfg(test)]
    pub(crate) fn reserved(&self, sender: &AccountId) -> Balance {
        self.state.lock().reserved.get(sender).cloned().unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().txs.len()
    }

    /// Atomically removes up to `max` transactions from the front, but only
    /// if at least `min` are queued. Their reservations stay until [`release`].
    ///
    /// [`release`]: Self::release
    pub(crate) fn take_batch(&self, min: usize, max: usize) -> Option<Vec<Transaction>> {
        let mut st = self.state.lock();
        let len = st.txs.len();
        if len == 0 || len < min {
            return None;
        }
        Some(st.txs.drain(..len.min(max)).collect())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn push(q: &PendingQueue, amount: u64) -> Transaction {
        q.push(id("a"), id("b"), Balance::from(amount), &Balance::from(u64::MAX))
            .unwrap()
            .0
    }

    #[test]
    fn test_seq_follows_queue_order() {
        let q = PendingQueue::new();
        let seqs: Vec<_> = (1..=3).map(|i| push(&q, i).seq()).collect();
        assert_eq!(seqs, [1, 2, 3]);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_take_batch_respects_min_and_max() {
        let q = PendingQueue::new();
        for i in 1..=5 {
            push(&q, i);
        }
        assert!(q.take_batch(6, 4).is_none());

        let batch = q.take_batch(4, 4).unwrap();
        let amounts: Vec<_> = batch.iter().map(|t| t.amount().to_string()).collect();
        assert_eq!(amounts, ["1", "2", "3", "4"]);
        assert_eq!(q.len(), 1);

        assert!(q.take_batch(4, 4).is_none());
        assert_eq!(q.take_batch(1, 4).unwrap().len(), 1);
        assert!(q.take_batch(1, 4).is_none());
    }

    #[test]
    fn test_queued_debits_limit_later_pushes() {
        let q = PendingQueue::new();
        let committed = Balance::from(100);

        q.push(id("d"), id("b"), Balance::from(80), &committed).unwrap();
        let err = q
            .push(id("d"), id("c"), Balance::from(80), &committed)
            .unwrap_err();
        match err {
            ValidationError::InsufficientBalance { balance, amount, .. } => {
                assert_eq!(balance, Balance::from(20));
                assert_eq!(amount, Balance::from(80));
            }
            other => panic!("expected insufficient balance, got {other:?}"),
        }
        assert_eq!(q.len(), 1);
        assert_eq!(q.reserved(&id("d")), Balance::from(80));

        // other senders are unaffected
        q.push(id("a"), id("c"), Balance::from(80), &committed).unwrap();
        q.push(id("d"), id("c"), Balance::from(20), &committed).unwrap();
        assert_eq!(q.reserved(&id("d")), Balance::from(100));
    }

    #[test]
    fn test_release_frees_reservations() {
        let q = PendingQueue::new();
        let committed = Balance::from(10);
        q.push(id("a"), id("b"), Balance::from(4), &committed).unwrap();
        q.push(id("a"), id("c"), Balance::from(6), &committed).unwrap();

        // taking a batch keeps the debits reserved until they are committed
        let batch = q.take_batch(1, 1).unwrap();
        assert_eq!(q.reserved(&id("a")), Balance::from(10));

        q.release(&batch);
        assert_eq!(q.reserved(&id("a")), Balance::from(6));
        let rest = q.take_batch(1, 1).unwrap();
        q.release(&rest);
        assert_eq!(q.reserved(&id("a")), Balance::zero());
    }

    proptest! {
        #[test]
        fn test_batches_drain_in_submission_order(n in 1usize..40, max in 1usize..8) {
            let q = PendingQueue::new();
            for i in 0..n {
                push(&q, i as u64 + 1);
            }
            let mut seen = Vec::new();
            while let Some(batch) = q.take_batch(1, max) {
                prop_assert!(batch.len() <= max);
                seen.extend(batch.iter().map(Transaction::seq));
            }
            prop_assert_eq!(seen, (1..=n as u64).collect::<Vec<_>>());
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Balance};

/// Sequencer-assigned arrival number, strictly increasing per process.
pub type TxSeq = u64;

/// A balance transfer accepted into the pending queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    seq: TxSeq,
    sender: AccountId,
    receiver: AccountId,
    amount: Balance,
    timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        seq: TxSeq,
        sender: AccountId,
        receiver: AccountId,
        amount: Balance,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            seq,
            sender,
            receiver,
            amount,
            timestamp,
        }
    }

    pub fn seq(&self) -> TxSeq {
        self.seq
    }

    pub fn sender(&self) -> &AccountId {
        &self.sender
    }

    pub fn receiver(&self) -> &AccountId {
        &self.receiver
    }

    pub fn amount(&self) -> &Balance {
        &self.amount
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

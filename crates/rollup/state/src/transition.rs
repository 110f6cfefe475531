//! All-or-nothing application of a batch of transfers.

use alpen_rollup_primitives::{AccountId, Balance, FieldElement, Transaction};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{CommitmentTree, Ledger, MerkleProof, TransitionError};

/// One account's view of a single transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWitness {
    pub id: AccountId,
    pub balance_before: Balance,
    pub balance_after: Balance,
    /// `None` when the account did not exist before this transfer.
    pub proof_before: Option<MerkleProof>,
    pub proof_after: MerkleProof,
}

/// Everything a prover needs to check one step of the batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferWitness {
    pub tx: Transaction,
    pub root_before: FieldElement,
    pub root_after: FieldElement,
    pub sender: AccountWitness,
    pub receiver: AccountWitness,
}

/// Result of applying a batch to a staged copy of the ledger.
#[derive(Clone, Debug)]
pub struct StateTransition {
    pub old_root: FieldElement,
    pub new_root: FieldElement,
    pub ledger: Ledger,
    pub tree: CommitmentTree,
    pub witnesses: Vec<TransferWitness>,
}

/// Applies `txs` in order to a copy of `ledger`.
///
/// Each transfer is re-validated against the balances left by the transfers
/// before it. If any fails, the error is returned and neither `ledger` nor
/// `tree` is touched. `tree` must be the tree built from `ledger`.
pub fn apply_transfers(
    ledger: &Ledger,
    tree: &CommitmentTree,
    txs: &[Transaction],
) -> Result<StateTransition, TransitionError> {
    let old_root = tree.root();
    let mut staged = ledger.clone();
    let mut staged_tree = tree.clone();
    let mut witnesses = Vec::with_capacity(txs.len());

    for tx in txs {
        if tx.amount().is_zero() {
            return Err(TransitionError::ZeroAmount(tx.seq()));
        }
        if tx.sender() == tx.receiver() {
            return Err(TransitionError::SelfTransfer(tx.seq()));
        }

        let sender_before = staged.balance_of(tx.sender());
        let Some(sender_after) = sender_before.checked_sub(tx.amount()) else {
            return Err(TransitionError::InsufficientBalance {
                seq: tx.seq(),
                sender: tx.sender().clone(),
                balance: sender_before,
                amount: tx.amount().clone(),
            });
        };

        let root_before = staged_tree.root();
        let sender_proof_before = staged_tree.proof(&staged, tx.sender());
        let receiver_proof_before = staged_tree.proof(&staged, tx.receiver());

        let sender_idx = staged.upsert(tx.sender().clone(), sender_after.clone());
        let receiver_before = staged.balance_of(tx.receiver());
        let Some(receiver_after) = receiver_before.checked_add(tx.amount()) else {
            return Err(TransitionError::BalanceOverflow {
                seq: tx.seq(),
                receiver: tx.receiver().clone(),
            });
        };
        let receiver_idx = staged.upsert(tx.receiver().clone(), receiver_after.clone());

        staged_tree.rebuild(&staged)?;
        let root_after = staged_tree.root();

        let sender_proof_after = staged_tree
            .proof_at(sender_idx)
            .ok_or_else(|| TransitionError::missing_leaf(tx.sender()))?;
        let receiver_proof_after = staged_tree
            .proof_at(receiver_idx)
            .ok_or_else(|| TransitionError::missing_leaf(tx.receiver()))?;

        debug!(seq = tx.seq(), %root_before, %root_after, "applied transfer");

        witnesses.push(TransferWitness {
            tx: tx.clone(),
            root_before,
            root_after,
            sender: AccountWitness {
                id: tx.sender().clone(),
                balance_before: sender_before,
                balance_after: sender_after,
                proof_before: sender_proof_before,
                proof_after: sender_proof_after,
            },
            receiver: AccountWitness {
                id: tx.receiver().clone(),
                balance_before: receiver_before,
                balance_after: receiver_after,
                proof_before: receiver_proof_before,
                proof_after: receiver_proof_after,
            },
        });
    }

    Ok(StateTransition {
        old_root,
        new_root: staged_tree.root(),
        ledger: staged,
        tree: staged_tree,
        witnesses,
    })
}

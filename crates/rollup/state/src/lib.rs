//! Account ledger, its Poseidon commitment tree and the batch state transition.

mod errors;
mod ledger;
mod proof;
mod transition;
mod tree;

pub use errors::TransitionError;
pub use ledger::Ledger;
pub use proof::MerkleProof;
pub use transition::{apply_transfers, AccountWitness, StateTransition, TransferWitness};
pub use tree::CommitmentTree;

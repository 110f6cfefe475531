//! Best-effort handoffs to the prover and the settlement layer.
//!
//! Neither can fail a batch. Every outcome is folded into the batch's
//! recorded status.

mod proof;
mod settlement;

pub(crate) use proof::ProofHandoff;
pub(crate) use settlement::SettlementHandoff;

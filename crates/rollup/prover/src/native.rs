use alpen_rollup_common::{BatchProver, ProofMaterial, ProverError, ProverInput};
use alpen_rollup_primitives::{hash_leaf, Balance, FieldElement};
use alpen_rollup_state::{AccountWitness, MerkleProof};
use async_trait::async_trait;
use serde_json::json;
use tokio::task;
use tracing::debug;

/// Prover that checks the witness natively and returns an unproven attestation.
///
/// Useful for development and for exercising the settlement path without a
/// circuit toolchain installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeProver;

#[async_trait]
impl BatchProver for NativeProver {
    async fn generate_proof(&self, input: ProverInput) -> Result<ProofMaterial, ProverError> {
        let input = task::spawn_blocking(move || check_witness(&input).map(|()| input))
            .await
            .map_err(|e| ProverError::Unavailable(e.to_string()))??;

        debug!(batch_idx = input.batch_idx, transfers = input.transfers.len(), "native witness ok");
        Ok(ProofMaterial::new(
            json!({
                "backend": "native",
                "batch_idx": input.batch_idx,
                "transfers": input.transfers.len(),
            }),
            vec![input.old_root, input.new_root],
        ))
    }
}

/// Checks that `input` describes a valid chain of transfers from `old_root` to `new_root`.
pub fn check_witness(input: &ProverInput) -> Result<(), ProverError> {
    let mut root = input.old_root;

    for (i, w) in input.transfers.iter().enumerate() {
        if w.root_before != root {
            return Err(ProverError::invalid_witness(format!(
                "transfer {i}: root_before {} does not continue from {root}",
                w.root_before
            )));
        }

        let amount = w.tx.amount();
        if w.sender.balance_before.checked_sub(amount).as_ref() != Some(&w.sender.balance_after) {
            return Err(ProverError::invalid_witness(format!(
                "transfer {i}: sender balance does not drop by {amount}"
            )));
        }
        if w.receiver.balance_before.checked_add(amount).as_ref()
            != Some(&w.receiver.balance_after)
        {
            return Err(ProverError::invalid_witness(format!(
                "transfer {i}: receiver balance does not rise by {amount}"
            )));
        }

        check_account(i, "sender", &w.sender, w.root_before, w.root_after)?;
        check_account(i, "receiver", &w.receiver, w.root_before, w.root_after)?;
        root = w.root_after;
    }

    if root != input.new_root {
        return Err(ProverError::invalid_witness(format!(
            "final root {root} does not match claimed new root {}",
            input.new_root
        )));
    }
    Ok(())
}

fn check_account(
    i: usize,
    side: &str,
    acct: &AccountWitness,
    root_before: FieldElement,
    root_after: FieldElement,
) -> Result<(), ProverError> {
    match &acct.proof_before {
        Some(proof) => check_proof(i, side, proof, &acct.balance_before, acct, root_before)?,
        None if acct.balance_before.is_zero() => {}
        None => {
            return Err(ProverError::invalid_witness(format!(
                "transfer {i}: {side} has balance but no prior inclusion proof"
            )))
        }
    }
    check_proof(i, side, &acct.proof_after, &acct.balance_after, acct, root_after)
}

fn check_proof(
    i: usize,
    side: &str,
    proof: &MerkleProof,
    balance: &Balance,
    acct: &AccountWitness,
    root: FieldElement,
) -> Result<(), ProverError> {
    let leaf = hash_leaf(&acct.id, balance).map_err(ProverError::invalid_witness)?;
    let verified = proof.verify().map_err(ProverError::invalid_witness)?;
    if proof.leaf != leaf || proof.root != root || !verified {
        return Err(ProverError::invalid_witness(format!(
            "transfer {i}: {side} inclusion proof for {} does not verify",
            acct.id
        )));
    }
    Ok(())
}

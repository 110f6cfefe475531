use alpen_rollup_common::ProverInput;
use alpen_rollup_primitives::{encode_identifier, FieldElement, PrimitivesError};
use alpen_rollup_state::MerkleProof;
use serde::Serialize;

/// Witness-generator input in the layout the rollup circuit reads.
///
/// Every number is a decimal string. Per transfer, the sender's entry comes
/// first and the receiver's second in each of the per-account arrays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInput {
    pub old_merkle_root: String,
    pub new_merkle_root: String,
    /// `[from, to, amount]` with identifiers already field-encoded.
    pub transactions: Vec<[String; 3]>,
    pub addresses: Vec<String>,
    pub old_balances: Vec<String>,
    pub new_balances: Vec<String>,
    pub old_proofs: Vec<Vec<String>>,
    pub old_proof_indices: Vec<Vec<u8>>,
    pub new_proofs: Vec<Vec<String>>,
    pub new_proof_indices: Vec<Vec<u8>>,
}

fn path(proof: Option<&MerkleProof>) -> (Vec<String>, Vec<u8>) {
    match proof {
        Some(p) => (
            p.path_elements.iter().map(FieldElement::to_decimal_string).collect(),
            p.path_indices.clone(),
        ),
        None => (Vec::new(), Vec::new()),
    }
}

impl CircuitInput {
    pub fn from_prover_input(input: &ProverInput) -> Result<Self, PrimitivesError> {
        let mut out = Self {
            old_merkle_root: input.old_root.to_decimal_string(),
            new_merkle_root: input.new_root.to_decimal_string(),
            transactions: Vec::with_capacity(input.transfers.len()),
            addresses: Vec::new(),
            old_balances: Vec::new(),
            new_balances: Vec::new(),
            old_proofs: Vec::new(),
            old_proof_indices: Vec::new(),
            new_proofs: Vec::new(),
            new_proof_indices: Vec::new(),
        };

        for w in &input.transfers {
            let from = encode_identifier(w.sender.id.as_str())?.to_decimal_string();
            let to = encode_identifier(w.receiver.id.as_str())?.to_decimal_string();
            out.transactions
                .push([from.clone(), to.clone(), w.tx.amount().to_string()]);
            out.addresses.extend([from, to]);

            for acct in [&w.sender, &w.receiver] {
                out.old_balances.push(acct.balance_before.to_string());
                out.new_balances.push(acct.balance_after.to_string());

                let (elems, idx) = path(acct.proof_before.as_ref());
                out.old_proofs.push(elems);
                out.old_proof_indices.push(idx);

                let (elems, idx) = path(Some(&acct.proof_after));
                out.new_proofs.push(elems);
                out.new_proof_indices.push(idx);
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use alpen_rollup_primitives::{AccountId, Balance, Transaction};
    use alpen_rollup_state::{apply_transfers, CommitmentTree, Ledger};
    use chrono::Utc;

    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    /// `{a: 50, b: 5}`, then `a -> b 20` and `b -> c 25` where `c` is new.
    fn two_transfers() -> ProverInput {
        let ledger =
            Ledger::from_snapshot([(id("a"), Balance::from(50)), (id("b"), Balance::from(5))]);
        let tree = CommitmentTree::from_ledger(&ledger).unwrap();
        let txs = [
            Transaction::new(1, id("a"), id("b"), Balance::from(20), Utc::now()),
            Transaction::new(2, id("b"), id("c"), Balance::from(25), Utc::now()),
        ];
        let out = apply_transfers(&ledger, &tree, &txs).unwrap();
        ProverInput {
            batch_idx: 1,
            old_root: out.old_root,
            new_root: out.new_root,
            transfers: out.witnesses,
        }
    }

    fn enc(s: &str) -> String {
        encode_identifier(s).unwrap().to_decimal_string()
    }

    #[test]
    fn test_per_account_arrays_are_sender_then_receiver() {
        let input = two_transfers();
        let ci = CircuitInput::from_prover_input(&input).unwrap();

        assert_eq!(ci.old_merkle_root, input.old_root.to_decimal_string());
        assert_eq!(ci.new_merkle_root, input.new_root.to_decimal_string());
        assert_eq!(ci.transactions.len(), 2);
        assert_eq!(ci.transactions[1], [enc("b"), enc("c"), "25".to_owned()]);

        // two entries per transfer in every per-account array
        for len in [
            ci.addresses.len(),
            ci.old_balances.len(),
            ci.new_balances.len(),
            ci.old_proofs.len(),
            ci.old_proof_indices.len(),
            ci.new_proofs.len(),
            ci.new_proof_indices.len(),
        ] {
            assert_eq!(len, 4);
        }

        assert_eq!(ci.addresses, [enc("a"), enc("b"), enc("b"), enc("c")]);
        assert_eq!(ci.old_balances, ["50", "5", "25", "0"]);
        assert_eq!(ci.new_balances, ["30", "25", "0", "25"]);
    }

    #[test]
    fn test_new_receiver_has_empty_old_proof() {
        let input = two_transfers();
        let ci = CircuitInput::from_prover_input(&input).unwrap();

        assert!(ci.old_proofs[3].is_empty());
        assert!(ci.old_proof_indices[3].is_empty());

        // two leaves before c joins, four after
        assert_eq!(ci.old_proofs[0].len(), 1);
        assert_eq!(ci.old_proof_indices[0], [0]);
        assert_eq!(ci.old_proof_indices[1], [1]);
        assert_eq!(ci.new_proofs[0].len(), 1);
        assert_eq!(ci.new_proofs[3].len(), 2);
        assert_eq!(ci.new_proof_indices[3], [0, 1]);

        let receiver_after = &input.transfers[1].receiver.proof_after;
        assert_eq!(ci.new_proof_indices[3], receiver_after.path_indices);
        assert_eq!(
            ci.new_proofs[3],
            receiver_after
                .path_elements
                .iter()
                .map(FieldElement::to_decimal_string)
                .collect::<Vec<_>>()
        );
    }
}

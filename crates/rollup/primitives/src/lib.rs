//! Primitive types shared across the rollup sequencer: field elements, the
//! Poseidon hash adapter, account identifiers, balances and transactions.

mod account;
mod errors;
mod field;
mod hash;
mod transaction;

pub use account::{AccountId, Balance};
pub use errors::PrimitivesError;
pub use field::FieldElement;
pub use hash::{encode_identifier, hash_leaf, hash_pair, PairHasher};
pub use transaction::{Transaction, TxSeq};

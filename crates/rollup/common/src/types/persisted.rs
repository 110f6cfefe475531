use std::fmt;

use alpen_rollup_primitives::{AccountId, Balance, FieldElement};
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{BatchIdx, StorageError};

/// Current snapshot format version.
pub const PERSISTED_STATE_VERSION: u32 = 1;

/// Durable snapshot of the ledger.
///
/// ```json
/// { "version": 1, "root": "0x..", "batch_idx": 3,
///   "accounts": { "alice": { "balance": "910" } } }
/// ```
///
/// `accounts` is written and read in leaf-index order. Snapshots without a
/// `version` field load as version 0, and `merkleRoot` is accepted in place
/// of `root`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub version: u32,
    #[serde(alias = "merkleRoot")]
    pub root: FieldElement,
    #[serde(default)]
    pub batch_idx: BatchIdx,
    #[serde(with = "ordered_accounts")]
    pub accounts: Vec<(AccountId, Balance)>,
}

impl PersistedState {
    pub fn new(root: FieldElement, batch_idx: BatchIdx, accounts: Vec<(AccountId, Balance)>) -> Self {
        Self {
            version: PERSISTED_STATE_VERSION,
            root,
            batch_idx,
            accounts,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.version == 0
    }

    /// Rejects snapshots from a newer format.
    pub fn check_version(&self) -> Result<(), StorageError> {
        if self.version > PERSISTED_STATE_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: self.version,
                supported: PERSISTED_STATE_VERSION,
            });
        }
        Ok(())
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec_pretty(self).map_err(StorageError::serialization)
    }

    /// Parses and version-checks a snapshot.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, StorageError> {
        let state: Self = serde_json::from_slice(bytes).map_err(StorageError::deserialization)?;
        state.check_version()?;
        Ok(state)
    }
}

#[derive(Serialize, Deserialize)]
struct AccountRecord {
    balance: Balance,
}

mod ordered_accounts {
    use super::*;

    pub(super) fn serialize<S: Serializer>(
        accounts: &[(AccountId, Balance)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(accounts.len()))?;
        for (id, balance) in accounts {
            map.serialize_entry(
                id,
                &AccountRecord {
                    balance: balance.clone(),
                },
            )?;
        }
        map.end()
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(AccountId, Balance)>, D::Error> {
        deserializer.deserialize_map(OrderedVisitor)
    }

    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(AccountId, Balance)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of account id to { balance }")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((id, record)) = access.next_entry::<AccountId, AccountRecord>()? {
                out.push((id, record.balance));
            }
            Ok(out)
        }
    }
}

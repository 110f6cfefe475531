use async_trait::async_trait;

use crate::{PersistedState, StorageError};

/// Durable snapshot of the ledger.
///
/// There is exactly one snapshot. Every save overwrites the previous one.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Reads the snapshot, or `None` if nothing was ever saved.
    async fn load(&self) -> Result<Option<PersistedState>, StorageError>;

    /// Overwrites the snapshot.
    async fn save(&self, state: PersistedState) -> Result<(), StorageError>;
}

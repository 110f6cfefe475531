use std::{path::Path, sync::Arc};

use alpen_rollup_common::{PersistedState, StateStore, StorageError};
use async_trait::async_trait;
use tokio::task;

const SNAPSHOT_TREE: &str = "snapshot";
const SNAPSHOT_KEY: &[u8] = b"latest";

/// Snapshot kept under a single key in a sled tree.
#[derive(Debug, Clone)]
pub struct SledStateStore {
    tree: Arc<sled::Tree>,
}

impl SledStateStore {
    /// Opens (or creates) a sled database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(StorageError::database)?;
        Self::from_db(&db)
    }

    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        let tree = db.open_tree(SNAPSHOT_TREE).map_err(StorageError::database)?;
        Ok(Self {
            tree: Arc::new(tree),
        })
    }
}

#[async_trait]
impl StateStore for SledStateStore {
    async fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        let tree = self.tree.clone();
        task::spawn_blocking(move || {
            tree.get(SNAPSHOT_KEY)
                .map_err(StorageError::database)?
                .map(|bytes| PersistedState::from_json_slice(&bytes))
                .transpose()
        })
        .await
        .map_err(StorageError::database)?
    }

    async fn save(&self, state: PersistedState) -> Result<(), StorageError> {
        let bytes = state.to_json_vec()?;
        let tree = self.tree.clone();
        task::spawn_blocking(move || -> Result<(), StorageError> {
            tree.insert(SNAPSHOT_KEY, bytes)
                .map_err(StorageError::database)?;
            tree.flush().map_err(StorageError::database)?;
            Ok(())
        })
        .await
        .map_err(StorageError::database)?
    }
}

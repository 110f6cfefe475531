use alpen_rollup_common::{PersistedState, StateStore, StorageError};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Holds the snapshot in memory. Used in tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    state: Mutex<Option<PersistedState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// Last saved snapshot.
    pub fn current(&self) -> Option<PersistedState> {
        self.state.lock().clone()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        Ok(self.state.lock().clone())
    }

    async fn save(&self, state: PersistedState) -> Result<(), StorageError> {
        *self.state.lock() = Some(state);
        Ok(())
    }
}

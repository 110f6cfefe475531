use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use alpen_rollup_common::{PersistedState, StateStore, StorageError};
use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::task;
use tracing::debug;

/// Snapshot stored as a single pretty-printed JSON file.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a crash never leaves a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_snapshot(path: &Path) -> Result<Option<PersistedState>, StorageError> {
    match fs::read(path) {
        Ok(bytes) => PersistedState::from_json_slice(&bytes).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_snapshot(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        let path = self.path.clone();
        task::spawn_blocking(move || read_snapshot(&path))
            .await
            .map_err(StorageError::database)?
    }

    async fn save(&self, state: PersistedState) -> Result<(), StorageError> {
        let bytes = state.to_json_vec()?;
        let path = self.path.clone();
        task::spawn_blocking(move || write_snapshot(&path, &bytes))
            .await
            .map_err(StorageError::database)??;
        debug!(path = %self.path.display(), batch_idx = state.batch_idx, "wrote snapshot");
        Ok(())
    }
}

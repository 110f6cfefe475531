use std::{fs, path::Path, sync::Arc};

use alpen_rollup_common::{StateStore, StorageError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{FileStateStore, SledStateStore};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file at `<datadir>/<state_file>`.
    #[default]
    File,
    /// Sled database at `<datadir>/sled`.
    Sled,
}

/// Opens the configured backend under `datadir`.
pub fn open_state_store(
    backend: StorageBackend,
    datadir: &Path,
    state_file: &str,
) -> Result<Arc<dyn StateStore>, StorageError> {
    fs::create_dir_all(datadir)?;

    let store: Arc<dyn StateStore> = match backend {
        StorageBackend::File => Arc::new(FileStateStore::new(datadir.join(state_file))),
        StorageBackend::Sled => Arc::new(SledStateStore::open(&datadir.join("sled"))?),
    };
    info!(?backend, datadir = %datadir.display(), "opened state store");
    Ok(store)
}

//! Snapshot persistence backends for the sequencer ledger.

mod file;
mod init;
mod memory;
mod sleddb;

pub use file::FileStateStore;
pub use init::{open_state_store, StorageBackend};
pub use memory::InMemoryStateStore;
pub use sleddb::SledStateStore;

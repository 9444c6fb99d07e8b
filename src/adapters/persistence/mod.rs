//! Storage backends (KvStore implementations) and the collection layer above them.

pub mod collection_store;
pub mod json_file_store;
pub mod memory_store;
pub mod sqlite_store;

pub use collection_store::{Collection, CollectionStore, StagedWrite, StorageKey, Stored};
pub use json_file_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;

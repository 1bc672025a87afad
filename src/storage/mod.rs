//! Document storage.
//!
//! Two collections, `players` and `battles`, each held as a keyed in-memory
//! index and persisted as a JSON Lines log under the data directory:
//! - `players.jsonl`, keyed by player tag
//! - `battles.jsonl`, keyed by [`crate::models::BattleKey`]

mod document;
mod jsonl;

pub use document::*;
pub use jsonl::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionName {
    Players,
    Battles,
}

impl CollectionName {
    /// Get the log filename for this collection.
    pub fn filename(&self) -> &'static str {
        match self {
            CollectionName::Players => "players.jsonl",
            CollectionName::Battles => "battles.jsonl",
        }
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn collection_path(&self, collection: CollectionName) -> PathBuf {
        self.data_dir.join(collection.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(
            config.collection_path(CollectionName::Players),
            PathBuf::from("/data/players.jsonl")
        );
        assert_eq!(
            config.collection_path(CollectionName::Battles),
            PathBuf::from("/data/battles.jsonl")
        );
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }
}

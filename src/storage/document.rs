//! Keyed document store over the two collections.
//!
//! Every upsert replaces the whole document under its key and, for a
//! persistent store, appends it to the collection log. Opening a store
//! replays the log; the last line for a key wins.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{CollectionName, JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::models::{Battle, Player};

/// A document with a unique key inside its collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync {
    fn key(&self) -> String;
}

impl Document for Player {
    fn key(&self) -> String {
        self.tag.clone()
    }
}

impl Document for Battle {
    fn key(&self) -> String {
        Battle::key(self).as_str().to_string()
    }
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

struct Collection<T> {
    docs: BTreeMap<String, T>,
    log: Option<JsonlWriter<T>>,
}

impl<T: Document> Collection<T> {
    fn in_memory() -> Self {
        Self {
            docs: BTreeMap::new(),
            log: None,
        }
    }

    fn open(config: &StorageConfig, name: CollectionName) -> Result<Self, StorageError> {
        let path = config.collection_path(name);
        let mut docs = BTreeMap::new();
        let mut lines = 0usize;
        for doc in JsonlReader::<T>::new(path.clone()).read_all()? {
            lines += 1;
            docs.insert(doc.key(), doc);
        }
        info!(
            "Opened {} ({} documents from {} log lines)",
            name.filename(),
            docs.len(),
            lines
        );

        Ok(Self {
            docs,
            log: Some(JsonlWriter::new(path)),
        })
    }

    fn upsert(&mut self, doc: T) -> Result<UpsertOutcome, StorageError> {
        if let Some(log) = &self.log {
            log.append(&doc)?;
        }
        let key = doc.key();
        let outcome = match self.docs.insert(key.clone(), doc) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };
        debug!("Upserted {} ({:?})", key, outcome);
        Ok(outcome)
    }

    fn compact(&self) -> Result<(), StorageError> {
        if let Some(log) = &self.log {
            log.write_all(self.docs.values())?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.docs.clear();
        if let Some(log) = &self.log {
            log.write_all(std::iter::empty::<&T>())?;
        }
        Ok(())
    }
}

/// Handle to the `players` and `battles` collections.
///
/// Constructed once at startup and shared (behind an `Arc`) by the
/// ingestion engine and the query engine.
pub struct DocumentStore {
    players: RwLock<Collection<Player>>,
    battles: RwLock<Collection<Battle>>,
}

impl DocumentStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            players: RwLock::new(Collection::in_memory()),
            battles: RwLock::new(Collection::in_memory()),
        }
    }

    /// Open (or create) the store under `config.data_dir`.
    pub fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        Ok(Self {
            players: RwLock::new(Collection::open(config, CollectionName::Players)?),
            battles: RwLock::new(Collection::open(config, CollectionName::Battles)?),
        })
    }

    pub async fn find_player(&self, tag: &str) -> Option<Player> {
        self.players.read().await.docs.get(tag).cloned()
    }

    /// Insert the player, or replace the stored document with the same tag.
    pub async fn upsert_player(&self, player: Player) -> Result<UpsertOutcome, StorageError> {
        self.players.write().await.upsert(player)
    }

    /// Insert the battle, or replace the stored document with the same key.
    pub async fn upsert_battle(&self, battle: Battle) -> Result<UpsertOutcome, StorageError> {
        self.battles.write().await.upsert(battle)
    }

    /// Snapshot of every player, ordered by tag.
    pub async fn players(&self) -> Vec<Player> {
        self.players.read().await.docs.values().cloned().collect()
    }

    /// Snapshot of every battle, ordered by key (battle time first).
    pub async fn battles(&self) -> Vec<Battle> {
        self.battles.read().await.docs.values().cloned().collect()
    }

    pub async fn player_count(&self) -> usize {
        self.players.read().await.docs.len()
    }

    pub async fn battle_count(&self) -> usize {
        self.battles.read().await.docs.len()
    }

    /// Rewrite both logs with one line per document.
    pub async fn compact(&self) -> Result<(), StorageError> {
        self.players.read().await.compact()?;
        self.battles.read().await.compact()?;
        Ok(())
    }

    /// Delete every document from both collections.
    pub async fn reset(&self) -> Result<(), StorageError> {
        self.players.write().await.clear()?;
        self.battles.write().await.clear()?;
        info!("Removed all players and battles");
        Ok(())
    }
}

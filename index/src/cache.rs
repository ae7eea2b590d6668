use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::warn;

use crate::error::IndexError;
use crate::types::SongPhonemeIndex;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("song-indexes");

/// Persistent store for built song indexes, keyed by [`crate::cache_key`].
///
/// Implementations must be safe for concurrent use. A corrupt or missing
/// entry is a miss (`Ok(None)`), never an error; only the storage layer
/// itself may fail.
pub trait IndexCache: Send + Sync {
    /// Look up a cached index. Undecodable entries count as misses.
    fn get(&self, key: &str) -> Result<Option<SongPhonemeIndex>, IndexError>;

    /// Store an index under the given key, replacing any previous entry.
    fn put(&self, key: &str, index: &SongPhonemeIndex) -> Result<(), IndexError>;

    /// Drop one entry. Absent keys are not an error.
    fn remove(&self, key: &str) -> Result<(), IndexError>;

    /// Drop every entry.
    fn clear(&self) -> Result<(), IndexError>;
}

/// In-memory cache for tests and sessions that don't persist indexes.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, SongPhonemeIndex>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IndexCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<SongPhonemeIndex>, IndexError> {
        Ok(self.entries.read().unwrap().get(key).cloned())
    }

    fn put(&self, key: &str, index: &SongPhonemeIndex) -> Result<(), IndexError> {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), index.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), IndexError> {
        self.entries.write().unwrap().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), IndexError> {
        self.entries.write().unwrap().clear();
        Ok(())
    }
}

/// Redb-backed cache. Values are msgpack-encoded `SongPhonemeIndex`.
pub struct RedbCache {
    db: Database,
}

impl RedbCache {
    /// Open or create a cache database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let db = Database::create(path).map_err(|e| IndexError::Storage(e.to_string()))?;

        let tx = db
            .begin_write()
            .map_err(|e| IndexError::Storage(e.to_string()))?;
        {
            let _ = tx
                .open_table(TABLE)
                .map_err(|e| IndexError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| IndexError::Storage(e.to_string()))?;

        Ok(Self { db })
    }
}

impl IndexCache for RedbCache {
    fn get(&self, key: &str) -> Result<Option<SongPhonemeIndex>, IndexError> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| IndexError::Storage(e.to_string()))?;
        let table = tx
            .open_table(TABLE)
            .map_err(|e| IndexError::Storage(e.to_string()))?;

        let Some(value) = table
            .get(key)
            .map_err(|e| IndexError::Storage(e.to_string()))?
        else {
            return Ok(None);
        };

        match rmp_serde::from_slice::<SongPhonemeIndex>(value.value()) {
            Ok(index) => Ok(Some(index)),
            Err(e) => {
                // Treat a corrupt entry as a miss; it will be rebuilt and
                // overwritten.
                warn!("discarding corrupt cache entry {key}: {e}");
                Ok(None)
            }
        }
    }

    fn put(&self, key: &str, index: &SongPhonemeIndex) -> Result<(), IndexError> {
        let data =
            rmp_serde::to_vec_named(index).map_err(|e| IndexError::Serialization(e.to_string()))?;

        let tx = self
            .db
            .begin_write()
            .map_err(|e| IndexError::Storage(e.to_string()))?;
        {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| IndexError::Storage(e.to_string()))?;
            table
                .insert(key, data.as_slice())
                .map_err(|e| IndexError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| IndexError::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), IndexError> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| IndexError::Storage(e.to_string()))?;
        {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| IndexError::Storage(e.to_string()))?;
            table
                .remove(key)
                .map_err(|e| IndexError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| IndexError::Storage(e.to_string()))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), IndexError> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| IndexError::Storage(e.to_string()))?;
        {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| IndexError::Storage(e.to_string()))?;
            let keys: Vec<String> = table
                .iter()
                .map_err(|e| IndexError::Storage(e.to_string()))?
                .filter_map(|item| item.ok().map(|(k, _)| k.value().to_string()))
                .collect();
            for key in keys {
                table
                    .remove(key.as_str())
                    .map_err(|e| IndexError::Storage(e.to_string()))?;
            }
        }
        tx.commit().map_err(|e| IndexError::Storage(e.to_string()))?;
        Ok(())
    }
}

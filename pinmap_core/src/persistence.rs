//! Saving the database to, and loading it from, a key-value byte store.
//!
//! The whole database is written as one document under one key after every
//! change. There is no incremental format.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::data::database::Database;
use crate::data::pin_type::Palette;
use crate::document::{Document, DocumentError, ImportMode};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Could not encode the map document: {0}")]
    Encode(#[from] DocumentError),
}

/// A store of opaque byte blobs keyed by string.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;

    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError>;
}

/// Keeps blobs in memory. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }
}

/// Keeps each blob in its own `<key>.json` file inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Uses `dir` for storage, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        // a crash mid-write must leave the previous save intact
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Overwrites the saved copy of `db` under `key`.
pub fn save(db: &Database, store: &mut impl KeyValueStore, key: &str) -> Result<(), PersistenceError> {
    let text = Document::from_database(db).to_json()?;
    store.set(key, text.as_bytes())?;
    tracing::debug!(key, bytes = text.len(), "saved map cache");
    Ok(())
}

/// Loads the database saved under `key`. A missing entry gives an empty
/// database; so does an unreadable one, after logging a warning, so that a
/// corrupt cache never keeps the map from opening.
pub fn load(
    store: &impl KeyValueStore,
    key: &str,
    palette: Palette,
) -> Result<Database, PersistenceError> {
    let mut db = Database::with_palette(palette);
    let Some(bytes) = store.get(key)? else {
        tracing::info!(key, "no map cache found, starting empty");
        return Ok(db);
    };
    match Document::from_slice(&bytes) {
        Ok(document) => {
            let summary = document.apply(&mut db, ImportMode::Replace);
            tracing::info!(key, pins = summary.pins_added, "loaded map cache");
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "map cache load failed, starting empty");
        }
    }
    Ok(db)
}

#[cfg(test)]
mod test {
    use crate::data::pin::Pin;

    use super::*;

    fn sample() -> Database {
        let mut db = Database::new();
        db.create_category("Weapons").unwrap();
        db.create_pin_type("AK47", "Weapons", None).unwrap();
        db.place_pin(Pin::new(10.0, 20.0, "AK47").with_comment("roof")).unwrap();
        db.toggle_category_collapsed("Weapons").unwrap();
        db
    }

    #[test]
    fn memory_store_round_trip() {
        let db = sample();
        let mut store = MemoryStore::new();
        save(&db, &mut store, "cache").unwrap();

        let loaded = load(&store, "cache", Palette::default()).unwrap();
        assert_eq!(Document::from_database(&loaded), Document::from_database(&db));
        // the active pin type is not persisted
        assert_eq!(loaded.taxonomy().active_pin_type(), None);
    }

    #[test]
    fn missing_key_loads_empty() {
        let store = MemoryStore::new();
        let loaded = load(&store, "cache", Palette::default()).unwrap();
        assert!(loaded.pins().is_empty());
        assert!(loaded.taxonomy().categories().is_empty());
    }

    #[test]
    fn corrupt_cache_loads_empty() {
        let mut store = MemoryStore::new();
        store.set("cache", b"{ \"categories\": ").unwrap();
        let loaded = load(&store, "cache", Palette::default()).unwrap();
        assert!(loaded.taxonomy().categories().is_empty());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("maps")).unwrap();
        assert_eq!(store.get("cache").unwrap(), None);

        let db = sample();
        save(&db, &mut store, "cache").unwrap();
        assert!(dir.path().join("maps").join("cache.json").exists());

        let reopened = FileStore::open(dir.path().join("maps")).unwrap();
        let loaded = load(&reopened, "cache", Palette::default()).unwrap();
        assert_eq!(Document::from_database(&loaded), Document::from_database(&db));
    }
}

//! Read-only key-value providers for prediction records.
//!
//! The evaluator only ever performs point lookups. Stores are built by the
//! upstream feature extraction step and no record is ever written here.

mod embedded;
mod leveldb;

pub use embedded::SledStore;
pub use leveldb::LevelDbStore;

use crate::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// A named source of serialized records keyed by string.
pub trait RecordStore {
    /// Fetch the record stored under `key`.
    ///
    /// Returns [`Error::NotFound`] when the key is absent.
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Short name used in error messages and logs (e.g. `rgb`).
    fn name(&self) -> &str;

    fn not_found(&self, key: &str) -> Error {
        Error::NotFound { store: self.name().to_string(), key: key.to_string() }
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        (**self).get(key)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        (**self).get(key)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Database engine the prediction stores were written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum StoreEngine {
    /// LevelDB directories, as produced by the feature extraction tool
    #[default]
    #[serde(rename = "leveldb")]
    #[value(name = "leveldb")]
    LevelDb,
    /// sled databases
    #[serde(rename = "sled")]
    Sled,
}

impl StoreEngine {
    /// Open an existing store directory with this engine.
    pub fn open(self, name: &str, path: &Path) -> Result<Box<dyn RecordStore>> {
        Ok(match self {
            | StoreEngine::LevelDb => Box::new(LevelDbStore::open(name, path)?),
            | StoreEngine::Sled => Box::new(SledStore::open(name, path)?),
        })
    }
}

impl fmt::Display for StoreEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | StoreEngine::LevelDb => write!(f, "leveldb"),
            | StoreEngine::Sled => write!(f, "sled"),
        }
    }
}

/// An already open store under a second name.
///
/// Both engines lock their directory, so when the RGB and depth records
/// live in one database it is opened once and shared through an alias.
#[derive(Debug, Clone)]
pub struct StoreAlias<S> {
    name: String,
    inner: S,
}

impl<S: RecordStore> StoreAlias<S> {
    pub fn new(name: impl Into<String>, inner: S) -> Self {
        Self { name: name.into(), inner }
    }
}

impl<S: RecordStore> RecordStore for StoreAlias<S> {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.inner.get(key).map_err(|err| match err {
            | Error::NotFound { key, .. } => Error::NotFound { store: self.name.clone(), key },
            | other => other,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Whether two store paths name the same directory.
pub fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        | (Ok(a), Ok(b)) => a == b,
        | _ => a == b,
    }
}

/// In-memory store, handy for tests and for callers that already hold the
/// records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    name: String,
    records: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), records: HashMap::new() }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.records.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.records.get(key).cloned().ok_or_else(|| self.not_found(key))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_memory_store_lookup() {
        let store = MemoryStore::new("rgb").with("000000", vec![1u8, 2, 3]);
        assert_eq!(store.get("000000").unwrap(), vec![1, 2, 3]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_key_names_store() {
        let store = MemoryStore::new("depth");
        assert_matches!(
            store.get("000005"),
            Err(Error::NotFound { store, key }) if store == "depth" && key == "000005"
        );
    }

    #[test]
    fn test_boxed_store_delegates() {
        let boxed: Box<dyn RecordStore> = Box::new(MemoryStore::new("rgb").with("k", b"v".to_vec()));
        assert_eq!(boxed.name(), "rgb");
        assert_eq!(boxed.get("k").unwrap(), b"v".to_vec());
    }

    #[test]
    fn test_alias_reports_its_own_name() {
        let rgb = MemoryStore::new("rgb").with("000000", b"x".to_vec());
        let depth = StoreAlias::new("depth", &rgb);
        assert_eq!(depth.name(), "depth");
        assert_eq!(depth.get("000000").unwrap(), b"x".to_vec());
        assert_matches!(
            depth.get("000001"),
            Err(Error::NotFound { store, key }) if store == "depth" && key == "000001"
        );
    }

    #[test]
    fn test_same_location_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("rst");
        fs::create_dir(&store).unwrap();
        let dotted = dir.path().join(".").join("rst");

        assert!(same_location(&store, &dotted));
        assert!(!same_location(&store, dir.path()));
        // missing paths fall back to a plain comparison
        assert!(same_location(Path::new("nowhere"), Path::new("nowhere")));
        assert!(!same_location(Path::new("nowhere"), Path::new("elsewhere")));
    }

    #[test]
    fn test_engine_names() {
        assert_eq!(StoreEngine::default(), StoreEngine::LevelDb);
        assert_eq!(StoreEngine::LevelDb.to_string(), "leveldb");
        assert_eq!(StoreEngine::from_str("sled", false).unwrap(), StoreEngine::Sled);
        assert_eq!(StoreEngine::from_str("leveldb", false).unwrap(), StoreEngine::LevelDb);
    }

    #[test]
    fn test_engine_opens_only_existing_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        for engine in [StoreEngine::LevelDb, StoreEngine::Sled] {
            assert_matches!(engine.open("rgb", &path).err(), Some(Error::StoreError(_)));
        }
        assert!(!path.exists());
    }
}

//! Record store backed by an existing `sled` database directory.

use super::RecordStore;
use crate::{Error, Result};
use log::info;
use sled::Db;
use std::path::Path;

/// Embedded store holding one model's prediction records.
/// Uses [`sled`](https://crates.io/crates/sled), an embedded KV store.
#[derive(Debug, Clone)]
pub struct SledStore {
    name: String,
    db: Db,
}

impl SledStore {
    /// Open the database at `path`. The directory must already exist: sled
    /// would otherwise create an empty store and every lookup would miss.
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let name = name.into();
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::StoreError(format!(
                "{} store not found at {}",
                name,
                path.display()
            )));
        }
        let db = sled::Config::new()
            .path(path)
            .open()
            .map_err(|e| Error::StoreError(format!("{} store open error: {e}", name)))?;
        info!("Opened {} store at {} ({} records)", name, path.display(), db.len());
        Ok(Self { name, db })
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

impl RecordStore for SledStore {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| Error::StoreError(format!("{} store read error: {e}", self.name)))?
        {
            | Some(ivec) => Ok(ivec.to_vec()),
            | None => Err(self.not_found(key)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

//! Record store backed by an existing LevelDB directory, the format the
//! network's feature extraction tool writes its predictions in.

use super::RecordStore;
use crate::{Error, Result};
use log::info;
use rusty_leveldb::{Options, DB};
use std::cell::RefCell;
use std::fmt;
use std::path::Path;

/// LevelDB store holding one model's prediction records.
///
/// `rusty_leveldb` lookups take `&mut DB`, hence the `RefCell`.
pub struct LevelDbStore {
    name: String,
    db: RefCell<DB>,
}

impl LevelDbStore {
    /// Open the database at `path` without creating it.
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
        let mut options = Options::default();
        options.create_if_missing = false;
        let db = DB::open(path, options)
            .map_err(|e| Error::StoreError(format!("{} store open error: {e}", name)))?;
        info!("Opened {} store at {} (leveldb)", name, path.display());
        Ok(Self { name, db: RefCell::new(db) })
    }
}

impl fmt::Debug for LevelDbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelDbStore").field("name", &self.name).finish_non_exhaustive()
    }
}

impl RecordStore for LevelDbStore {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        match self.db.borrow_mut().get(key.as_bytes()) {
            | Some(value) => Ok(value),
            | None => Err(self.not_found(key)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

//! Durable key-value storage for the persisted slices of store state.
//!
//! The store only needs three string keys, so the contract is the small
//! [`KeyValueStore`] trait. [`LmdbStorage`] is the on-disk implementation
//! (one LMDB environment in a `<name>.lmdb` directory); [`MemoryStorage`]
//! keeps everything in a map for hosts without a writable disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use lmdb::{Cursor, Database, Environment, Transaction, WriteFlags};
use log::info;

use crate::error::StoreError;

pub const SETTINGS_KEY: &str = "careconnect_civic_settings";
pub const FAVORITES_KEY: &str = "careconnect_civic_favorites";
pub const USER_LOCATION_KEY: &str = "careconnect_user_location";

/// String-to-string storage the store writes on commit and reads once at startup.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// LMDB environment tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Upper bound of the memory map, in bytes.
    pub map_size: usize,
    pub max_readers: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            map_size: 10 * 1024 * 1024,
            max_readers: 126,
        }
    }
}

pub struct LmdbStorage {
    env: Environment,
    db: Database,
    path: PathBuf,
    config: StorageConfig,
}

fn storage_path(name: &str) -> PathBuf {
    PathBuf::from(format!("{name}.lmdb"))
}

impl LmdbStorage {
    /// Opens (or creates) the environment at `<name>.lmdb`.
    pub fn init(name: impl AsRef<str>) -> Result<Self, StoreError> {
        Self::init_with_config(name, StorageConfig::default())
    }

    pub fn init_with_config(name: impl AsRef<str>, config: StorageConfig) -> Result<Self, StoreError> {
        let path = storage_path(name.as_ref());
        std::fs::create_dir_all(&path)?;

        let env = Environment::new()
            .set_map_size(config.map_size)
            .set_max_readers(config.max_readers)
            .open(&path)?;
        let db = env.open_db(None)?;

        info!("LMDB environment opened at {}", path.display());
        Ok(LmdbStorage { env, db, path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored keys, in LMDB key order.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        let txn = self.env.begin_ro_txn()?;
        let keys: Vec<String> = {
            let mut cursor = txn.open_ro_cursor(self.db)?;
            cursor
                .iter()
                .map(|(key, _)| String::from_utf8_lossy(key).into_owned())
                .collect()
        };
        txn.commit()?;
        Ok(keys)
    }

    pub fn clear_all_records(&self) -> Result<(), StoreError> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.clear_db(self.db)?;
        txn.commit()?;
        Ok(())
    }

    /// Leaves an empty database at `<name>.lmdb`.
    ///
    /// Under the current name this only clears the records. Under a new name
    /// a fresh environment is opened there first, then the old one is closed
    /// and its directory deleted.
    pub fn reset_database(&mut self, name: impl AsRef<str>) -> Result<(), StoreError> {
        if storage_path(name.as_ref()) == self.path {
            self.clear_all_records()?;
            info!("LMDB environment reset in place at {}", self.path.display());
            return Ok(());
        }

        let LmdbStorage { env, db, path, .. } = Self::init_with_config(name, self.config)?;
        let old_env = std::mem::replace(&mut self.env, env);
        let old_path = std::mem::replace(&mut self.path, path);
        self.db = db;

        drop(old_env);
        std::fs::remove_dir_all(&old_path)?;
        info!("LMDB environment moved from {} to {}", old_path.display(), self.path.display());
        Ok(())
    }

    /// Flushes everything to disk. The environment itself closes on drop;
    /// after this call the handle should only be released.
    pub fn close_database(&self) -> Result<(), StoreError> {
        self.env.sync(true)?;
        info!("LMDB environment closed at {}", self.path.display());
        Ok(())
    }

    /// Closes the environment and deletes its directory.
    pub fn destroy(self) -> Result<(), StoreError> {
        let path = self.path.clone();
        drop(self);
        std::fs::remove_dir_all(&path)?;
        info!("LMDB environment removed at {}", path.display());
        Ok(())
    }
}

impl KeyValueStore for LmdbStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let txn = self.env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.commit()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &key, &value, WriteFlags::empty())?;
        txn.commit()?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) | Err(lmdb::Error::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
        txn.commit()?;
        Ok(())
    }
}

/// In-process storage; contents die with the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

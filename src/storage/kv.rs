use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use super::Repository;

/// SQLite-backed key-value store holding JSON blobs.
/// All operations are synchronous (rusqlite is blocking).
/// Callers in async contexts should use `tokio::task::spawn_blocking`.
pub struct KvStore {
    conn: Mutex<Connection>,
}

impl KvStore {
    /// Open or create the store at `db_path`, creating parent directories.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir {:?}", parent))?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open store at {:?}", db_path))?;
        let store = Self::init(conn)?;

        info!("Opened key-value store at {:?}", db_path);
        Ok(store)
    }

    /// Store that lives only as long as the process.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory store")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .context("Failed to create kv_store table")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Key-value store lock poisoned"))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn()?
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read key '{}'", key))
    }

    /// Insert or overwrite the value for `key`.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("Failed to write key '{}'", key))?;
        Ok(())
    }
}

/// A JSON value stored under one key of a shared `KvStore`.
pub struct KvRepository<T> {
    store: Arc<KvStore>,
    key: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> KvRepository<T> {
    pub fn new(store: Arc<KvStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _marker: PhantomData,
        }
    }
}

impl<T> Repository<T> for KvRepository<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<T>> {
        match self.store.get(&self.key)? {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .with_context(|| format!("Failed to decode '{}'", self.key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn save(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Failed to encode '{}'", self.key))?;
        self.store.put(&self.key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_and_get() {
        let dir = TempDir::new().unwrap();
        let store = KvStore::open(&dir.path().join("nested").join("store.db")).unwrap();

        store.put("greeting", "\"hello\"").unwrap();
        assert_eq!(store.get("greeting").unwrap().as_deref(), Some("\"hello\""));

        store.put("greeting", "\"bye\"").unwrap();
        assert_eq!(store.get("greeting").unwrap().as_deref(), Some("\"bye\""));
    }

    #[test]
    fn test_get_missing_key() {
        let store = KvStore::open_in_memory().unwrap();
        assert!(store.get("absent").unwrap().is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.db");
        {
            let store = KvStore::open(&path).unwrap();
            store.put("k", "[1,2,3]").unwrap();
        }
        let store = KvStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_repositories_share_store_independently() {
        let store = Arc::new(KvStore::open_in_memory().unwrap());
        let numbers: KvRepository<Vec<u32>> = KvRepository::new(store.clone(), "numbers");
        let words: KvRepository<Vec<String>> = KvRepository::new(store.clone(), "words");

        assert!(numbers.load().unwrap().is_none());
        numbers.save(&vec![1, 2]).unwrap();
        words.save(&vec!["a".to_string()]).unwrap();

        assert_eq!(numbers.load().unwrap(), Some(vec![1, 2]));
        assert_eq!(words.load().unwrap(), Some(vec!["a".to_string()]));
    }

    #[test]
    fn test_undecodable_value_is_error() {
        let store = Arc::new(KvStore::open_in_memory().unwrap());
        store.put("numbers", "not json").unwrap();
        let repo: KvRepository<Vec<u32>> = KvRepository::new(store, "numbers");
        let err = repo.load().unwrap_err();
        assert!(err.to_string().contains("Failed to decode 'numbers'"));
    }
}

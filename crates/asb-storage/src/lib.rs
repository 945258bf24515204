use asb_core::kv::{KvError, KvStore};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

pub const PREFS_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {found}, max supported {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },
}

impl From<StorageError> for KvError {
    fn from(err: StorageError) -> Self {
        KvError::Backend(err.to_string())
    }
}

/// In-memory store scoped to one process run. Dropped on exit, which is
/// what gives the seen-sets their session lifetime.
#[derive(Debug, Default)]
pub struct SessionStore {
    entries: HashMap<String, String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store that errors on every call. Stands in for an unavailable backend
/// when exercising degradation paths.
#[derive(Debug, Default)]
pub struct FailingStore;

impl KvStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Err(KvError::Backend("storage unavailable".to_string()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), KvError> {
        Err(KvError::Backend("storage unavailable".to_string()))
    }
}

/// Durable preference storage backed by SQLite. Survives across runs;
/// currently holds the mute flag and whatever future preferences land in
/// the `prefs` table.
pub struct PrefsStore {
    conn: Connection,
}

impl PrefsStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn schema_version(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    pub fn migrate(&self) -> Result<(), StorageError> {
        let current = self.schema_version()?;
        if current > PREFS_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedSchemaVersion {
                found: current,
                supported: PREFS_SCHEMA_VERSION,
            });
        }

        if current < 1 {
            let sql = include_str!("../migrations/0001_prefs.sql");
            self.conn.execute_batch(sql)?;
            self.conn
                .execute("PRAGMA user_version = 1", [])
                .map(|_| ())?;
        }

        Ok(())
    }

    pub fn get_pref(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM prefs WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_pref(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "
            INSERT INTO prefs (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value=excluded.value,
                updated_at=excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool, StorageError> {
        let exists = self
            .conn
            .query_row(
                "
                SELECT 1
                FROM sqlite_master
                WHERE type='table' AND name = ?1
                LIMIT 1
                ",
                [table_name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(exists.is_some())
    }
}

impl KvStore for PrefsStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.get_pref(key)?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        Ok(self.set_pref(key, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asb_core::keys;
    use tempfile::NamedTempFile;

    #[test]
    fn migration_creates_prefs_table() {
        let db = PrefsStore::open_in_memory().expect("open db");
        assert!(db.table_exists("prefs").expect("table check"));
        assert_eq!(
            db.schema_version().expect("schema version"),
            PREFS_SCHEMA_VERSION
        );
    }

    #[test]
    fn pref_roundtrip_and_upsert() {
        let db = PrefsStore::open_in_memory().expect("open db");
        assert_eq!(db.get_pref(keys::MUTED).expect("get"), None);

        db.set_pref(keys::MUTED, "true").expect("set");
        assert_eq!(
            db.get_pref(keys::MUTED).expect("get").as_deref(),
            Some("true")
        );

        db.set_pref(keys::MUTED, "false").expect("overwrite");
        assert_eq!(
            db.get_pref(keys::MUTED).expect("get").as_deref(),
            Some("false")
        );
    }

    #[test]
    fn prefs_survive_reopen() {
        let file = NamedTempFile::new().expect("temp db");
        {
            let db = PrefsStore::open(file.path()).expect("open db");
            db.set_pref(keys::MUTED, "true").expect("set");
        }

        let db = PrefsStore::open(file.path()).expect("reopen db");
        assert_eq!(
            db.get_pref(keys::MUTED).expect("get").as_deref(),
            Some("true")
        );
    }

    #[test]
    fn prefs_store_implements_the_kv_seam() {
        let mut db = PrefsStore::open_in_memory().expect("open db");
        KvStore::set(&mut db, "asb.some-key", "value").expect("kv set");
        assert_eq!(
            KvStore::get(&db, "asb.some-key").expect("kv get").as_deref(),
            Some("value")
        );
    }

    #[test]
    fn session_store_roundtrip() {
        let mut store = SessionStore::new();
        assert!(store.is_empty());
        store.set("k", "v").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn failing_store_errors_on_every_call() {
        let mut store = FailingStore;
        assert!(store.get("k").is_err());
        assert!(store.set("k", "v").is_err());
    }
}

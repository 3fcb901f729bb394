//! Small persistent key/value store backing the session.
//!
//! The SQLite store opens a short-lived connection per call, so two client
//! processes sharing a data directory always read the latest committed value.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::StorageOptions;

mod schema;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes every pair or none of them.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;

    fn remove_many(&self, keys: &[&str]) -> Result<()>;

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }
}

#[derive(Clone)]
pub struct SqliteKvStore {
    db_path: Arc<PathBuf>,
}

impl SqliteKvStore {
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.connect()?;
        f(&mut conn)
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                    row.get::<_, String>(0)
                })
                .optional()
                .with_context(|| format!("reading key {key}"))?;
            Ok(value)
        })
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.with_connection(|conn| {
            let tx = conn.transaction().context("starting kv transaction")?;
            for (key, value) in entries {
                tx.execute(
                    "INSERT INTO kv (key, value, updated_at)
                     VALUES (?1, ?2, strftime('%s', 'now'))
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![key, value],
                )
                .with_context(|| format!("writing key {key}"))?;
            }
            tx.commit().context("committing kv transaction")?;
            Ok(())
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        self.with_connection(|conn| {
            let tx = conn.transaction().context("starting kv transaction")?;
            for key in keys {
                tx.execute("DELETE FROM kv WHERE key = ?1", [key])
                    .with_context(|| format!("removing key {key}"))?;
            }
            tx.commit().context("committing kv transaction")?;
            Ok(())
        })
    }
}

/// Process-local store; nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut guard = self.entries.lock();
        for (key, value) in entries {
            guard.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut guard = self.entries.lock();
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}

pub fn init(storage: &StorageOptions) -> Result<SqliteKvStore> {
    let db_path = &storage.session_db_path;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn)?;
    schema::apply(&conn)?;
    Ok(SqliteKvStore {
        db_path: Arc::new(db_path.clone()),
    })
}

fn prepare_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.busy_timeout(std::time::Duration::from_millis(500))
        .context("setting busy timeout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_store() -> anyhow::Result<(TempDir, SqliteKvStore)> {
        let temp = TempDir::new()?;
        let options = StorageOptions {
            session_db_path: temp.path().join("data").join("session.db"),
        };
        let store = init(&options)?;
        Ok((temp, store))
    }

    #[test]
    fn values_survive_reopening() -> anyhow::Result<()> {
        let (temp, store) = init_store()?;
        store.set("token", "abc")?;
        drop(store);

        let reopened = init(&StorageOptions {
            session_db_path: temp.path().join("data").join("session.db"),
        })?;
        assert_eq!(reopened.get("token")?.as_deref(), Some("abc"));
        Ok(())
    }

    #[test]
    fn set_many_overwrites_existing_keys() -> anyhow::Result<()> {
        let (_temp, store) = init_store()?;
        store.set_many(&[("token", "one"), ("username", "ada")])?;
        store.set_many(&[("token", "two"), ("username", "grace")])?;
        assert_eq!(store.get("token")?.as_deref(), Some("two"));
        assert_eq!(store.get("username")?.as_deref(), Some("grace"));
        Ok(())
    }

    #[test]
    fn remove_many_ignores_missing_keys() -> anyhow::Result<()> {
        let (_temp, store) = init_store()?;
        store.set("token", "abc")?;
        store.remove_many(&["token", "username"])?;
        assert_eq!(store.get("token")?, None);
        assert_eq!(store.get("username")?, None);
        Ok(())
    }

    #[test]
    fn memory_store_round_trips() -> anyhow::Result<()> {
        let store = MemoryKvStore::default();
        store.set("username", "ada")?;
        assert_eq!(store.get("username")?.as_deref(), Some("ada"));
        store.remove_many(&["username"])?;
        assert_eq!(store.get("username")?, None);
        Ok(())
    }
}

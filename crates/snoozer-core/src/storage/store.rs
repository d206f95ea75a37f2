//! SQLite-backed key-value store for snooze records and recurring configs.
//!
//! One flat namespace, exactly the shape of the engine's contract: `get`,
//! `get_all`, `set`, `remove`. Values are [`StoredItem`]s serialized as
//! JSON. No cross-key transactions are offered; the engine tolerates
//! partial application through idempotent recovery on the next scan.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use super::data_dir;
use crate::error::StoreError;
use crate::record::StoredItem;

/// SQLite database holding every persisted snooze item.
pub struct SnoozeStore {
    conn: Connection,
}

impl SnoozeStore {
    /// Open the store at `~/.config/snoozer/snoozer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?
            .join("snoozer.db");
        Self::open_at(&path)
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    /// Get the item stored under `key`, if any.
    pub fn get(&self, key: &str) -> Result<Option<StoredItem>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let value = stmt
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        match value {
            Some(json) => {
                let item =
                    serde_json::from_str(&json).map_err(|source| StoreError::Codec {
                        key: key.to_string(),
                        source,
                    })?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    /// Every stored item, keyed, in key order.
    ///
    /// Rows that no longer decode are skipped with a warning rather than
    /// failing the whole snapshot; a corrupt entry must not wedge the scan.
    pub fn get_all(&self) -> Result<Vec<(String, StoredItem)>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (key, json) = row?;
            match serde_json::from_str(&json) {
                Ok(item) => items.push((key, item)),
                Err(err) => warn!(%key, %err, "skipping undecodable store entry"),
            }
        }
        Ok(items)
    }

    /// Store `item` under `key`, replacing any previous value.
    pub fn set(&self, key: &str, item: &StoredItem) -> Result<(), StoreError> {
        let json = serde_json::to_string(item).map_err(|source| StoreError::Codec {
            key: key.to_string(),
            source,
        })?;
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, json],
        )?;
        Ok(())
    }

    /// Remove the item under `key`. Removing an absent key is not an error.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::WeekdaySet;
    use crate::record::{RecordKey, RecurringConfig, SnoozeRecord};

    fn record(origin: i64, due: i64) -> SnoozeRecord {
        SnoozeRecord {
            key: RecordKey {
                origin,
                due_at_ms: due,
            },
            url: "https://a.com".into(),
            title: "a".into(),
            due_at_ms: due,
            recurring_id: None,
            processing: false,
            claimed_at_ms: None,
        }
    }

    #[test]
    fn set_get_remove_roundtrip() {
        let store = SnoozeStore::open_memory().unwrap();
        let rec = record(1, 1_000);
        let key = rec.key.to_string();

        assert!(store.get(&key).unwrap().is_none());
        store.set(&key, &StoredItem::Record(rec)).unwrap();

        match store.get(&key).unwrap() {
            Some(StoredItem::Record(got)) => assert_eq!(got.url, "https://a.com"),
            other => panic!("expected record, got {other:?}"),
        }

        store.remove(&key).unwrap();
        assert!(store.get(&key).unwrap().is_none());
        // Removing again is fine.
        store.remove(&key).unwrap();
    }

    #[test]
    fn records_and_configs_share_the_namespace() {
        let store = SnoozeStore::open_memory().unwrap();
        let rec = record(1, 2_000);
        let config = RecurringConfig {
            id: RecurringConfig::new_id(),
            url: "https://b.com".into(),
            title: "b".into(),
            time: "09:00".parse().unwrap(),
            days: WeekdaySet::new(&[1]).unwrap(),
        };

        store
            .set(&rec.key.to_string(), &StoredItem::Record(rec))
            .unwrap();
        store
            .set(&config.id, &StoredItem::Recurring(config.clone()))
            .unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert!(matches!(
            store.get(&config.id).unwrap(),
            Some(StoredItem::Recurring(_))
        ));
    }

    #[test]
    fn open_at_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snoozer.db");
        let key = record(3, 9_000).key.to_string();
        {
            let store = SnoozeStore::open_at(&path).unwrap();
            store
                .set(&key, &StoredItem::Record(record(3, 9_000)))
                .unwrap();
        }
        let store = SnoozeStore::open_at(&path).unwrap();
        assert!(store.get(&key).unwrap().is_some());
    }

    #[test]
    fn get_all_skips_corrupt_rows() {
        let store = SnoozeStore::open_memory().unwrap();
        store
            .set(&record(1, 1).key.to_string(), &StoredItem::Record(record(1, 1)))
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO kv (key, value) VALUES ('junk', 'not json')",
                [],
            )
            .unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn corrupt_single_get_is_an_error() {
        let store = SnoozeStore::open_memory().unwrap();
        store
            .conn
            .execute("INSERT INTO kv (key, value) VALUES ('junk', '{}')", [])
            .unwrap();
        assert!(matches!(
            store.get("junk"),
            Err(StoreError::Codec { .. })
        ));
    }
}

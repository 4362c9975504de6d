//! SQLite-backed `KvStore` implementation.
//!
//! # Responsibility
//! - Persist items of every logical table in the single `kv_items` table.
//! - Serve partition scans from the `date_created` secondary index.
//!
//! # Invariants
//! - `attributes` always holds a JSON object.
//! - `date_created` and `expires_at` columns mirror the item's
//!   `date_created` and `ttl` attributes after every write.

use super::{
    date_created_of, epoch_seconds, expires_at_of, resolve_sort_key, Attributes, KvStore,
    StoreError, StoreResult, StoredItem, UpdateSet,
};
use crate::db::{open_db, open_db_in_memory};
use log::debug;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

const LIVE_ITEM_FILTER: &str = "(expires_at IS NULL OR expires_at > ?)";

/// Store over one migrated SQLite connection.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    /// Opens (or creates) the database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = open_db(path).map_err(StoreError::Connection)?;
        Ok(Self::from_connection(conn))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_db_in_memory().map_err(StoreError::Connection)?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps a connection that already went through `open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

fn decode_attributes(raw: &str) -> StoreResult<Attributes> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::InvalidRecord(format!(
            "attributes must be a map, found `{other}`"
        ))),
        Err(err) => Err(StoreError::InvalidRecord(format!(
            "attributes are not valid JSON: {err}"
        ))),
    }
}

fn encode_attributes(attributes: &Attributes) -> StoreResult<String> {
    serde_json::to_string(attributes)
        .map_err(|err| StoreError::InvalidRecord(format!("attributes cannot be encoded: {err}")))
}

fn write_item(
    conn: &Connection,
    table: &str,
    partition_key: &str,
    sort_key: &str,
    attributes: &Attributes,
) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO kv_items (
            table_name,
            partition_key,
            sort_key,
            attributes,
            date_created,
            expires_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (table_name, partition_key, sort_key) DO UPDATE SET
            attributes = excluded.attributes,
            date_created = excluded.date_created,
            expires_at = excluded.expires_at;",
        params![
            table,
            partition_key,
            sort_key,
            encode_attributes(attributes)?,
            date_created_of(attributes),
            expires_at_of(attributes),
        ],
    )?;
    Ok(())
}

fn read_live_attributes(
    conn: &Connection,
    table: &str,
    partition_key: &str,
    sort_key: &str,
) -> StoreResult<Option<Attributes>> {
    let raw: Option<String> = conn
        .query_row(
            &format!(
                "SELECT attributes
                 FROM kv_items
                 WHERE table_name = ?
                   AND partition_key = ?
                   AND sort_key = ?
                   AND {LIVE_ITEM_FILTER};"
            ),
            params![table, partition_key, sort_key, epoch_seconds()],
            |row| row.get(0),
        )
        .optional()?;
    raw.as_deref().map(decode_attributes).transpose()
}

impl KvStore for SqliteKvStore {
    fn get(
        &self,
        table: &str,
        partition_key: &str,
        sort_key: Option<&str>,
    ) -> StoreResult<StoredItem> {
        let sort_key = resolve_sort_key(sort_key);
        let conn = self.conn.lock();
        let attributes = read_live_attributes(&conn, table, partition_key, sort_key)?
            .ok_or_else(|| StoreError::not_found(partition_key, sort_key))?;
        Ok(StoredItem {
            partition_key: partition_key.to_string(),
            sort_key: sort_key.to_string(),
            attributes,
        })
    }

    fn scan_partition(&self, table: &str, partition_key: &str) -> StoreResult<Vec<StoredItem>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT sort_key, attributes
             FROM kv_items
             WHERE table_name = ?
               AND partition_key = ?
               AND {LIVE_ITEM_FILTER}
             ORDER BY date_created IS NULL, date_created DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query(params![table, partition_key, epoch_seconds()])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get("attributes")?;
            items.push(StoredItem {
                partition_key: partition_key.to_string(),
                sort_key: row.get("sort_key")?,
                attributes: decode_attributes(&raw)?,
            });
        }
        Ok(items)
    }

    fn put(
        &self,
        table: &str,
        partition_key: &str,
        sort_key: &str,
        attributes: Attributes,
    ) -> StoreResult<()> {
        let conn = self.conn.lock();
        write_item(&conn, table, partition_key, sort_key, &attributes)
    }

    fn delete(
        &self,
        table: &str,
        partition_key: &str,
        sort_key: Option<&str>,
    ) -> StoreResult<()> {
        let sort_key = resolve_sort_key(sort_key);
        let conn = self.conn.lock();
        let changed = conn.execute(
            &format!(
                "DELETE FROM kv_items
                 WHERE table_name = ?
                   AND partition_key = ?
                   AND sort_key = ?
                   AND {LIVE_ITEM_FILTER};"
            ),
            params![table, partition_key, sort_key, epoch_seconds()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(partition_key, sort_key));
        }
        Ok(())
    }

    fn update(
        &self,
        table: &str,
        partition_key: &str,
        sort_key: &str,
        changes: &UpdateSet,
    ) -> StoreResult<()> {
        if changes.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut attributes = read_live_attributes(&tx, table, partition_key, sort_key)?
            .ok_or_else(|| StoreError::not_found(partition_key, sort_key))?;
        changes.apply_to(&mut attributes)?;
        write_item(&tx, table, partition_key, sort_key, &attributes)?;
        tx.commit()?;
        Ok(())
    }

    fn purge_expired(&self) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM kv_items
             WHERE expires_at IS NOT NULL
               AND expires_at <= ?1;",
            [epoch_seconds()],
        )?;
        debug!("event=purge_expired module=store status=ok removed={removed}");
        Ok(removed)
    }
}

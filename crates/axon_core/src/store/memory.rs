//! In-memory `KvStore` implementation.
//!
//! Mirrors `SqliteKvStore` semantics on an ordered map; useful for tests and
//! single-process use.

use super::{
    date_created_of, epoch_seconds, expires_at_of, is_expired, resolve_sort_key, Attributes,
    KvStore, StoreError, StoreResult, StoredItem, UpdateSet,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;

type ItemKey = (String, String, String);

#[derive(Debug, Clone)]
struct MemoryItem {
    attributes: Attributes,
    // Insertion order, kept across overwrites; breaks `date_created` ties.
    seq: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    items: BTreeMap<ItemKey, MemoryItem>,
    next_seq: u64,
}

/// Ordered-map backed store.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    state: Mutex<MemoryState>,
}

impl MemoryKvStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically stored items, expired ones included.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn item_key(table: &str, partition_key: &str, sort_key: &str) -> ItemKey {
    (
        table.to_string(),
        partition_key.to_string(),
        sort_key.to_string(),
    )
}

fn live(item: &MemoryItem, now: i64) -> bool {
    !is_expired(expires_at_of(&item.attributes), now)
}

impl KvStore for MemoryKvStore {
    fn get(
        &self,
        table: &str,
        partition_key: &str,
        sort_key: Option<&str>,
    ) -> StoreResult<StoredItem> {
        let sort_key = resolve_sort_key(sort_key);
        let state = self.state.lock();
        state
            .items
            .get(&item_key(table, partition_key, sort_key))
            .filter(|item| live(item, epoch_seconds()))
            .map(|item| StoredItem {
                partition_key: partition_key.to_string(),
                sort_key: sort_key.to_string(),
                attributes: item.attributes.clone(),
            })
            .ok_or_else(|| StoreError::not_found(partition_key, sort_key))
    }

    fn scan_partition(&self, table: &str, partition_key: &str) -> StoreResult<Vec<StoredItem>> {
        let now = epoch_seconds();
        let state = self.state.lock();
        let lower = item_key(table, partition_key, "");
        let mut matches: Vec<(Option<i64>, u64, StoredItem)> = state
            .items
            .range(lower..)
            .take_while(|((item_table, item_partition, _), _)| {
                item_table == table && item_partition == partition_key
            })
            .filter(|(_, item)| live(item, now))
            .map(|((_, item_partition, item_sort), item)| {
                (
                    date_created_of(&item.attributes),
                    item.seq,
                    StoredItem {
                        partition_key: item_partition.clone(),
                        sort_key: item_sort.clone(),
                        attributes: item.attributes.clone(),
                    },
                )
            })
            .collect();
        matches.sort_by(|left, right| right.0.cmp(&left.0).then(right.1.cmp(&left.1)));
        Ok(matches.into_iter().map(|(_, _, item)| item).collect())
    }

    fn put(
        &self,
        table: &str,
        partition_key: &str,
        sort_key: &str,
        attributes: Attributes,
    ) -> StoreResult<()> {
        let mut state = self.state.lock();
        let key = item_key(table, partition_key, sort_key);
        let existing_seq = state.items.get(&key).map(|existing| existing.seq);
        let seq = match existing_seq {
            Some(seq) => seq,
            None => {
                state.next_seq += 1;
                state.next_seq
            }
        };
        state.items.insert(key, MemoryItem { attributes, seq });
        Ok(())
    }

    fn delete(
        &self,
        table: &str,
        partition_key: &str,
        sort_key: Option<&str>,
    ) -> StoreResult<()> {
        let sort_key = resolve_sort_key(sort_key);
        let mut state = self.state.lock();
        let key = item_key(table, partition_key, sort_key);
        let is_live = state
            .items
            .get(&key)
            .is_some_and(|item| live(item, epoch_seconds()));
        if !is_live {
            return Err(StoreError::not_found(partition_key, sort_key));
        }
        state.items.remove(&key);
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
        let mut state = self.state.lock();
        let item = state
            .items
            .get_mut(&item_key(table, partition_key, sort_key))
            .filter(|item| live(item, epoch_seconds()))
            .ok_or_else(|| StoreError::not_found(partition_key, sort_key))?;

        // Apply to a copy so a failing path leaves the item untouched.
        let mut attributes = item.attributes.clone();
        changes.apply_to(&mut attributes)?;
        item.attributes = attributes;
        Ok(())
    }

    fn purge_expired(&self) -> StoreResult<usize> {
        let now = epoch_seconds();
        let mut state = self.state.lock();
        let before = state.items.len();
        state.items.retain(|_, item| live(item, now));
        Ok(before - state.items.len())
    }
}

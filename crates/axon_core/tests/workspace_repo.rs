use axon_core::store::key::note_partition;
use axon_core::store::{Attributes, StoreResult, UpdateSet};
use axon_core::{
    ChildFetchPolicy, CoreConfig, FolderChanges, FolderRepository, KvStore, MemoryKvStore,
    NoteChanges, NoteRepository, OwnerContext, RepoError, SqliteKvStore, StoreError, StoredItem,
};
use serde_json::Value;
use std::sync::Mutex;

fn alice() -> OwnerContext {
    OwnerContext::new("alice@example.com", "user-alice")
}

fn bob() -> OwnerContext {
    OwnerContext::new("bob@example.com", "user-bob")
}

/// Memory store whose partition scans fail for selected partitions.
struct FlakyStore {
    inner: MemoryKvStore,
    failing: Mutex<Vec<String>>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemoryKvStore::new(),
            failing: Mutex::new(Vec::new()),
        }
    }

    fn fail_scans_of(&self, partition_key: String) {
        self.failing.lock().unwrap().push(partition_key);
    }
}

impl KvStore for FlakyStore {
    fn get(&self, table: &str, partition_key: &str, sort_key: Option<&str>) -> StoreResult<StoredItem> {
        self.inner.get(table, partition_key, sort_key)
    }

    fn scan_partition(&self, table: &str, partition_key: &str) -> StoreResult<Vec<StoredItem>> {
        if self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|failing| failing == partition_key)
        {
            return Err(StoreError::InvalidRecord(format!("injected for {partition_key}")));
        }
        self.inner.scan_partition(table, partition_key)
    }

    fn put(&self, table: &str, partition_key: &str, sort_key: &str, attributes: Attributes) -> StoreResult<()> {
        self.inner.put(table, partition_key, sort_key, attributes)
    }

    fn delete(&self, table: &str, partition_key: &str, sort_key: Option<&str>) -> StoreResult<()> {
        self.inner.delete(table, partition_key, sort_key)
    }

    fn update(&self, table: &str, partition_key: &str, sort_key: &str, changes: &UpdateSet) -> StoreResult<()> {
        self.inner.update(table, partition_key, sort_key, changes)
    }

    fn purge_expired(&self) -> StoreResult<usize> {
        self.inner.purge_expired()
    }
}

#[test]
fn folder_and_note_lifecycle_on_sqlite() {
    let store = SqliteKvStore::open_in_memory().unwrap();
    let config = CoreConfig::default();
    let folders = FolderRepository::new(&store, &config, alice());
    let notes = NoteRepository::new(&store, &config, alice());

    let research = folders.create("Research").unwrap();
    assert_eq!(research.user_id, "user-alice");
    assert_eq!(research.date_created, research.last_edited);

    let intro = notes
        .create(&research.folder_id, "Intro", "first steps")
        .unwrap();
    let outline = notes.create(&research.folder_id, "Outline", "").unwrap();

    assert_eq!(folders.find(&research.folder_id).unwrap(), research);
    assert_eq!(notes.find(&research.folder_id, &intro.note_id).unwrap(), intro);

    let listed: Vec<String> = notes
        .list(&research.folder_id)
        .unwrap()
        .into_iter()
        .map(|note| note.note_id)
        .collect();
    assert_eq!(listed, vec![outline.note_id, intro.note_id.clone()]);

    let detail = notes.detail(&research.folder_id, &intro.note_id).unwrap();
    assert_eq!(detail.note, intro);
    assert!(detail.nodes.is_empty());
    assert!(detail.edges.is_empty());
}

#[test]
fn note_under_missing_folder_is_rejected_without_write() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let notes = NoteRepository::new(&store, &config, alice());

    let err = notes.create("no-such-folder", "Intro", "").unwrap_err();
    assert!(matches!(err, RepoError::ParentNotFound { .. }), "{err}");
    assert!(err.is_not_found());
    assert!(store.is_empty());
}

#[test]
fn owners_never_see_each_others_entities() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let alice_folders = FolderRepository::new(&store, &config, alice());
    let bob_folders = FolderRepository::new(&store, &config, bob());
    let alice_notes = NoteRepository::new(&store, &config, alice());
    let bob_notes = NoteRepository::new(&store, &config, bob());

    let folder = alice_folders.create("Research").unwrap();
    alice_notes.create(&folder.folder_id, "Intro", "").unwrap();

    assert!(bob_folders.list().unwrap().is_empty());
    assert!(bob_folders.find(&folder.folder_id).unwrap_err().is_not_found());
    // Same folder id text, other owner: nothing listed, and no writes allowed.
    assert!(bob_notes.list(&folder.folder_id).unwrap().is_empty());
    assert!(bob_notes.create(&folder.folder_id, "Sneaky", "").is_err());
    assert_eq!(alice_notes.list(&folder.folder_id).unwrap().len(), 1);
}

#[test]
fn delete_reports_missing_records_and_removes_existing_ones() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let folders = FolderRepository::new(&store, &config, alice());

    match folders.delete("ghost").unwrap_err() {
        RepoError::NotFound { id, .. } => assert_eq!(id, "ghost"),
        other => panic!("unexpected error: {other}"),
    }

    let folder = folders.create("Research").unwrap();
    assert_eq!(folders.delete(&folder.folder_id).unwrap(), folder.folder_id);
    assert!(folders.find(&folder.folder_id).unwrap_err().is_not_found());
}

#[test]
fn folder_delete_leaves_notes_in_place() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let folders = FolderRepository::new(&store, &config, alice());
    let notes = NoteRepository::new(&store, &config, alice());

    let folder = folders.create("Research").unwrap();
    let note = notes.create(&folder.folder_id, "Intro", "").unwrap();
    folders.delete(&folder.folder_id).unwrap();

    assert_eq!(notes.find(&folder.folder_id, &note.note_id).unwrap(), note);
}

#[test]
fn update_touches_only_given_fields_and_advances_last_edited() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let notes = NoteRepository::new(&store, &config, alice());
    let folders = FolderRepository::new(&store, &config, alice());
    let folder = folders.create("Research").unwrap();
    let note = notes.create(&folder.folder_id, "Intro", "keep me").unwrap();

    // Age the stored record so the update stamp is strictly newer.
    let partition = note_partition("alice@example.com", &folder.folder_id);
    let mut item = store
        .get(&config.table, &partition, Some(note.note_id.as_str()))
        .unwrap();
    item.attributes
        .insert("last_edited".to_string(), Value::from(1_i64));
    store
        .put(&config.table, &partition, &note.note_id, item.attributes)
        .unwrap();

    let updated_id = notes
        .update(
            &folder.folder_id,
            &note.note_id,
            NoteChanges {
                note_name: Some("Introduction".to_string()),
                description: None,
            },
        )
        .unwrap();
    assert_eq!(updated_id, note.note_id);

    let stored = notes.find(&folder.folder_id, &note.note_id).unwrap();
    assert_eq!(stored.note_name, "Introduction");
    assert_eq!(stored.description, "keep me");
    assert_eq!(stored.date_created, note.date_created);
    assert!(stored.last_edited > 1);
}

#[test]
fn update_with_only_zero_values_still_stamps_last_edited() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let folders = FolderRepository::new(&store, &config, alice());
    let folder = folders.create("Research").unwrap();

    let mut item = store
        .get(&config.table, "FOLDER#alice@example.com", Some(folder.folder_id.as_str()))
        .unwrap();
    item.attributes
        .insert("last_edited".to_string(), Value::from(1_i64));
    store
        .put(
            &config.table,
            "FOLDER#alice@example.com",
            &folder.folder_id,
            item.attributes,
        )
        .unwrap();

    folders
        .update(
            &folder.folder_id,
            FolderChanges {
                folder_name: Some(String::new()),
            },
        )
        .unwrap();

    let stored = folders.find(&folder.folder_id).unwrap();
    assert_eq!(stored.folder_name, "Research");
    assert!(stored.last_edited > 1);
}

#[test]
fn update_of_missing_record_is_not_found_and_creates_nothing() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let folders = FolderRepository::new(&store, &config, alice());

    let err = folders
        .update(
            "ghost",
            FolderChanges {
                folder_name: Some("Renamed".to_string()),
            },
        )
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert!(store.is_empty());
}

#[test]
fn list_with_notes_attaches_each_folders_notes_in_folder_order() {
    let store = SqliteKvStore::open_in_memory().unwrap();
    let config = CoreConfig::default();
    let folders = FolderRepository::new(&store, &config, alice());
    let notes = NoteRepository::new(&store, &config, alice());

    let research = folders.create("Research").unwrap();
    let personal = folders.create("Personal").unwrap();
    let empty = folders.create("Empty").unwrap();
    notes.create(&research.folder_id, "Intro", "").unwrap();
    notes.create(&research.folder_id, "Methods", "").unwrap();
    notes.create(&personal.folder_id, "Groceries", "").unwrap();

    let listing = folders.list_with_notes().unwrap();
    let shape: Vec<(String, usize)> = listing
        .iter()
        .map(|entry| (entry.folder.folder_id.clone(), entry.notes.len()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (empty.folder_id, 0),
            (personal.folder_id, 1),
            (research.folder_id.clone(), 2),
        ]
    );
    assert!(listing[2]
        .notes
        .iter()
        .all(|note| note.folder_id == research.folder_id));
}

fn flaky_workspace(policy: ChildFetchPolicy) -> (FlakyStore, CoreConfig, Vec<String>) {
    let store = FlakyStore::new();
    let config = CoreConfig {
        child_fetch: policy,
        ..CoreConfig::default()
    };
    let folder_ids = {
        let folders = FolderRepository::new(&store, &config, alice());
        let notes = NoteRepository::new(&store, &config, alice());
        let mut ids = Vec::new();
        for name in ["first", "second", "third"] {
            let folder = folders.create(name).unwrap();
            notes.create(&folder.folder_id, "note", "").unwrap();
            ids.push(folder.folder_id);
        }
        ids
    };
    // Listing order is newest first: third, second, first.
    for folder_id in [&folder_ids[0], &folder_ids[1]] {
        store.fail_scans_of(note_partition("alice@example.com", folder_id));
    }
    (store, config, folder_ids)
}

#[test]
fn list_with_notes_first_error_returns_earliest_failing_folder() {
    let (store, config, folder_ids) = flaky_workspace(ChildFetchPolicy::FirstError);
    let folders = FolderRepository::new(&store, &config, alice());

    match folders.list_with_notes().unwrap_err() {
        RepoError::Store { action, source } => {
            assert_eq!(action, "could not fetch notes");
            assert!(source.to_string().contains(&folder_ids[1]), "{source}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn list_with_notes_collect_reports_every_failure() {
    let (store, config, folder_ids) = flaky_workspace(ChildFetchPolicy::Collect);
    let folders = FolderRepository::new(&store, &config, alice());

    match folders.list_with_notes().unwrap_err() {
        RepoError::ChildFetch(failures) => {
            let failed: Vec<&str> = failures
                .iter()
                .map(|failure| failure.folder_id.as_str())
                .collect();
            assert_eq!(failed, vec![folder_ids[1].as_str(), folder_ids[0].as_str()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn list_with_notes_skip_lists_failing_folders_without_notes() {
    let (store, config, folder_ids) = flaky_workspace(ChildFetchPolicy::Skip);
    let folders = FolderRepository::new(&store, &config, alice());

    let listing = folders.list_with_notes().unwrap();
    let shape: Vec<(&str, usize)> = listing
        .iter()
        .map(|entry| (entry.folder.folder_id.as_str(), entry.notes.len()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (folder_ids[2].as_str(), 1),
            (folder_ids[1].as_str(), 0),
            (folder_ids[0].as_str(), 0),
        ]
    );
}

#[test]
fn list_with_notes_keeps_order_across_worker_batches() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let folders = FolderRepository::new(&store, &config, alice());
    let notes = NoteRepository::new(&store, &config, alice());

    let mut created = Vec::new();
    for index in 0..500 {
        let folder = folders.create(&format!("folder-{index}")).unwrap();
        notes
            .create(&folder.folder_id, &format!("note-{index}"), "")
            .unwrap();
        created.push(folder.folder_id);
    }
    created.reverse();

    let listing = folders.list_with_notes().unwrap();
    let listed: Vec<&str> = listing
        .iter()
        .map(|entry| entry.folder.folder_id.as_str())
        .collect();
    let expected: Vec<&str> = created.iter().map(String::as_str).collect();
    assert_eq!(listed, expected);
    for entry in &listing {
        assert_eq!(entry.notes.len(), 1);
        assert_eq!(entry.notes[0].folder_id, entry.folder.folder_id);
        assert_eq!(
            entry.notes[0].note_name,
            entry.folder.folder_name.replace("folder-", "note-")
        );
    }
}

#[test]
fn malformed_stored_folder_is_reported_as_decode_error() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let attributes = match serde_json::json!({"folder_id": "f1", "folder_name": 5}) {
        Value::Object(map) => map,
        other => panic!("not a map: {other}"),
    };
    store
        .put(&config.table, "FOLDER#alice@example.com", "f1", attributes)
        .unwrap();

    let folders = FolderRepository::new(&store, &config, alice());
    match folders.find("f1").unwrap_err() {
        RepoError::Decode { entity, .. } => assert_eq!(entity.as_str(), "FOLDER"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        folders.list().unwrap_err(),
        RepoError::Decode { .. }
    ));
    assert!(matches!(
        folders.list_with_notes().unwrap_err(),
        RepoError::Decode { .. }
    ));
}

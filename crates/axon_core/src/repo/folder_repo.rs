//! Folder repository.
//!
//! # Invariants
//! - Folders live in partition `FOLDER#{email}`, keyed by folder id.
//! - Listing with notes scans note partitions in parallel batches no wider
//!   than the core count; results keep folder order regardless of
//!   completion order.
//! - A worker that cannot be started fails only its own folder, under the
//!   configured `ChildFetchPolicy`.

use crate::config::{ChildFetchPolicy, CoreConfig};
use crate::model::user::OwnerContext;
use crate::model::workspace::{Folder, FolderChanges, FolderWithNotes, Note};
use crate::repo::{new_id, ChildFetchFailure, Records, RepoError, RepoResult};
use crate::store::key::{folder_partition, note_partition, EntityTag};
use crate::store::{epoch_millis, KvStore};
use log::warn;
use std::num::NonZeroUsize;
use std::thread;

const FALLBACK_WORKERS: usize = 4;

pub struct FolderRepository<'s, S: KvStore + ?Sized> {
    store: &'s S,
    config: &'s CoreConfig,
    owner: OwnerContext,
}

impl<'s, S: KvStore + ?Sized> FolderRepository<'s, S> {
    pub fn new(store: &'s S, config: &'s CoreConfig, owner: OwnerContext) -> Self {
        Self {
            store,
            config,
            owner,
        }
    }

    fn records(&self) -> Records<'s, S> {
        Records::new(self.store, self.config.table.as_str())
    }

    fn partition(&self) -> String {
        folder_partition(&self.owner.email)
    }

    pub fn create(&self, folder_name: &str) -> RepoResult<Folder> {
        let now = epoch_millis();
        let folder = Folder {
            user_id: self.owner.user_id.clone(),
            folder_id: new_id(),
            folder_name: folder_name.to_string(),
            date_created: now,
            last_edited: now,
        };
        self.records()
            .insert(&self.partition(), &folder.folder_id, &folder)?;
        Ok(folder)
    }

    pub fn find(&self, folder_id: &str) -> RepoResult<Folder> {
        self.records().find(&self.partition(), folder_id)
    }

    /// Folders of the owner, newest first.
    pub fn list(&self) -> RepoResult<Vec<Folder>> {
        self.records().list(&self.partition())
    }

    /// Folders of the owner, each with its notes.
    ///
    /// Failed note fetches are handled per `CoreConfig::child_fetch`.
    pub fn list_with_notes(&self) -> RepoResult<Vec<FolderWithNotes>> {
        let folders = self.list()?;
        let results = self.fetch_notes(&folders);

        let mut listing = Vec::with_capacity(folders.len());
        let mut failures = Vec::new();
        for (folder, result) in folders.into_iter().zip(results) {
            match result {
                Ok(notes) => listing.push(FolderWithNotes { folder, notes }),
                Err(error) => match self.config.child_fetch {
                    ChildFetchPolicy::FirstError => return Err(error),
                    ChildFetchPolicy::Collect => failures.push(ChildFetchFailure {
                        folder_id: folder.folder_id,
                        error,
                    }),
                    ChildFetchPolicy::Skip => {
                        warn!(
                            "event=folder_notes_fetch module=repo status=skipped folder_id={} error={}",
                            folder.folder_id, error
                        );
                        listing.push(FolderWithNotes {
                            folder,
                            notes: Vec::new(),
                        });
                    }
                },
            }
        }

        if failures.is_empty() {
            Ok(listing)
        } else {
            Err(RepoError::ChildFetch(failures))
        }
    }

    /// Scans each folder's note partition, at most one worker per core at a
    /// time. Results are positional: `results[i]` belongs to `folders[i]`.
    fn fetch_notes(&self, folders: &[Folder]) -> Vec<RepoResult<Vec<Note>>> {
        let records = self.records();
        let email = self.owner.email.as_str();
        let workers = thread::available_parallelism().map_or(FALLBACK_WORKERS, NonZeroUsize::get);

        let mut results = Vec::with_capacity(folders.len());
        for batch in folders.chunks(workers) {
            thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|folder| {
                        let records = &records;
                        thread::Builder::new()
                            .name("axon-folder-notes".to_string())
                            .spawn_scoped(scope, move || {
                                records.list::<Note>(&note_partition(email, &folder.folder_id))
                            })
                    })
                    .collect();
                for handle in handles {
                    results.push(match handle {
                        Ok(handle) => handle
                            .join()
                            .unwrap_or_else(|payload| std::panic::resume_unwind(payload)),
                        Err(err) => Err(RepoError::Worker(err)),
                    });
                }
            });
        }
        results
    }

    pub fn update(&self, folder_id: &str, changes: FolderChanges) -> RepoResult<String> {
        let update = changes.into_update(self.config.zero_values, epoch_millis());
        self.records()
            .update(EntityTag::Folder, &self.partition(), folder_id, &update)
    }

    /// Point delete of the folder record; its notes are left in place.
    pub fn delete(&self, folder_id: &str) -> RepoResult<String> {
        self.records()
            .remove(EntityTag::Folder, &self.partition(), folder_id)
    }
}

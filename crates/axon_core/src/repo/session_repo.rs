//! Session cache repository.
//!
//! # Invariants
//! - Sessions live in the session table at partition `SESSION#{session_id}`
//!   with the session id as sort key.
//! - Every write carries an expiry; expired sessions read as not found.

use crate::config::CoreConfig;
use crate::model::user::SessionData;
use crate::repo::{encode, Entity, RepoError, Records, RepoResult};
use crate::store::key::{session_partition, EntityTag};
use crate::store::{epoch_millis, KvStore};
use serde::{Deserialize, Serialize};

/// Persisted shape of one cached session.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    session_id: String,
    #[serde(flatten)]
    data: SessionData,
    date_created: i64,
}

impl Entity for StoredSession {
    const TAG: EntityTag = EntityTag::Session;
}

pub struct SessionRepository<'s, S: KvStore + ?Sized> {
    store: &'s S,
    config: &'s CoreConfig,
}

impl<'s, S: KvStore + ?Sized> SessionRepository<'s, S> {
    pub fn new(store: &'s S, config: &'s CoreConfig) -> Self {
        Self { store, config }
    }

    fn records(&self) -> Records<'s, S> {
        Records::new(self.store, self.config.session_table.as_str())
    }

    /// Caches `data` under `session_id` for `CoreConfig::session_ttl_secs`.
    pub fn save(&self, session_id: &str, data: &SessionData) -> RepoResult<()> {
        let record = StoredSession {
            session_id: session_id.to_string(),
            data: data.clone(),
            date_created: epoch_millis(),
        };
        let attributes = encode(&record)?;
        self.store
            .put_with_ttl(
                &self.config.session_table,
                &session_partition(session_id),
                session_id,
                attributes,
                self.config.session_ttl_secs,
            )
            .map_err(|source| RepoError::store("could not save session", source))
    }

    pub fn find(&self, session_id: &str) -> RepoResult<SessionData> {
        let record: StoredSession = self
            .records()
            .find(&session_partition(session_id), session_id)?;
        Ok(record.data)
    }

    pub fn delete(&self, session_id: &str) -> RepoResult<String> {
        self.records()
            .remove(EntityTag::Session, &session_partition(session_id), session_id)
    }
}

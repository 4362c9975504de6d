//! User repository.
//!
//! # Invariants
//! - One user per email, at partition `USER#{email}` with the email as sort key.
//! - `user_id` is assigned once, on first sign-in, and never rewritten.

use crate::config::CoreConfig;
use crate::model::user::{IdentityProfile, User};
use crate::repo::{new_id, Records, RepoResult};
use crate::store::key::user_partition;
use crate::store::KvStore;
use log::info;

pub struct UserRepository<'s, S: KvStore + ?Sized> {
    store: &'s S,
    config: &'s CoreConfig,
}

impl<'s, S: KvStore + ?Sized> UserRepository<'s, S> {
    pub fn new(store: &'s S, config: &'s CoreConfig) -> Self {
        Self { store, config }
    }

    fn records(&self) -> Records<'s, S> {
        Records::new(self.store, self.config.table.as_str())
    }

    pub fn find(&self, email: &str) -> RepoResult<User> {
        self.records().find(&user_partition(email), email)
    }

    /// Returns the stored user for the profile email, creating it on first
    /// sight. An existing user is returned as stored, without profile refresh.
    pub fn find_or_create(&self, profile: &IdentityProfile) -> RepoResult<User> {
        match self.find(&profile.email) {
            Ok(user) => Ok(user),
            Err(err) if err.is_not_found() => {
                let user = User::from_profile(new_id(), profile);
                self.records()
                    .insert(&user_partition(&user.email), &user.email, &user)?;
                info!(
                    "event=user_create module=repo status=ok user_id={}",
                    user.user_id
                );
                Ok(user)
            }
            Err(err) => Err(err),
        }
    }
}

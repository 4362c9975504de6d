//! Sign-in and session resolution.
//!
//! # Responsibility
//! - Exchange a provider access token for a cached session.
//! - Resolve session ids back to the owner scope used by repositories.
//!
//! # Invariants
//! - A user record exists before its first session is written.
//! - Session ids are 32 random bytes, URL-safe base64 encoded.
//! - Access tokens are never logged.

use crate::config::CoreConfig;
use crate::model::user::{IdentityProfile, OwnerContext, SessionData};
use crate::repo::session_repo::SessionRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::store::KvStore;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SESSION_ID_BYTES: usize = 32;

/// Failure reported by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The access token was rejected.
    Unauthorized,
    /// The provider could not be reached or answered unexpectedly.
    Unavailable(String),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "access token rejected by identity provider"),
            Self::Unavailable(details) => write!(f, "identity provider unavailable: {details}"),
        }
    }
}

impl Error for IdentityError {}

/// External identity boundary: access token to user profile.
pub trait IdentityProvider {
    fn authenticated_user(&self, access_token: &str) -> Result<IdentityProfile, IdentityError>;
}

#[derive(Debug)]
pub enum AuthError {
    Identity(IdentityError),
    Repo(RepoError),
    /// The OS random source failed while generating a session id.
    RandomSource(getrandom::Error),
}

impl AuthError {
    /// True when the session or user does not exist (or has expired).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_not_found())
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::RandomSource(err) => write!(f, "could not generate session id: {err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Identity(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::RandomSource(_) => None,
        }
    }
}

impl From<IdentityError> for AuthError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<getrandom::Error> for AuthError {
    fn from(value: getrandom::Error) -> Self {
        Self::RandomSource(value)
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Generates a fresh session id.
pub fn new_session_id() -> AuthResult<String> {
    let mut bytes = [0_u8; SESSION_ID_BYTES];
    getrandom::getrandom(&mut bytes)?;
    Ok(URL_SAFE.encode(bytes))
}

pub struct AuthService<'s, S: KvStore + ?Sized, P: IdentityProvider> {
    users: UserRepository<'s, S>,
    sessions: SessionRepository<'s, S>,
    identity: &'s P,
}

impl<'s, S: KvStore + ?Sized, P: IdentityProvider> AuthService<'s, S, P> {
    pub fn new(store: &'s S, config: &'s CoreConfig, identity: &'s P) -> Self {
        Self {
            users: UserRepository::new(store, config),
            sessions: SessionRepository::new(store, config),
            identity,
        }
    }

    /// Verifies `access_token`, ensures the user exists and opens a session.
    ///
    /// Returns the new session id.
    pub fn sign_in(&self, access_token: &str) -> AuthResult<String> {
        let profile = self.identity.authenticated_user(access_token)?;
        let user = self.users.find_or_create(&profile)?;
        let session_id = new_session_id()?;
        self.sessions.save(
            &session_id,
            &SessionData {
                user: user.clone(),
                access_token: access_token.to_string(),
            },
        )?;
        info!(
            "event=sign_in module=auth status=ok user_id={}",
            user.user_id
        );
        Ok(session_id)
    }

    /// Cached session snapshot for `session_id`.
    pub fn session(&self, session_id: &str) -> AuthResult<SessionData> {
        Ok(self.sessions.find(session_id)?)
    }

    /// Owner scope of a live session.
    pub fn resolve(&self, session_id: &str) -> AuthResult<OwnerContext> {
        let data = self.session(session_id)?;
        Ok(OwnerContext::from(&data.user))
    }

    pub fn sign_out(&self, session_id: &str) -> AuthResult<()> {
        self.sessions.delete(session_id)?;
        info!("event=sign_out module=auth status=ok");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::new_session_id;
    use base64::engine::general_purpose::URL_SAFE;
    use base64::Engine;

    #[test]
    fn session_ids_are_url_safe_and_unique() {
        let first = new_session_id().unwrap();
        let second = new_session_id().unwrap();
        assert_ne!(first, second);
        assert!(!first.contains('+') && !first.contains('/'));
        assert_eq!(URL_SAFE.decode(&first).unwrap().len(), 32);
    }
}

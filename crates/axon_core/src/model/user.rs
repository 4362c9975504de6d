//! User identity and cached session entities.

use serde::{Deserialize, Serialize};

/// Profile returned by the external identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
}

/// Persisted user, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable internal id, generated on first sign-in.
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

impl User {
    /// Builds a new user from a provider profile with a fresh `user_id`.
    ///
    /// The display name is split at its first space; a single-word name
    /// leaves `last_name` empty.
    pub fn from_profile(user_id: String, profile: &IdentityProfile) -> Self {
        let display_name = profile.display_name.trim();
        let (first_name, last_name) = display_name
            .split_once(' ')
            .map(|(first, last)| (first, last.trim()))
            .unwrap_or((display_name, ""));
        Self {
            user_id,
            email: profile.email.clone(),
            username: profile.username.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            avatar: profile.avatar_url.clone(),
        }
    }
}

/// Authenticated-user snapshot cached per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user: User,
    pub access_token: String,
}

/// Owner scope for folder/note/node/edge access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerContext {
    pub email: String,
    pub user_id: String,
}

impl OwnerContext {
    pub fn new(email: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            user_id: user_id.into(),
        }
    }
}

impl From<&User> for OwnerContext {
    fn from(user: &User) -> Self {
        Self::new(user.email.clone(), user.user_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(display_name: &str) -> IdentityProfile {
        IdentityProfile {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            display_name: display_name.to_string(),
            avatar_url: "https://avatars.example.com/alice".to_string(),
        }
    }

    #[test]
    fn from_profile_splits_display_name_at_first_space() {
        let user = User::from_profile("u1".to_string(), &profile("Alice van Dyke"));
        assert_eq!(user.first_name, "Alice");
        assert_eq!(user.last_name, "van Dyke");
        assert_eq!(user.avatar, "https://avatars.example.com/alice");
    }

    #[test]
    fn from_profile_accepts_single_word_names() {
        let user = User::from_profile("u1".to_string(), &profile("Alice"));
        assert_eq!(user.first_name, "Alice");
        assert!(user.last_name.is_empty());
    }
}

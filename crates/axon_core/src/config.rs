//! Core configuration shared by repositories and services.
//!
//! Every field has a default, so a partially filled document deserializes
//! into a usable config.

use crate::store::ZeroValuePolicy;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TABLE: &str = "axon";
pub const DEFAULT_SESSION_TABLE: &str = "axon_user_session";
/// Twelve hours.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 12 * 60 * 60;

/// What folder listing does when fetching one folder's notes fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildFetchPolicy {
    /// Fail with the error of the first failing folder in listing order.
    #[default]
    FirstError,
    /// Fail with every folder's error gathered into one composite error.
    Collect,
    /// Log the failure and list the folder with no notes.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Logical table for users, folders, notes, nodes and edges.
    pub table: String,
    /// Logical table for cached sessions.
    pub session_table: String,
    pub session_ttl_secs: i64,
    pub zero_values: ZeroValuePolicy,
    pub child_fetch: ChildFetchPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            session_table: DEFAULT_SESSION_TABLE.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            zero_values: ZeroValuePolicy::default(),
            child_fetch: ChildFetchPolicy::default(),
        }
    }
}

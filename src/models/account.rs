//! Account model.
//!
//! A durable profile for an authenticated principal. Accounts are created
//! lazily the first time a previously-unseen principal is observed and are
//! never deleted by this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Global account role.
///
/// The role models *new-diagram creation rights*, not access to individual
/// diagrams: ownership and per-diagram shares always take precedence when
/// resolving access to a specific diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    /// May open diagrams but not create new ones by default.
    Viewer,
    /// May create and edit diagrams.
    Editor,
}

/// Durable account profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Principal id from the identity provider. Immutable.
    pub id: String,
    /// Email address used for share matching.
    pub email: String,
    /// Global role; the default capability when no diagram-specific
    /// override applies. Mutable (self-service toggle).
    pub role: AccountRole,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account profile with the given role.
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: AccountRole) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
            created_at: Utc::now(),
        }
    }
}

//! Crate error taxonomy.

use crate::storage::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by identity resolution, the diagram repository, and the
/// editing session.
///
/// `PermissionDenied` is used uniformly for "found but access insufficient",
/// deliberately carrying no detail that would leak a diagram's existence or
/// contents. `NotFound` means the id does not resolve at all.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoreError {
    /// No authenticated principal.
    #[error("not authenticated")]
    Unauthenticated,
    /// Principal known, access insufficient.
    #[error("permission denied: you do not have access to this diagram")]
    PermissionDenied,
    /// The id does not resolve to any document.
    #[error("diagram not found: {id}")]
    NotFound { id: String },
    /// Identity resolution failed because the backing service is
    /// unreachable. Callers must treat the principal as unauthenticated
    /// for authorization purposes (fail closed).
    #[error("identity service unavailable: {0}")]
    IdentityUnavailable(String),
    /// Document store unreachable or a stored document is unreadable.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// Input rejected before any write was attempted.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            StoreError::Serialization(msg) => Self::StoreUnavailable(msg),
        }
    }
}

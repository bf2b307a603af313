//! Storage error types for the document store backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Document store operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreError {
    /// Backing service unreachable or persistence failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

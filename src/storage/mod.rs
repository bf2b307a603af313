//! Document store boundary.
//!
//! The crate consumes durable storage as a capability: point reads and
//! writes by id, inserts returning a generated id, deletes, and filtered,
//! ordered queries over one collection. Documents are JSON values keyed by
//! an id that lives outside the document body; [`encode_doc`]/[`decode_doc`]
//! enforce that convention for typed records carrying an `id` field.
//!
//! Two backends are provided: [`MemoryStore`] for tests and single-process
//! use, and [`FileStore`] persisting one JSON file per collection.

pub mod error;
pub mod file;
pub mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::cmp::Ordering;

/// A single field filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the given value.
    Eq { field: String, value: Value },
    /// Field is an array containing the given value.
    Contains { field: String, value: Value },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether the document matches this filter. Missing fields never match.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Self::Eq { field, value } => document.get(field) == Some(value),
            Self::Contains { field, value } => document
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        }
    }
}

/// Filter combination over one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// All filters must match.
    All(Vec<Filter>),
    /// At least one filter must match.
    Any(Vec<Filter>),
}

impl Predicate {
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Self::All(filters) => filters.iter().all(|f| f.matches(document)),
            Self::Any(filters) => filters.iter().any(|f| f.matches(document)),
        }
    }
}

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single sort key for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// Durable key-value document store capability.
///
/// Every repository operation maps to exactly one logical read/write (or a
/// read-then-write pair) against this trait; no multi-document transactions
/// are assumed beyond single-document atomic writes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Full write by id (upsert).
    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError>;

    /// Insert a new document, returning the generated id.
    async fn insert(&self, collection: &str, document: Value) -> Result<String, StoreError>;

    /// Delete by id. Deleting a missing document is a no-op.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Filtered query over one collection with an optional single sort key,
    /// returning `(id, document)` pairs.
    async fn query(
        &self,
        collection: &str,
        predicate: &Predicate,
        order: Option<&OrderBy>,
    ) -> Result<Vec<(String, Value)>, StoreError>;
}

/// Serialize a typed record for storage, stripping its `id` field (the store
/// key is the identity).
pub fn encode_doc<T: Serialize>(record: &T) -> Result<Value, StoreError> {
    let mut doc =
        serde_json::to_value(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
    if let Some(fields) = doc.as_object_mut() {
        fields.remove("id");
    }
    Ok(doc)
}

/// Deserialize a stored document into a typed record, injecting the store
/// key as its `id` field.
pub fn decode_doc<T: DeserializeOwned>(id: &str, mut document: Value) -> Result<T, StoreError> {
    if let Some(fields) = document.as_object_mut() {
        fields.insert("id".to_string(), json!(id));
    }
    serde_json::from_value(document).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Compare two field values for ordering. Timestamps serialize as RFC 3339
/// strings with variable sub-second precision, so string fields that parse
/// as timestamps are compared temporally rather than lexically.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Sort `(id, document)` rows by the given key. Rows missing the field sort
/// as null (first ascending, last descending).
pub(crate) fn sort_rows(rows: &mut [(String, Value)], order: &OrderBy) {
    rows.sort_by(|(_, a), (_, b)| {
        let left = a.get(&order.field).unwrap_or(&Value::Null);
        let right = b.get(&order.field).unwrap_or(&Value::Null);
        let ordering = compare_values(left, right);
        match order.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });
}

//! In-memory document store backend.
//!
//! Backs tests and single-process deployments. Reads dominate writes, so
//! collections live behind a `tokio::sync::RwLock`.

use super::{DocumentStore, OrderBy, Predicate, StoreError, sort_rows};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// In-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.put(collection, &id, document).await?;
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        predicate: &Predicate,
        order: Option<&OrderBy>,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        let collections = self.collections.read().await;
        let mut rows: Vec<(String, Value)> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| predicate.matches(doc))
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(order) = order {
            sort_rows(&mut rows, order);
        }
        Ok(rows)
    }
}

//! File-backed document store backend.
//!
//! Persists each collection as one JSON object file (`<collection>.json`)
//! under a root directory, mirrored into an in-memory cache. Mutations
//! write the whole collection back through a temp-file rename so a crashed
//! write never leaves a truncated file behind.

use super::{DocumentStore, OrderBy, Predicate, StoreError, sort_rows};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

type Documents = BTreeMap<String, Value>;

/// File-backed document store.
pub struct FileStore {
    root: PathBuf,
    cache: RwLock<HashMap<String, Documents>>,
}

impl FileStore {
    /// Open (or create) a store rooted at the given directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| StoreError::Unavailable(format!("create {}: {}", root.display(), e)))?;
        Ok(Self {
            root,
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }

    fn load_collection(path: &Path) -> Result<Documents, StoreError> {
        if !path.exists() {
            return Ok(Documents::new());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| StoreError::Unavailable(format!("read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn persist_collection(path: &Path, documents: &Documents) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(documents)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw)
            .map_err(|e| StoreError::Unavailable(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, path).map_err(|e| {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                warn!("failed to remove temp file {}: {}", tmp.display(), cleanup);
            }
            StoreError::Unavailable(format!("rename {}: {}", path.display(), e))
        })
    }

    /// Ensure the collection is cached, loading it from disk on first touch.
    async fn ensure_loaded(&self, collection: &str) -> Result<(), StoreError> {
        {
            let cache = self.cache.read().await;
            if cache.contains_key(collection) {
                return Ok(());
            }
        }
        let documents = Self::load_collection(&self.collection_path(collection))?;
        debug!(
            collection,
            documents = documents.len(),
            "loaded collection from disk"
        );
        let mut cache = self.cache.write().await;
        cache.entry(collection.to_string()).or_insert(documents);
        Ok(())
    }

    async fn mutate<F>(&self, collection: &str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Documents),
    {
        self.ensure_loaded(collection).await?;
        let mut cache = self.cache.write().await;
        let documents = cache.entry(collection.to_string()).or_default();
        apply(documents);
        Self::persist_collection(&self.collection_path(collection), documents)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.ensure_loaded(collection).await?;
        let cache = self.cache.read().await;
        Ok(cache
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError> {
        self.mutate(collection, |docs| {
            docs.insert(id.to_string(), document);
        })
        .await
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.put(collection, &id, document).await?;
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.mutate(collection, |docs| {
            docs.remove(id);
        })
        .await
    }

    async fn query(
        &self,
        collection: &str,
        predicate: &Predicate,
        order: Option<&OrderBy>,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        self.ensure_loaded(collection).await?;
        let cache = self.cache.read().await;
        let mut rows: Vec<(String, Value)> = cache
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

//! Diagram repository.
//!
//! The sole path to durable diagram storage. Every operation enforces
//! ownership/visibility rules against the *current* stored state: writes
//! re-fetch the document immediately before the permission check so a grant
//! that has since changed is never honored from a stale snapshot. There is
//! no optimistic-concurrency token; the last writer wins on `name`/`data`.

use crate::error::CoreError;
use crate::identity::IdentityResolver;
use crate::models::{Account, Diagram, DiagramData, ShareAccess, ShareEntry};
use crate::permissions::{Access, effective_access};
use crate::storage::{DocumentStore, Filter, OrderBy, Predicate, decode_doc, encode_doc};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Collection holding diagram documents.
pub const DIAGRAMS_COLLECTION: &str = "diagrams";

/// Storage-backed diagram operations.
#[derive(Clone)]
pub struct DiagramRepository {
    store: Arc<dyn DocumentStore>,
    identity: IdentityResolver,
}

impl DiagramRepository {
    pub fn new(store: Arc<dyn DocumentStore>, identity: IdentityResolver) -> Self {
        Self { store, identity }
    }

    /// Create a new diagram owned by `owner`. Returns the generated id.
    pub async fn create(
        &self,
        owner: &Account,
        name: &str,
        data: &DiagramData,
    ) -> Result<String, CoreError> {
        let name = validated_name(name)?;
        let now = Utc::now();
        let diagram = Diagram {
            id: String::new(),
            name,
            owner_id: owner.id.clone(),
            owner_email: Some(owner.email.clone()),
            created_at: now,
            updated_at: now,
            node_count: data.nodes.len(),
            data: data.clone(),
            shared_with: Vec::new(),
            shared_emails: Vec::new(),
        };
        let id = self
            .store
            .insert(DIAGRAMS_COLLECTION, encode_doc(&diagram)?)
            .await?;
        info!(diagram_id = %id, owner_id = %owner.id, nodes = diagram.node_count, "created diagram");
        Ok(id)
    }

    /// Overwrite a diagram's name and content.
    ///
    /// Requires the acting account to hold `edit` access on the freshly
    /// fetched document. `node_count` is recomputed and `updated_at`
    /// stamped here, never trusted from the caller.
    pub async fn update(
        &self,
        id: &str,
        account: &Account,
        name: &str,
        data: &DiagramData,
    ) -> Result<(), CoreError> {
        let name = validated_name(name)?;
        let mut diagram = self.fetch(id).await?;
        if effective_access(Some(account), Some(&diagram)) != Access::Edit {
            return Err(CoreError::PermissionDenied);
        }
        diagram.name = name;
        diagram.data = data.clone();
        diagram.node_count = data.nodes.len();
        diagram.updated_at = Utc::now();
        self.store
            .put(DIAGRAMS_COLLECTION, id, encode_doc(&diagram)?)
            .await?;
        info!(diagram_id = %id, account_id = %account.id, nodes = diagram.node_count, "updated diagram");
        Ok(())
    }

    /// Fetch a diagram the account may see.
    ///
    /// Fails with [`CoreError::PermissionDenied`] when the account holds no
    /// access; the denial is generic on purpose so it reveals nothing about
    /// what the diagram contains.
    pub async fn get(&self, id: &str, account: &Account) -> Result<Diagram, CoreError> {
        let diagram = self.fetch(id).await?;
        if effective_access(Some(account), Some(&diagram)) == Access::None {
            return Err(CoreError::PermissionDenied);
        }
        Ok(diagram)
    }

    /// List the diagrams the account owns or that are shared with its
    /// email, most recently updated first.
    ///
    /// For shared diagrams persisted before `owner_email` existed, the
    /// owner's email is backfilled from the identity resolver on a
    /// best-effort basis: lookup failures are logged and the diagram is
    /// returned without it (a missing owner email degrades display only,
    /// never access).
    pub async fn list_for_account(&self, account: &Account) -> Result<Vec<Diagram>, CoreError> {
        let rows = self
            .store
            .query(
                DIAGRAMS_COLLECTION,
                &Predicate::Any(vec![
                    Filter::eq("owner_id", json!(account.id)),
                    Filter::contains("shared_emails", json!(account.email)),
                ]),
                Some(&OrderBy::desc("updated_at")),
            )
            .await?;
        let mut diagrams = rows
            .into_iter()
            .map(|(id, doc)| decode_doc::<Diagram>(&id, doc))
            .collect::<Result<Vec<_>, _>>()?;

        let mut resolved: HashMap<String, Option<String>> = HashMap::new();
        for diagram in &mut diagrams {
            if diagram.owner_id == account.id || diagram.owner_email.is_some() {
                continue;
            }
            let owner_id = diagram.owner_id.clone();
            let email = match resolved.get(&owner_id) {
                Some(cached) => cached.clone(),
                None => {
                    let looked_up = match self.identity.lookup_email(&owner_id).await {
                        Ok(email) => email,
                        Err(e) => {
                            warn!(owner_id = %owner_id, error = %e, "owner email backfill failed");
                            None
                        }
                    };
                    resolved.insert(owner_id.clone(), looked_up.clone());
                    looked_up
                }
            };
            diagram.owner_email = email;
        }
        Ok(diagrams)
    }

    /// Delete a diagram. Ownership is required exactly: a share with `edit`
    /// access never permits deletion.
    pub async fn delete(&self, id: &str, account: &Account) -> Result<(), CoreError> {
        let diagram = self.fetch(id).await?;
        if diagram.owner_id != account.id {
            return Err(CoreError::PermissionDenied);
        }
        self.store.delete(DIAGRAMS_COLLECTION, id).await?;
        info!(diagram_id = %id, owner_id = %account.id, "deleted diagram");
        Ok(())
    }

    /// Grant `target_email` access to a diagram. Only the owner may share;
    /// an editor-by-share may not re-share.
    ///
    /// Shares are de-duplicated by email with last-write-wins access, so a
    /// repeated share can upgrade or downgrade an existing grant. There is
    /// no revocation to no-access.
    pub async fn share(
        &self,
        id: &str,
        account: &Account,
        target_email: &str,
        access: ShareAccess,
    ) -> Result<(), CoreError> {
        let target_email = target_email.trim();
        if target_email.is_empty() || !target_email.contains('@') {
            return Err(CoreError::Validation(format!(
                "invalid share target email: {target_email:?}"
            )));
        }
        let mut diagram = self.fetch(id).await?;
        if diagram.owner_id != account.id {
            return Err(CoreError::PermissionDenied);
        }
        match diagram
            .shared_with
            .iter_mut()
            .find(|entry| entry.email == target_email)
        {
            Some(entry) => entry.access = access,
            None => diagram.shared_with.push(ShareEntry {
                email: target_email.to_string(),
                access,
            }),
        }
        // shared_emails must stay exactly the set of shared_with emails.
        diagram.shared_emails = diagram
            .shared_with
            .iter()
            .map(|entry| entry.email.clone())
            .collect();
        diagram.updated_at = Utc::now();
        self.store
            .put(DIAGRAMS_COLLECTION, id, encode_doc(&diagram)?)
            .await?;
        info!(diagram_id = %id, target = %target_email, access = ?access, "shared diagram");
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Diagram, CoreError> {
        let doc = self
            .store
            .get(DIAGRAMS_COLLECTION, id)
            .await?
            .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;
        Ok(decode_doc(id, doc)?)
    }
}

fn validated_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("diagram name must not be empty".into()));
    }
    Ok(trimmed.to_string())
}

//! Identity resolver.
//!
//! Maps a raw authenticated principal to a durable [`Account`] profile,
//! creating one on first sight. Resolution is an idempotent upsert keyed
//! primarily by principal id, with a fallback query by email for accounts
//! provisioned out-of-band under a different id scheme.

use crate::auth::Principal;
use crate::error::CoreError;
use crate::models::{Account, AccountRole};
use crate::storage::{DocumentStore, Filter, Predicate, decode_doc, encode_doc};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Collection holding account documents, keyed by principal id.
pub const ACCOUNTS_COLLECTION: &str = "accounts";

/// Resolver configuration.
///
/// The default role for newly created accounts is deliberately explicit:
/// the fail-safe default is `viewer`, and anything more permissive must be
/// opted into by the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    pub default_role: AccountRole,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_role: AccountRole::Viewer,
        }
    }
}

/// Resolves authenticated principals to account profiles.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn DocumentStore>,
    config: ResolverConfig,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, ResolverConfig::default())
    }

    pub fn with_config(store: Arc<dyn DocumentStore>, config: ResolverConfig) -> Self {
        Self { store, config }
    }

    /// Resolve a principal to its account, creating a durable profile if
    /// none exists.
    ///
    /// Lookup order: primary key (principal id), then fallback query by
    /// email (first match wins, order undefined; no write-back occurs on
    /// this path), then lazy creation with the configured default role. Any
    /// store failure fails the resolution closed with
    /// [`CoreError::IdentityUnavailable`].
    pub async fn resolve(&self, principal: &Principal) -> Result<Account, CoreError> {
        if let Some(doc) = self
            .store
            .get(ACCOUNTS_COLLECTION, &principal.uid)
            .await
            .map_err(unavailable)?
        {
            return decode_doc(&principal.uid, doc).map_err(unavailable);
        }

        let matches = self
            .store
            .query(
                ACCOUNTS_COLLECTION,
                &Predicate::All(vec![Filter::eq("email", json!(principal.email))]),
                None,
            )
            .await
            .map_err(unavailable)?;
        if let Some((id, doc)) = matches.into_iter().next() {
            warn!(
                uid = %principal.uid,
                account_id = %id,
                "principal resolved by email fallback; profile not re-keyed"
            );
            return decode_doc(&id, doc).map_err(unavailable);
        }

        let account = Account {
            id: principal.uid.clone(),
            email: principal.email.clone(),
            role: self.config.default_role,
            created_at: Utc::now(),
        };
        self.store
            .put(
                ACCOUNTS_COLLECTION,
                &account.id,
                encode_doc(&account).map_err(unavailable)?,
            )
            .await
            .map_err(unavailable)?;
        info!(account_id = %account.id, role = ?account.role, "created account profile");
        Ok(account)
    }

    /// Look up an account's email by id. Used for best-effort owner-email
    /// backfill when listing diagrams; absence is not an error.
    pub async fn lookup_email(&self, account_id: &str) -> Result<Option<String>, CoreError> {
        let Some(doc) = self
            .store
            .get(ACCOUNTS_COLLECTION, account_id)
            .await
            .map_err(unavailable)?
        else {
            return Ok(None);
        };
        let account: Account = decode_doc(account_id, doc).map_err(unavailable)?;
        Ok(Some(account.email))
    }

    /// Persist a role change for an existing account (self-service toggle).
    pub async fn set_role(&self, account: &mut Account, role: AccountRole) -> Result<(), CoreError> {
        account.role = role;
        self.store
            .put(
                ACCOUNTS_COLLECTION,
                &account.id,
                encode_doc(account).map_err(unavailable)?,
            )
            .await
            .map_err(unavailable)?;
        info!(account_id = %account.id, role = ?role, "updated account role");
        Ok(())
    }
}

fn unavailable(err: crate::storage::StoreError) -> CoreError {
    CoreError::IdentityUnavailable(err.to_string())
}

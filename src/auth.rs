//! Identity provider boundary.
//!
//! Credential verification is external to this crate: the core consumes an
//! authenticated principal capability plus sign-in/sign-out operations.
//! [`LocalAuthProvider`] is an in-memory implementation for tests and
//! single-process deployments; production embeddings adapt their provider
//! to [`AuthProvider`].

use crate::error::CoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::info;
use uuid::Uuid;

/// An authenticated principal as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    pub email: String,
}

/// Authentication errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

/// The consumed identity-provider capability.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Currently authenticated principal, if any.
    async fn current_principal(&self) -> Option<Principal>;

    /// Verify credentials and establish a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError>;

    /// Tear down the current session.
    async fn sign_out(&self);
}

/// Fetch the current principal or fail closed with
/// [`CoreError::Unauthenticated`].
pub async fn require_principal(provider: &dyn AuthProvider) -> Result<Principal, CoreError> {
    provider
        .current_principal()
        .await
        .ok_or(CoreError::Unauthenticated)
}

struct Credential {
    uid: String,
    password: String,
}

/// In-memory identity provider.
///
/// Publishes principal changes on a watch channel; consumers subscribe per
/// session and must drop the receiver when the session ends or the
/// principal changes, so a stale listener can never write one account's
/// profile into another's session.
pub struct LocalAuthProvider {
    users: Mutex<HashMap<String, Credential>>,
    current: watch::Sender<Option<Principal>>,
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            users: Mutex::new(HashMap::new()),
            current,
        }
    }

    /// Register a user with a generated uid, returning it.
    pub async fn register(&self, email: &str, password: &str) -> String {
        let uid = Uuid::new_v4().to_string();
        self.register_with_uid(&uid, email, password).await;
        uid
    }

    /// Register a user under a caller-chosen uid.
    pub async fn register_with_uid(&self, uid: &str, email: &str, password: &str) {
        let mut users = self.users.lock().await;
        users.insert(
            email.to_string(),
            Credential {
                uid: uid.to_string(),
                password: password.to_string(),
            },
        );
    }

    /// Subscribe to principal changes. The receiver must be dropped when
    /// the consuming session unmounts.
    pub fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.current.subscribe()
    }
}

impl Default for LocalAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn current_principal(&self) -> Option<Principal> {
        self.current.borrow().clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let users = self.users.lock().await;
        let credential = users.get(email).ok_or(AuthError::InvalidCredentials)?;
        if credential.password != password {
            return Err(AuthError::InvalidCredentials);
        }
        let principal = Principal {
            uid: credential.uid.clone(),
            email: email.to_string(),
        };
        drop(users);
        self.current.send_replace(Some(principal.clone()));
        info!(uid = %principal.uid, "signed in");
        Ok(principal)
    }

    async fn sign_out(&self) {
        self.current.send_replace(None);
        info!("signed out");
    }
}

//! Access-control and synchronization core for a collaborative flow-diagram
//! editor.
//!
//! Users authenticate, create node/edge diagrams, persist them to a shared
//! document store, and grant other users view or edit access. This crate
//! implements the part with real invariants: how an account's effective
//! permission on a diagram is derived from its global role, diagram
//! ownership, and the per-diagram share list, and how an editing session
//! keeps local state consistent with the persisted copy (load, dirty
//! tracking, save, last-writer-wins overwrite).
//!
//! Rendering, theming, credential verification, and the durable store
//! itself are external collaborators consumed through the [`auth`] and
//! [`storage`] capability traits.

pub mod auth;
pub mod error;
pub mod identity;
pub mod models;
pub mod permissions;
pub mod repository;
pub mod session;
pub mod storage;

pub use auth::{AuthError, AuthProvider, LocalAuthProvider, Principal};
pub use error::CoreError;
pub use identity::{IdentityResolver, ResolverConfig};
pub use models::{
    Account, AccountRole, DEFAULT_NODE_LABEL, Diagram, DiagramData, Edge, Node, NodeData,
    NodeKind, Position, ShareAccess, ShareEntry, Viewport,
};
pub use permissions::{Access, can_edit, effective_access};
pub use repository::DiagramRepository;
pub use session::{EditorSession, SessionState};
pub use storage::{DocumentStore, FileStore, MemoryStore, StoreError};

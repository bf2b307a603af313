//! Editing-session reconciler.
//!
//! One [`EditorSession`] per open editor tab. The session is the sole
//! in-memory mutator of the diagram being edited: it loads a diagram (or
//! seeds a new one from the starter template), applies local mutations when
//! the account holds edit access, tracks dirtiness against a structural
//! snapshot of the last loaded/saved state, and saves through the
//! repository. Concurrent sessions on the same diagram are not coordinated;
//! the last save wins on the whole document.

use crate::error::CoreError;
use crate::models::{Account, Diagram, DiagramData, Edge, Node, NodeData, Position, Viewport};
use crate::permissions::{Access, effective_access};
use crate::repository::DiagramRepository;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Default name for a freshly seeded diagram.
pub const NEW_DIAGRAM_NAME: &str = "New Diagram";

/// Session lifecycle state. `Saving` is observable while a save is in
/// flight; a second save cannot start until the session returns to `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Saving,
}

/// Serialized copy of the savable state, taken at load time and after every
/// successful save. Compared structurally (never by reference) when
/// computing the dirty flag.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    name: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// An open editing session.
pub struct EditorSession {
    repo: Arc<DiagramRepository>,
    account: Account,
    diagram_id: Option<String>,
    /// The diagram as last fetched; consulted when access is re-evaluated.
    loaded: Option<Diagram>,
    name: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    viewport: Viewport,
    access: Access,
    snapshot: Snapshot,
    /// Set by any applied structural mutation; cleared only by a
    /// successful save. Keeps the session dirty even when an edit is later
    /// reverted to the exact snapshot state.
    touched: bool,
    state: SessionState,
}

impl EditorSession {
    /// Open a session on an existing diagram.
    ///
    /// Load failures (`NotFound`, `PermissionDenied`) are fatal: no session
    /// is constructed and the caller is expected to navigate back to the
    /// listing. Node normalization (placeholder labels, unknown kinds
    /// collapsed to `default`) happens during decoding.
    pub async fn open(
        repo: Arc<DiagramRepository>,
        account: Account,
        diagram_id: &str,
    ) -> Result<Self, CoreError> {
        let diagram = repo.get(diagram_id, &account).await?;
        let access = effective_access(Some(&account), Some(&diagram));
        let mut session = Self {
            repo,
            account,
            diagram_id: Some(diagram_id.to_string()),
            name: diagram.name.clone(),
            nodes: diagram.data.nodes.clone(),
            edges: diagram.data.edges.clone(),
            viewport: diagram.data.viewport,
            loaded: Some(diagram),
            access,
            snapshot: Snapshot {
                name: String::new(),
                nodes: Vec::new(),
                edges: Vec::new(),
            },
            touched: false,
            state: SessionState::Ready,
        };
        session.snapshot = session.take_snapshot();
        info!(diagram_id, access = ?session.access, "opened editing session");
        Ok(session)
    }

    /// Open a session on a brand-new diagram, seeded from the starter
    /// template. Access is `edit` unconditionally until the first save
    /// assigns an owner.
    pub fn new_diagram(repo: Arc<DiagramRepository>, account: Account) -> Self {
        let seed = DiagramData::starter();
        let mut session = Self {
            repo,
            account,
            diagram_id: None,
            loaded: None,
            name: NEW_DIAGRAM_NAME.to_string(),
            nodes: seed.nodes,
            edges: seed.edges,
            viewport: seed.viewport,
            access: Access::Edit,
            snapshot: Snapshot {
                name: String::new(),
                nodes: Vec::new(),
                edges: Vec::new(),
            },
            touched: false,
            state: SessionState::Ready,
        };
        session.snapshot = session.take_snapshot();
        session
    }

    pub fn diagram_id(&self) -> Option<&str> {
        self.diagram_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session holds unsaved changes: any structural mutation
    /// since the last snapshot counts, even one later reverted to the exact
    /// snapshot state.
    pub fn is_dirty(&self) -> bool {
        self.touched || self.take_snapshot() != self.snapshot
    }

    /// Rename the diagram. No-op without edit access.
    pub fn set_name(&mut self, name: &str) {
        if self.access != Access::Edit {
            return;
        }
        self.name = name.to_string();
        self.touched = true;
    }

    /// Add a node at the given position, returning its generated id.
    /// Returns `None` (and leaves state untouched) without edit access.
    pub fn add_node(&mut self, label: &str, position: Position) -> Option<String> {
        if self.access != Access::Edit {
            return None;
        }
        let id = Uuid::new_v4().to_string();
        self.nodes
            .push(Node::new(id.clone(), position, NodeData::labeled(label)));
        self.touched = true;
        Some(id)
    }

    /// Move an existing node. Unknown ids and view-only sessions are no-ops.
    pub fn move_node(&mut self, node_id: &str, position: Position) {
        if self.access != Access::Edit {
            return;
        }
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == node_id) {
            node.position = position;
            self.touched = true;
        }
    }

    /// Remove a node and every edge incident to it.
    pub fn remove_node(&mut self, node_id: &str) {
        if self.access != Access::Edit {
            return;
        }
        let before = (self.nodes.len(), self.edges.len());
        self.nodes.retain(|n| n.id != node_id);
        self.edges
            .retain(|e| e.source != node_id && e.target != node_id);
        if (self.nodes.len(), self.edges.len()) != before {
            self.touched = true;
        }
    }

    /// Connect two existing nodes, returning the new edge id. Returns
    /// `None` when either endpoint is unknown or the session is view-only.
    pub fn connect(&mut self, source: &str, target: &str) -> Option<String> {
        if self.access != Access::Edit {
            return None;
        }
        let exists = |id: &str| self.nodes.iter().any(|n| n.id == id);
        if !exists(source) || !exists(target) {
            return None;
        }
        let id = format!("e{source}-{target}");
        if self.edges.iter().any(|e| e.id == id) {
            return None;
        }
        self.edges.push(Edge::new(id.clone(), source, target));
        self.touched = true;
        Some(id)
    }

    /// Remove an edge by id.
    pub fn remove_edge(&mut self, edge_id: &str) {
        if self.access != Access::Edit {
            return;
        }
        let before = self.edges.len();
        self.edges.retain(|e| e.id != edge_id);
        if self.edges.len() != before {
            self.touched = true;
        }
    }

    /// Update the viewport. Panning/zooming is not a structural mutation:
    /// it is allowed under view access and never dirties the session.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Persist the current state.
    ///
    /// The first save of a new diagram creates it (assigning the id);
    /// subsequent saves overwrite. The snapshot advances only on success,
    /// so a failed save leaves the session dirty and a retry re-sends the
    /// same payload. A clean session with an assigned id is a no-op.
    pub async fn save(&mut self) -> Result<(), CoreError> {
        if self.access != Access::Edit {
            return Err(CoreError::PermissionDenied);
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("diagram name must not be empty".into()));
        }
        if self.diagram_id.is_some() && !self.is_dirty() {
            debug!("save skipped: session clean");
            return Ok(());
        }

        self.state = SessionState::Saving;
        let data = DiagramData {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            viewport: self.viewport,
        };
        let result = match &self.diagram_id {
            Some(id) => self.repo.update(id, &self.account, &self.name, &data).await,
            None => match self.repo.create(&self.account, &self.name, &data).await {
                Ok(id) => {
                    // Keep a local copy of what was persisted so access
                    // re-evaluation sees the ownership we just acquired.
                    let now = chrono::Utc::now();
                    self.loaded = Some(Diagram {
                        id: id.clone(),
                        name: self.name.trim().to_string(),
                        owner_id: self.account.id.clone(),
                        owner_email: Some(self.account.email.clone()),
                        created_at: now,
                        updated_at: now,
                        node_count: data.nodes.len(),
                        data: data.clone(),
                        shared_with: Vec::new(),
                        shared_emails: Vec::new(),
                    });
                    self.diagram_id = Some(id);
                    Ok(())
                }
                Err(e) => Err(e),
            },
        };
        self.state = SessionState::Ready;
        result?;

        // The repository persists the trimmed name; adopt it locally so the
        // post-save snapshot matches what a reopen would load.
        self.name = self.name.trim().to_string();
        self.snapshot = self.take_snapshot();
        self.touched = false;
        Ok(())
    }

    /// Re-evaluate effective access after the account profile changes
    /// (e.g. it finished loading asynchronously after the diagram).
    ///
    /// Local edits and the snapshot are untouched: an access change alone
    /// never marks a session dirty, it only re-tags whether the mutating
    /// controls are enabled.
    pub fn refresh_access(&mut self, account: Account) {
        self.account = account;
        self.access = match (&self.diagram_id, &self.loaded) {
            (None, _) => Access::Edit,
            (Some(_), loaded) => effective_access(Some(&self.account), loaded.as_ref()),
        };
        debug!(access = ?self.access, "session access re-evaluated");
    }

    fn take_snapshot(&self) -> Snapshot {
        Snapshot {
            name: self.name.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}

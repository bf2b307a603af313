//! Diagram model.
//!
//! The persisted document a user edits: a node/edge graph plus sharing
//! metadata. Node and edge payloads are opaque to this crate beyond the
//! fields named here; unrecognized fields are preserved through
//! (de)serialization so renderer-specific styling survives a round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Placeholder label applied to nodes loaded without one.
pub const DEFAULT_NODE_LABEL: &str = "Node";

/// A node position on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Canvas viewport (pan offset and zoom level).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Node rendering kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Input,
    Default,
    Output,
}

/// Node payload. `label` defaults to [`DEFAULT_NODE_LABEL`] when absent;
/// everything else is carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default = "default_node_label")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Renderer extension fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_node_label() -> String {
    DEFAULT_NODE_LABEL.to_string()
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            label: default_node_label(),
            color: None,
            extra: Map::new(),
        }
    }
}

impl NodeData {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// A diagram node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
    /// Node kind; any value outside the known set collapses to
    /// [`NodeKind::Default`] on load.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_node_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<NodeKind>,
}

impl Node {
    pub fn new(id: impl Into<String>, position: Position, data: NodeData) -> Self {
        Self {
            id: id.into(),
            position,
            data,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Deserialize a node kind, collapsing unknown values to `default` instead
/// of rejecting the document.
fn lenient_node_kind<'de, D>(deserializer: D) -> Result<Option<NodeKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|kind| match kind.as_str() {
        "input" => NodeKind::Input,
        "output" => NodeKind::Output,
        _ => NodeKind::Default,
    }))
}

/// A diagram edge connecting two nodes by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub animated: bool,
    /// Renderer style/animation extension fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            animated: false,
            extra: Map::new(),
        }
    }
}

/// The editable content of a diagram.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagramData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl DiagramData {
    /// Fixed seed template for a brand-new diagram: a three-node
    /// start/process/end chain with two edges.
    pub fn starter() -> Self {
        let nodes = vec![
            Node::new("1", Position::new(250.0, 100.0), NodeData::labeled("Start"))
                .with_kind(NodeKind::Input),
            Node::new("2", Position::new(250.0, 250.0), NodeData::labeled("Process"))
                .with_kind(NodeKind::Default),
            Node::new("3", Position::new(250.0, 400.0), NodeData::labeled("End"))
                .with_kind(NodeKind::Output),
        ];
        let mut first = Edge::new("e1-2", "1", "2");
        first.animated = true;
        let edges = vec![first, Edge::new("e2-3", "2", "3")];
        Self {
            nodes,
            edges,
            viewport: Viewport::default(),
        }
    }
}

/// Access level granted by a share entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareAccess {
    View,
    Edit,
}

/// A grant of view or edit access to one diagram for one email address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareEntry {
    pub email: String,
    pub access: ShareAccess,
}

/// Persisted diagram document.
///
/// Invariants maintained by the repository:
/// - `id` and `owner_id` are immutable once assigned.
/// - `node_count == data.nodes.len()` as of the last successful write.
/// - `shared_emails` is exactly the set of emails in `shared_with`.
/// - `updated_at` is stamped server-side on every write and is
///   monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub node_count: usize,
    pub data: DiagramData,
    #[serde(default)]
    pub shared_with: Vec<ShareEntry>,
    /// Denormalized index of `shared_with` emails, used for query filtering.
    #[serde(default)]
    pub shared_emails: Vec<String>,
}

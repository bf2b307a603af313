//! Data models for accounts and diagrams.

pub mod account;
pub mod diagram;

pub use account::{Account, AccountRole};
pub use diagram::{
    DEFAULT_NODE_LABEL, Diagram, DiagramData, Edge, Node, NodeData, NodeKind, Position,
    ShareAccess, ShareEntry, Viewport,
};

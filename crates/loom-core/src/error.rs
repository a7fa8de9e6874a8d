//! Error types for Loom Core
//!
//! Covers lookups of unknown nodes, invalid node types, load failures and
//! integrity problems found by [`LoomTree::validate`](crate::LoomTree::validate).

use crate::types::{NodeId, NodeType};

/// Main loom error type
#[derive(Debug, thiserror::Error)]
pub enum LoomError {
    /// Referenced node is not in the store
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Operation not valid for this node type
    #[error("invalid node type '{node_type}' for {operation}")]
    InvalidNodeType {
        node_type: NodeType,
        operation: &'static str,
    },

    /// Loaded record lacks the reserved root node
    #[error("record has no root node (expected id {0})")]
    MissingRoot(NodeId),

    /// Referential integrity violations
    #[error("tree integrity check failed with {} issue(s)", .0.len())]
    Integrity(Vec<IntegrityIssue>),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoomError {
    /// Error describes a corrupted store rather than a bad request
    #[inline]
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::MissingRoot(_) | Self::Integrity(_))
    }
}

/// A single referential integrity problem
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityIssue {
    #[error("root node {0} has a parent")]
    RootHasParent(NodeId),

    #[error("node {0} has no parent but is not the root")]
    Detached(NodeId),

    #[error("node {node} references missing parent {parent}")]
    MissingParent { node: NodeId, parent: NodeId },

    #[error("node {node} lists missing child {child}")]
    MissingChild { node: NodeId, child: NodeId },

    #[error("node {node} is not listed among the children of its parent {parent}")]
    NotListedByParent { node: NodeId, parent: NodeId },

    #[error("node {parent} lists child {child} whose parent is {recorded:?}")]
    ParentMismatch {
        parent: NodeId,
        child: NodeId,
        recorded: Option<NodeId>,
    },

    #[error("node {parent} lists child {child} more than once")]
    DuplicateChild { parent: NodeId, child: NodeId },

    #[error("node {0} is not reachable from the root")]
    Unreachable(NodeId),
}

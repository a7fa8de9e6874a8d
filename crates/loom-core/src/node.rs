//! Tree nodes
//!
//! A [`Node`] is one revision of text, stored as a patch against its parent.

use crate::stats::TreeStats;
use crate::types::{NodeId, NodeType, Rating};
use loom_patch::Patch;

/// Optional provenance of machine-generated text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub model: Option<String>,
    pub finish_reason: Option<String>,
}

impl Provenance {
    #[inline]
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            finish_reason: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }
}

/// Size of a node's reconstructed text, and its change against the parent
///
/// Derived; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextMetrics {
    pub chars: usize,
    pub words: usize,
    pub net_chars: i64,
    pub net_words: i64,
}

impl TextMetrics {
    /// Measure `text` against its parent's text
    #[must_use]
    pub fn between(parent_text: &str, text: &str) -> Self {
        let chars = text.chars().count();
        let words = count_words(text);
        Self {
            chars,
            words,
            net_chars: chars as i64 - parent_text.chars().count() as i64,
            net_words: words as i64 - count_words(parent_text) as i64,
        }
    }
}

#[inline]
fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Why a content update was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditBlock {
    /// Node already has children; its text is load-bearing for them
    HasChildren,
    /// Node type is immutable from creation
    ImmutableType(NodeType),
}

/// One revision in the tree
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) node_type: NodeType,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) patch: Patch,
    pub(crate) summary: String,
    pub(crate) timestamp: i64,
    pub(crate) rating: Rating,
    pub(crate) read: bool,
    pub(crate) provenance: Provenance,
    pub(crate) error: Option<String>,
    pub(crate) pending: bool,
    pub(crate) tree_stats: TreeStats,
    pub(crate) metrics: TextMetrics,
}

impl Node {
    pub(crate) fn root(timestamp: i64) -> Self {
        Self::new(
            NodeId::ROOT,
            NodeType::Root,
            None,
            Patch::noop(),
            String::new(),
            timestamp,
            true,
            TextMetrics::default(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: NodeId,
        node_type: NodeType,
        parent: Option<NodeId>,
        patch: Patch,
        summary: String,
        timestamp: i64,
        read: bool,
        metrics: TextMetrics,
    ) -> Self {
        Self {
            id,
            node_type,
            parent,
            children: Vec::new(),
            patch,
            summary,
            timestamp,
            rating: Rating::Unset,
            read,
            provenance: Provenance::default(),
            error: None,
            pending: false,
            tree_stats: TreeStats::leaf(&metrics, timestamp),
            metrics,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    #[inline]
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Creation or last content-edit time, epoch milliseconds
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[inline]
    #[must_use]
    pub fn rating(&self) -> Rating {
        self.rating
    }

    #[inline]
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.read
    }

    #[inline]
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.provenance.model.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn finish_reason(&self) -> Option<&str> {
        self.provenance.finish_reason.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Aggregate over this node's descendants
    #[inline]
    #[must_use]
    pub fn tree_stats(&self) -> &TreeStats {
        &self.tree_stats
    }

    #[inline]
    #[must_use]
    pub fn metrics(&self) -> &TextMetrics {
        &self.metrics
    }

    /// Reason a content update would be refused, if any
    #[must_use]
    pub fn edit_block(&self) -> Option<EditBlock> {
        if self.node_type.is_immutable() {
            Some(EditBlock::ImmutableType(self.node_type))
        } else if self.has_children() {
            Some(EditBlock::HasChildren)
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub fn is_content_editable(&self) -> bool {
        self.edit_block().is_none()
    }
}

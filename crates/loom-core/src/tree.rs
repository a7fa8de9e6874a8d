//! Node/Tree store
//!
//! [`LoomTree`] owns the node arena, allocates ids, maintains parent/child
//! linkage, and reconstructs text from patch chains.
//!
//! # Ownership
//! Nodes live in one id-keyed arena. `children` is the owning, ordered
//! list; `parent` is a non-owning back-reference resolved by lookup.

use crate::clock::{Clock, SystemClock};
use crate::config::LoomConfig;
use crate::error::LoomError;
use crate::node::{EditBlock, Node, Provenance, TextMetrics};
use crate::render::RenderCache;
use crate::stats::TreeStats;
use crate::types::{NodeId, NodeType, Rating};
use loom_patch::{Patch, PatchEngine};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of [`LoomTree::update_node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Patch, summary and timestamp were replaced
    Applied,
    /// Node is immutable; nothing changed
    Ignored(EditBlock),
}

impl UpdateOutcome {
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Branching tree of text revisions
///
/// # Invariants
/// - Exactly one root, id [`NodeId::ROOT`], with an empty patch
/// - Every non-root node's id appears once in its parent's `children`
/// - `next_id` is greater than every id in the arena
pub struct LoomTree {
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) root: NodeId,
    pub(crate) next_id: u64,
    pub(crate) config: LoomConfig,
    pub(crate) engine: Arc<dyn PatchEngine>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) cache: RenderCache,
}

impl std::fmt::Debug for LoomTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoomTree")
            .field("root", &self.root)
            .field("node_count", &self.nodes.len())
            .field("next_id", &self.next_id)
            .field("engine", &self.engine)
            .field("cache", &self.cache)
            .finish()
    }
}

impl Default for LoomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LoomTree {
    /// Create a tree holding only the root, with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LoomConfig::default())
    }

    /// Create a tree using the text engine and clock the config implies
    #[must_use]
    pub fn with_config(config: LoomConfig) -> Self {
        let engine = Arc::new(config.patch.engine());
        Self::with_parts(config, engine, Arc::new(SystemClock))
    }

    /// Create a tree with explicit engine and clock
    #[must_use]
    pub fn with_parts(
        config: LoomConfig,
        engine: Arc<dyn PatchEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(NodeId::ROOT, Node::root(clock.now_ms()));
        Self::from_arena(nodes, config, engine, clock)
    }

    pub(crate) fn from_arena(
        nodes: HashMap<NodeId, Node>,
        config: LoomConfig,
        engine: Arc<dyn PatchEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let next_id = nodes.keys().map(|id| id.get()).max().unwrap_or(0) + 1;
        let cache = RenderCache::new(config.render.cache_capacity);
        Self {
            nodes,
            root: NodeId::ROOT,
            next_id,
            config,
            engine,
            clock,
            cache,
        }
    }

    /// Reserve the next id
    ///
    /// The only allocation point. Independent of arena size, so ids are
    /// never reused.
    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a child revision holding `full_text`
    ///
    /// Stores `diff(render(parent), full_text)`, appends the new id to the
    /// parent's children and propagates statistics to every ancestor.
    /// `user` nodes start read; everything else starts unread.
    ///
    /// # Errors
    /// - [`LoomError::NodeNotFound`] if `parent` is unknown
    /// - [`LoomError::InvalidNodeType`] for `NodeType::Root`
    pub fn create_node(
        &mut self,
        node_type: NodeType,
        parent: NodeId,
        full_text: &str,
        summary: impl Into<String>,
    ) -> Result<NodeId, LoomError> {
        if node_type == NodeType::Root {
            return Err(LoomError::InvalidNodeType {
                node_type,
                operation: "create_node",
            });
        }
        if !self.nodes.contains_key(&parent) {
            return Err(LoomError::NodeNotFound(parent));
        }

        let parent_text = self.render_node(parent);
        let patch = self.engine.diff(&parent_text, full_text);
        let metrics = TextMetrics::between(&parent_text, full_text);
        let read = node_type == NodeType::User;
        let id = self.allocate_id();

        let node = Node::new(
            id,
            node_type,
            Some(parent),
            patch,
            summary.into(),
            self.clock.now_ms(),
            read,
            metrics,
        );
        self.nodes.insert(id, node);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        self.cache.insert(id, full_text);

        self.update_parent_stats_incremental(id, 1, if read { 0 } else { 1 });
        tracing::debug!(node = %id, parent = %parent, kind = %node_type, "created node");
        Ok(id)
    }

    /// Create a `generated` node carrying provenance metadata
    ///
    /// # Errors
    /// Returns [`LoomError::NodeNotFound`] if `parent` is unknown
    pub fn create_generated(
        &mut self,
        parent: NodeId,
        full_text: &str,
        summary: impl Into<String>,
        provenance: Provenance,
    ) -> Result<NodeId, LoomError> {
        let id = self.create_node(NodeType::Generated, parent, full_text, summary)?;
        if let Some(node) = self.nodes.get_mut(&id) {
            node.provenance = provenance;
        }
        Ok(id)
    }

    /// Replace the content of an editable node in place
    ///
    /// Returns [`UpdateOutcome::Ignored`] without touching the node when it
    /// is immutable by type or already has children.
    ///
    /// # Errors
    /// Returns [`LoomError::NodeNotFound`] if `id` is unknown
    pub fn update_node(
        &mut self,
        id: NodeId,
        full_text: &str,
        summary: impl Into<String>,
    ) -> Result<UpdateOutcome, LoomError> {
        let node = self.nodes.get(&id).ok_or(LoomError::NodeNotFound(id))?;
        if let Some(block) = node.edit_block() {
            tracing::debug!(node = %id, ?block, "ignored update of immutable node");
            return Ok(UpdateOutcome::Ignored(block));
        }
        let parent = node.parent;

        let parent_text = parent.map(|p| self.render_node(p)).unwrap_or_default();
        let patch = self.engine.diff(&parent_text, full_text);
        let metrics = TextMetrics::between(&parent_text, full_text);
        let now = self.clock.now_ms();

        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(LoomError::NodeNotFound(id))?;
        node.patch = patch;
        node.summary = summary.into();
        node.timestamp = now;
        node.metrics = metrics;
        node.tree_stats = TreeStats::leaf(&metrics, now);

        self.cache.invalidate(id);
        self.cache.insert(id, full_text);
        self.update_parent_stats_incremental(id, 0, 0);
        Ok(UpdateOutcome::Applied)
    }

    /// Reconstruct the full text of a node
    ///
    /// Walks the parent chain collecting patches until it reaches the root
    /// or the nearest cached ancestor, then applies them root-first.
    ///
    /// Never fails: a missing parent or a cycle ends the walk early, is
    /// logged, and the text built from the patches collected so far is
    /// returned.
    #[must_use]
    pub fn render_node(&self, id: NodeId) -> String {
        if id == self.root {
            return String::new();
        }
        if let Some(text) = self.cache.get(id) {
            return text.to_string();
        }

        let mut chain: Vec<(NodeId, &Patch)> = Vec::new();
        let mut base: Option<Arc<str>> = None;
        let mut complete = false;
        let mut cursor = Some(id);

        while let Some(current) = cursor {
            if chain.len() > self.nodes.len() {
                tracing::warn!(node = %id, "cycle in parent chain; rendering partial text");
                break;
            }
            if current != id {
                if let Some(text) = self.cache.get(current) {
                    base = Some(text);
                    complete = true;
                    break;
                }
            }
            let Some(node) = self.nodes.get(&current) else {
                tracing::warn!(node = %id, missing = %current, "missing node in parent chain; rendering partial text");
                break;
            };
            chain.push((current, &node.patch));
            cursor = node.parent;
            if cursor.is_none() {
                complete = current == self.root;
            }
        }

        let mut text = base.map(|t| t.to_string()).unwrap_or_default();
        for (node_id, patch) in chain.iter().rev() {
            let outcome = self.engine.apply(patch, &text);
            if !outcome.is_clean() {
                tracing::warn!(node = %node_id, failed = outcome.failed(), "partial patch application");
            }
            text = outcome.text;
        }

        if complete {
            self.cache.insert(id, &text);
        }
        text
    }

    /// Set the rating and adjust ancestor rating counters
    ///
    /// # Errors
    /// Returns [`LoomError::NodeNotFound`] if `id` is unknown
    pub fn set_rating(&mut self, id: NodeId, rating: Rating) -> Result<(), LoomError> {
        let node = self.node_mut(id)?;
        let previous = node.rating;
        if previous == rating {
            return Ok(());
        }
        node.rating = rating;

        let up = i64::from(rating.is_approved()) - i64::from(previous.is_approved());
        let down = i64::from(rating.is_rejected()) - i64::from(previous.is_rejected());
        self.update_rating_stats_incremental(id, up, down);
        Ok(())
    }

    /// Set the read flag and adjust ancestor unread counters
    ///
    /// Returns whether the flag changed.
    ///
    /// # Errors
    /// Returns [`LoomError::NodeNotFound`] if `id` is unknown
    pub fn mark_read(&mut self, id: NodeId, read: bool) -> Result<bool, LoomError> {
        let node = self.node_mut(id)?;
        if node.read == read {
            return Ok(false);
        }
        node.read = read;
        self.update_parent_stats_incremental(id, 0, if read { -1 } else { 1 });
        Ok(true)
    }

    /// Record or clear a generation error on a node
    ///
    /// # Errors
    /// Returns [`LoomError::NodeNotFound`] if `id` is unknown
    pub fn set_error(&mut self, id: NodeId, error: Option<String>) -> Result<(), LoomError> {
        self.node_mut(id)?.error = error;
        Ok(())
    }

    /// Flag a node as waiting on in-flight generation
    ///
    /// # Errors
    /// Returns [`LoomError::NodeNotFound`] if `id` is unknown
    pub fn set_pending(&mut self, id: NodeId, pending: bool) -> Result<(), LoomError> {
        self.node_mut(id)?.pending = pending;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[&self.root]
    }

    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Lookup that reports unknown ids as errors
    ///
    /// # Errors
    /// Returns [`LoomError::NodeNotFound`] if `id` is unknown
    pub fn get(&self, id: NodeId) -> Result<&Node, LoomError> {
        self.nodes.get(&id).ok_or(LoomError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, LoomError> {
        self.nodes.get_mut(&id).ok_or(LoomError::NodeNotFound(id))
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes, root included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Id the next created node will receive
    #[inline]
    #[must_use]
    pub fn next_id(&self) -> NodeId {
        NodeId::new(self.next_id)
    }

    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map_or(&[], |node| node.children.as_slice())
    }

    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Ancestors of `id`, nearest first, root last
    ///
    /// Stops early at a missing parent or a cycle.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            if out.len() >= self.nodes.len() || !self.nodes.contains_key(&current) {
                break;
            }
            out.push(current);
            cursor = self.parent(current);
        }
        out
    }

    /// Path from the root down to `id`, both inclusive
    #[must_use]
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = self.ancestors(id);
        path.reverse();
        path.push(id);
        path
    }

    /// Number of edges between the root and `id`
    #[inline]
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).len()
    }

    /// True when `ancestor` is a strict ancestor of `id`
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// All nodes, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &LoomConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn PatchEngine> {
        &self.engine
    }

    #[inline]
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Drop every cached rendering
    pub fn clear_render_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached renderings
    #[must_use]
    pub fn cached_renders(&self) -> u64 {
        self.cache.entry_count()
    }
}

//! Serialization
//!
//! Converts a [`LoomTree`] to and from its flat persisted record. Derived
//! data (rendered text, depth, [`TreeStats`](crate::TreeStats), metrics) is
//! never written; callers recompute it after a load.
//!
//! Record layout:
//!
//! ```json
//! {
//!   "loomTree": { "nodeStore": { "1": { "id": 1, "type": "root", ... } } },
//!   "focus": { "id": 1 },
//!   "samplerSettings": { ... }
//! }
//! ```

use crate::clock::Clock;
use crate::config::LoomConfig;
use crate::error::{IntegrityIssue, LoomError};
use crate::node::{Node, Provenance, TextMetrics};
use crate::tree::LoomTree;
use crate::types::{NodeId, NodeType, Rating};
use loom_patch::{Patch, PatchEngine};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Persisted fields of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedNode {
    pub id: NodeId,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub patch: Patch,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub read: bool,
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl From<&Node> for PersistedNode {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            timestamp: node.timestamp,
            node_type: node.node_type,
            patch: node.patch.clone(),
            summary: node.summary.clone(),
            rating: node.rating,
            read: node.read,
            parent: node.parent,
            children: node.children.clone(),
            model: node.provenance.model.clone(),
            error: node.error.clone(),
            finish_reason: node.provenance.finish_reason.clone(),
        }
    }
}

impl PersistedNode {
    fn into_node(self) -> Node {
        let mut node = Node::new(
            self.id,
            self.node_type,
            self.parent,
            self.patch,
            self.summary,
            self.timestamp,
            self.read,
            TextMetrics::default(),
        );
        node.children = self.children;
        node.rating = self.rating;
        node.error = self.error;
        node.provenance = Provenance {
            model: self.model,
            finish_reason: self.finish_reason,
        };
        node
    }
}

/// Flat id-keyed node map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoomTreeRecord {
    pub node_store: BTreeMap<NodeId, PersistedNode>,
}

impl LoomTreeRecord {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.node_store.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_store.is_empty()
    }
}

/// Reference to the focused node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRef {
    pub id: NodeId,
}

/// On-disk container for a whole session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub loom_tree: LoomTreeRecord,
    pub focus: FocusRef,
    /// Opaque to the core
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler_settings: Option<serde_json::Value>,
}

impl SessionRecord {
    #[must_use]
    pub fn new(loom_tree: LoomTreeRecord, focus: NodeId) -> Self {
        Self {
            loom_tree,
            focus: FocusRef { id: focus },
            sampler_settings: None,
        }
    }

    #[must_use]
    pub fn with_sampler_settings(mut self, settings: serde_json::Value) -> Self {
        self.sampler_settings = Some(settings);
        self
    }

    /// # Errors
    /// Returns [`LoomError::Serialization`] if encoding fails
    pub fn to_json(&self) -> Result<String, LoomError> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    /// Returns [`LoomError::Serialization`] if encoding fails
    pub fn to_json_pretty(&self) -> Result<String, LoomError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// # Errors
    /// Returns [`LoomError::Serialization`] on malformed input
    pub fn from_json(json: &str) -> Result<Self, LoomError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl LoomTree {
    /// Emit the persisted fields of every node
    #[must_use]
    pub fn serialize(&self) -> LoomTreeRecord {
        LoomTreeRecord {
            node_store: self
                .nodes
                .iter()
                .map(|(id, node)| (*id, PersistedNode::from(node)))
                .collect(),
        }
    }

    /// Rebuild a tree from a record
    ///
    /// Persisted fields are restored verbatim and `pending` is cleared.
    /// Statistics are left at their leaf defaults and references are not
    /// checked: run [`calculate_all_node_stats`](Self::calculate_all_node_stats)
    /// and [`validate`](Self::validate) before relying on either.
    ///
    /// # Errors
    /// Returns [`LoomError::MissingRoot`] if the record lacks [`NodeId::ROOT`]
    pub fn load_from_data(
        record: LoomTreeRecord,
        config: LoomConfig,
        engine: Arc<dyn PatchEngine>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LoomError> {
        if !record.node_store.contains_key(&NodeId::ROOT) {
            return Err(LoomError::MissingRoot(NodeId::ROOT));
        }

        let mut nodes = HashMap::with_capacity(record.node_store.len());
        for (key, persisted) in record.node_store {
            if key != persisted.id {
                tracing::warn!(key = %key, id = %persisted.id, "record key disagrees with node id; using key");
            }
            let mut node = persisted.into_node();
            node.id = key;
            nodes.insert(key, node);
        }

        let tree = Self::from_arena(nodes, config, engine, clock);
        tracing::info!(nodes = tree.len(), next_id = %tree.next_id(), "loaded tree");
        Ok(tree)
    }

    /// Check referential integrity
    ///
    /// # Errors
    /// Returns [`LoomError::Integrity`] listing every problem found
    pub fn validate(&self) -> Result<(), LoomError> {
        let issues = self.integrity_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(LoomError::Integrity(issues))
        }
    }

    /// Every referential integrity problem, sorted by node id
    #[must_use]
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        let mut issues = Vec::new();

        for id in &ids {
            let node = &self.nodes[id];
            match node.parent {
                Some(_) if *id == self.root => issues.push(IntegrityIssue::RootHasParent(*id)),
                None if *id != self.root => issues.push(IntegrityIssue::Detached(*id)),
                Some(parent) => match self.nodes.get(&parent) {
                    None => issues.push(IntegrityIssue::MissingParent { node: *id, parent }),
                    Some(p) if !p.children.contains(id) => {
                        issues.push(IntegrityIssue::NotListedByParent { node: *id, parent });
                    }
                    Some(_) => {}
                },
                None => {}
            }

            let mut seen = HashSet::with_capacity(node.children.len());
            for child in &node.children {
                if !seen.insert(*child) {
                    issues.push(IntegrityIssue::DuplicateChild {
                        parent: *id,
                        child: *child,
                    });
                    continue;
                }
                match self.nodes.get(child) {
                    None => issues.push(IntegrityIssue::MissingChild {
                        node: *id,
                        child: *child,
                    }),
                    Some(c) if c.parent != Some(*id) => {
                        issues.push(IntegrityIssue::ParentMismatch {
                            parent: *id,
                            child: *child,
                            recorded: c.parent,
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        let reachable = self.reachable_from_root();
        issues.extend(
            ids.iter()
                .filter(|id| !reachable.contains(id))
                .map(|id| IntegrityIssue::Unreachable(*id)),
        );
        issues
    }

    /// Ids reachable from the root through `children` links whose
    /// back-reference agrees
    fn reachable_from_root(&self) -> HashSet<NodeId> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().copied().filter(|child| {
                    self.nodes
                        .get(child)
                        .is_some_and(|c| c.parent == Some(id))
                }));
            }
        }
        seen
    }
}

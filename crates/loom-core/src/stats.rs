//! Statistics Aggregator
//!
//! Every node carries a [`TreeStats`] summarizing its descendants. Two
//! maintenance modes keep them current:
//!
//! - **Incremental**: after one mutation, walk from the node's parent up to
//!   the root adjusting counters. O(depth), iterative.
//! - **Full recompute**: post-order aggregation over a subtree. Required
//!   after a bulk load, since incremental updates are not replayed across
//!   a load boundary.
//!
//! # Invariant
//! For every internal node N:
//! `N.total_child_nodes == Σ over children c of (1 + c.total_child_nodes)`

use crate::error::LoomError;
use crate::node::TextMetrics;
use crate::tree::LoomTree;
use crate::types::NodeId;
use serde::Serialize;
use std::rc::Rc;

/// Aggregate over a node's descendant subtree
///
/// Counts cover strict descendants. Maxima and `last_child_update` use the
/// node's own values as their floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub total_child_nodes: usize,
    pub max_child_depth: usize,
    pub max_word_count_of_children: usize,
    pub max_char_count_of_children: usize,
    pub last_child_update: i64,
    pub unread_child_nodes: usize,
    pub rated_up_nodes: usize,
    pub rated_down_nodes: usize,
    pub recent_nodes: usize,
}

impl TreeStats {
    /// Stats of a node without descendants
    #[inline]
    #[must_use]
    pub fn leaf(metrics: &TextMetrics, timestamp: i64) -> Self {
        Self {
            max_word_count_of_children: metrics.words,
            max_char_count_of_children: metrics.chars,
            last_child_update: timestamp,
            ..Self::default()
        }
    }
}

/// Node whose stored total disagrees with its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsMismatch {
    pub node: NodeId,
    pub stored: usize,
    pub expected: usize,
}

#[inline]
fn apply_delta(current: usize, delta: i64) -> usize {
    if delta >= 0 {
        current.saturating_add(delta as usize)
    } else {
        current.saturating_sub(delta.unsigned_abs() as usize)
    }
}

impl LoomTree {
    /// Propagate one mutation of `id` to every ancestor
    ///
    /// At each ancestor: adds `nodes_added` to the totals, folds in the
    /// node's word/char maxima and timestamp, extends `max_child_depth`
    /// along the walked path, and shifts the unread count (floored at 0).
    pub fn update_parent_stats_incremental(
        &mut self,
        id: NodeId,
        nodes_added: i64,
        unread_delta: i64,
    ) {
        let Some(origin) = self.nodes.get(&id) else {
            return;
        };
        let words = origin.tree_stats.max_word_count_of_children;
        let chars = origin.tree_stats.max_char_count_of_children;
        let last_update = origin.tree_stats.last_child_update;
        let mut child_depth = origin.tree_stats.max_child_depth;
        let mut cursor = origin.parent;
        let limit = self.nodes.len();
        let mut steps = 0;

        while let Some(current) = cursor {
            let Some(node) = self.nodes.get_mut(&current) else {
                tracing::warn!(node = %id, missing = %current, "stats propagation hit a missing ancestor");
                break;
            };
            let stats = &mut node.tree_stats;
            stats.total_child_nodes = apply_delta(stats.total_child_nodes, nodes_added);
            stats.recent_nodes = apply_delta(stats.recent_nodes, nodes_added);
            stats.max_word_count_of_children = stats.max_word_count_of_children.max(words);
            stats.max_char_count_of_children = stats.max_char_count_of_children.max(chars);
            stats.max_child_depth = stats.max_child_depth.max(child_depth + 1);
            stats.unread_child_nodes = apply_delta(stats.unread_child_nodes, unread_delta);
            stats.last_child_update = stats.last_child_update.max(last_update);

            child_depth = stats.max_child_depth;
            cursor = node.parent;

            steps += 1;
            if steps > limit {
                tracing::warn!(node = %id, "cycle detected during stats propagation");
                break;
            }
        }
    }

    /// Propagate a rating change of `id` to every ancestor
    pub fn update_rating_stats_incremental(&mut self, id: NodeId, up_delta: i64, down_delta: i64) {
        let mut cursor = self.parent(id);
        let limit = self.nodes.len();
        let mut steps = 0;

        while let Some(current) = cursor {
            let Some(node) = self.nodes.get_mut(&current) else {
                break;
            };
            node.tree_stats.rated_up_nodes = apply_delta(node.tree_stats.rated_up_nodes, up_delta);
            node.tree_stats.rated_down_nodes =
                apply_delta(node.tree_stats.rated_down_nodes, down_delta);
            cursor = node.parent;

            steps += 1;
            if steps > limit {
                break;
            }
        }
    }

    /// Recompute text metrics and [`TreeStats`] for a whole subtree
    ///
    /// Pre-order pass: rebuild each node's text from its parent's and
    /// refresh [`TextMetrics`]. Post-order pass: aggregate children.
    /// `recent_nodes` is measured against the tree's clock at call time.
    ///
    /// # Errors
    /// Returns [`LoomError::NodeNotFound`] if `subtree_root` is unknown
    pub fn calculate_all_node_stats(&mut self, subtree_root: NodeId) -> Result<(), LoomError> {
        let top = self.get(subtree_root)?;
        let top_parent_text: Rc<str> = match top.parent {
            Some(parent) => Rc::from(self.render_node(parent)),
            None => Rc::from(""),
        };

        let order = self.refresh_metrics(subtree_root, top_parent_text);

        let recent_window_ms =
            i64::try_from(self.config.stats.recent_window().as_millis()).unwrap_or(i64::MAX);
        let recent_floor = self.clock.now_ms().saturating_sub(recent_window_ms);

        // Reverse pre-order visits every child before its parent.
        for id in order.iter().rev() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let mut stats = TreeStats::leaf(&node.metrics, node.timestamp);
            for child_id in &node.children {
                let Some(child) = self.nodes.get(child_id) else {
                    continue;
                };
                let cs = &child.tree_stats;
                stats.total_child_nodes += 1 + cs.total_child_nodes;
                stats.max_child_depth = stats.max_child_depth.max(cs.max_child_depth + 1);
                stats.max_word_count_of_children = stats
                    .max_word_count_of_children
                    .max(cs.max_word_count_of_children);
                stats.max_char_count_of_children = stats
                    .max_char_count_of_children
                    .max(cs.max_char_count_of_children);
                stats.last_child_update = stats.last_child_update.max(cs.last_child_update);
                stats.unread_child_nodes += cs.unread_child_nodes + usize::from(!child.read);
                stats.rated_up_nodes += cs.rated_up_nodes + usize::from(child.rating.is_approved());
                stats.rated_down_nodes +=
                    cs.rated_down_nodes + usize::from(child.rating.is_rejected());
                stats.recent_nodes +=
                    cs.recent_nodes + usize::from(child.timestamp >= recent_floor);
            }
            if let Some(node) = self.nodes.get_mut(id) {
                node.tree_stats = stats;
            }
        }

        tracing::debug!(root = %subtree_root, nodes = order.len(), "recomputed subtree stats");
        Ok(())
    }

    /// Pre-order walk rebuilding text metrics; returns the visit order
    fn refresh_metrics(&mut self, top: NodeId, top_parent_text: Rc<str>) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<(NodeId, Rc<str>)> = vec![(top, top_parent_text)];

        while let Some((id, parent_text)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                tracing::warn!(node = %id, "listed child missing from store");
                continue;
            };
            let text: Rc<str> = if node.parent.is_none() {
                Rc::from("")
            } else {
                let outcome = self.engine.apply(&node.patch, &parent_text);
                if !outcome.is_clean() {
                    tracing::warn!(node = %id, failed = outcome.failed(), "partial patch application");
                }
                Rc::from(outcome.text)
            };
            let metrics = TextMetrics::between(&parent_text, &text);

            for child in node.children.iter().rev() {
                stack.push((*child, Rc::clone(&text)));
            }
            if let Some(node) = self.nodes.get_mut(&id) {
                node.metrics = metrics;
            }
            order.push(id);

            if order.len() > self.nodes.len() {
                tracing::warn!(root = %top, "cycle detected during stats recompute");
                break;
            }
        }
        order
    }

    /// Nodes whose `total_child_nodes` breaks the aggregation invariant
    ///
    /// Reports only; never corrects.
    #[must_use]
    pub fn verify_stats(&self) -> Vec<StatsMismatch> {
        let mut mismatches: Vec<StatsMismatch> = self
            .nodes
            .values()
            .filter_map(|node| {
                let expected: usize = node
                    .children
                    .iter()
                    .filter_map(|c| self.nodes.get(c))
                    .map(|c| 1 + c.tree_stats.total_child_nodes)
                    .sum();
                let stored = node.tree_stats.total_child_nodes;
                (stored != expected).then_some(StatsMismatch {
                    node: node.id,
                    stored,
                    expected,
                })
            })
            .collect();
        mismatches.sort_by_key(|m| m.node);
        mismatches
    }
}

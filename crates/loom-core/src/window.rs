//! Tree Windowing
//!
//! Selects the bounded slice of the tree rendered around a focus node:
//!
//! - up to `ancestor_levels` ancestors, the rest folded into one indicator
//! - descendants of the top node down to `descendant_depth` levels
//! - children of rejected off-path nodes collapsed into a counted indicator
//!
//! Render cost is bounded by the limits and the branching factor, not by
//! the size of the tree.

use crate::config::WindowConfig;
use crate::error::LoomError;
use crate::tree::LoomTree;
use crate::types::{NodeId, Rating};
use std::collections::HashSet;

/// Ancestor and descendant bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimits {
    ancestor_levels: usize,
    descendant_depth: usize,
}

impl WindowLimits {
    /// The descendant depth is raised to at least `ancestor_levels` so the
    /// focus itself always lies inside the window.
    #[must_use]
    pub fn new(ancestor_levels: usize, descendant_depth: usize) -> Self {
        Self {
            ancestor_levels,
            descendant_depth: descendant_depth.max(ancestor_levels),
        }
    }

    #[inline]
    #[must_use]
    pub fn ancestor_levels(&self) -> usize {
        self.ancestor_levels
    }

    #[inline]
    #[must_use]
    pub fn descendant_depth(&self) -> usize {
        self.descendant_depth
    }
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self::from(&WindowConfig::default())
    }
}

impl From<&WindowConfig> for WindowLimits {
    fn from(config: &WindowConfig) -> Self {
        Self::new(config.ancestor_levels, config.descendant_depth)
    }
}

/// Expansion state that outlives a single render
///
/// Kept across renders with the same focus; reset when the focus changes.
#[derive(Debug, Clone, Default)]
pub struct WindowState {
    focus: Option<NodeId>,
    ancestors_expanded: bool,
    expanded_branches: HashSet<NodeId>,
}

impl WindowState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the focus being rendered; returns true if state was reset
    pub fn observe_focus(&mut self, focus: NodeId) -> bool {
        if self.focus == Some(focus) {
            return false;
        }
        let had_focus = self.focus.is_some();
        self.focus = Some(focus);
        self.ancestors_expanded = false;
        self.expanded_branches.clear();
        had_focus
    }

    #[inline]
    #[must_use]
    pub fn focus(&self) -> Option<NodeId> {
        self.focus
    }

    #[inline]
    #[must_use]
    pub fn ancestors_expanded(&self) -> bool {
        self.ancestors_expanded
    }

    pub fn set_ancestors_expanded(&mut self, expanded: bool) {
        self.ancestors_expanded = expanded;
    }

    pub fn toggle_ancestors(&mut self) {
        self.ancestors_expanded = !self.ancestors_expanded;
    }

    /// Show the children of a rejected branch despite compression
    pub fn expand_branch(&mut self, id: NodeId) {
        self.expanded_branches.insert(id);
    }

    pub fn collapse_branch(&mut self, id: NodeId) {
        self.expanded_branches.remove(&id);
    }

    #[inline]
    #[must_use]
    pub fn is_branch_expanded(&self, id: NodeId) -> bool {
        self.expanded_branches.contains(&id)
    }
}

/// Relation of a rendered node to the focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Focus,
    Ancestor,
    Other,
}

/// How a rendered node's children appear
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildrenView {
    /// Leaf
    None,
    Shown(Vec<WindowNode>),
    /// Depth budget exhausted; children exist but are not listed
    HiddenByDepth,
    /// Rejected off-path node; `count` immediate children folded away
    CollapsedRejected { count: usize },
}

/// One rendered node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowNode {
    pub id: NodeId,
    /// Levels below the window's top node
    pub depth: usize,
    pub role: NodeRole,
    pub rating: Rating,
    pub children: ChildrenView,
}

/// Ancestors above the window's top node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenAncestors {
    pub count: usize,
    pub expanded: bool,
    /// Highest first; empty unless expanded
    pub listing: Vec<NodeId>,
}

/// Bounded view of the tree around a focus node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeWindow {
    pub focus: NodeId,
    pub hidden_ancestors: Option<HiddenAncestors>,
    pub top: WindowNode,
}

/// A flattened display line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowRow {
    HiddenAncestors { count: usize, expanded: bool },
    ListedAncestor { id: NodeId },
    Node { id: NodeId, indent: usize, role: NodeRole },
    HiddenChildren { parent: NodeId, indent: usize },
    CollapsedRejected { parent: NodeId, count: usize, indent: usize },
}

impl TreeWindow {
    /// Flatten into display rows, pre-order
    #[must_use]
    pub fn rows(&self) -> Vec<WindowRow> {
        let mut rows = Vec::new();
        if let Some(hidden) = &self.hidden_ancestors {
            rows.push(WindowRow::HiddenAncestors {
                count: hidden.count,
                expanded: hidden.expanded,
            });
            rows.extend(
                hidden
                    .listing
                    .iter()
                    .map(|id| WindowRow::ListedAncestor { id: *id }),
            );
        }

        let mut stack = vec![&self.top];
        while let Some(node) = stack.pop() {
            rows.push(WindowRow::Node {
                id: node.id,
                indent: node.depth,
                role: node.role,
            });
            match &node.children {
                ChildrenView::None => {}
                ChildrenView::Shown(children) => stack.extend(children.iter().rev()),
                ChildrenView::HiddenByDepth => rows.push(WindowRow::HiddenChildren {
                    parent: node.id,
                    indent: node.depth + 1,
                }),
                ChildrenView::CollapsedRejected { count } => {
                    rows.push(WindowRow::CollapsedRejected {
                        parent: node.id,
                        count: *count,
                        indent: node.depth + 1,
                    });
                }
            }
        }
        rows
    }

    /// Deepest rendered level below the top node
    #[must_use]
    pub fn max_rendered_depth(&self) -> usize {
        self.nodes().map(|node| node.depth).max().unwrap_or(0)
    }

    /// Number of rendered nodes, indicators excluded
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes().any(|node| node.id == id)
    }

    /// Find a rendered node by id
    #[must_use]
    pub fn find(&self, id: NodeId) -> Option<&WindowNode> {
        self.nodes().find(|node| node.id == id)
    }

    fn nodes(&self) -> impl Iterator<Item = &WindowNode> {
        let mut stack = vec![&self.top];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let ChildrenView::Shown(children) = &node.children {
                stack.extend(children.iter().rev());
            }
            Some(node)
        })
    }
}

struct WindowBuilder<'a> {
    tree: &'a LoomTree,
    focus: NodeId,
    focus_path: HashSet<NodeId>,
    state: &'a WindowState,
    max_depth: usize,
}

impl WindowBuilder<'_> {
    fn role(&self, id: NodeId) -> NodeRole {
        if id == self.focus {
            NodeRole::Focus
        } else if self.focus_path.contains(&id) {
            NodeRole::Ancestor
        } else {
            NodeRole::Other
        }
    }

    fn build(&self, id: NodeId, depth: usize) -> Option<WindowNode> {
        let Some(node) = self.tree.node(id) else {
            tracing::warn!(node = %id, "window skipped a missing child");
            return None;
        };
        let role = self.role(id);
        let rating = node.rating();

        let children = if !node.has_children() {
            ChildrenView::None
        } else if rating.is_rejected()
            && role == NodeRole::Other
            && !self.state.is_branch_expanded(id)
        {
            ChildrenView::CollapsedRejected {
                count: node.children().len(),
            }
        } else if depth >= self.max_depth {
            ChildrenView::HiddenByDepth
        } else {
            ChildrenView::Shown(
                node.children()
                    .iter()
                    .filter_map(|child| self.build(*child, depth + 1))
                    .collect(),
            )
        };

        Some(WindowNode {
            id,
            depth,
            role,
            rating,
            children,
        })
    }
}

/// Compute the window around `focus`
///
/// Updates `state` first: a focus different from the last one rendered
/// collapses every indicator.
///
/// # Errors
/// Returns [`LoomError::NodeNotFound`] if `focus` is unknown
pub fn build_window(
    tree: &LoomTree,
    focus: NodeId,
    state: &mut WindowState,
    limits: WindowLimits,
) -> Result<TreeWindow, LoomError> {
    tree.get(focus)?;
    if state.observe_focus(focus) {
        tracing::debug!(focus = %focus, "focus changed; window expansion reset");
    }

    let ancestors = tree.ancestors(focus);
    let shown = ancestors.len().min(limits.ancestor_levels());
    let top = if shown == 0 {
        focus
    } else {
        ancestors[shown - 1]
    };

    let hidden_ancestors = (ancestors.len() > shown).then(|| {
        let expanded = state.ancestors_expanded();
        HiddenAncestors {
            count: ancestors.len() - shown,
            expanded,
            listing: if expanded {
                ancestors[shown..].iter().rev().copied().collect()
            } else {
                Vec::new()
            },
        }
    });

    let builder = WindowBuilder {
        tree,
        focus,
        focus_path: ancestors.iter().copied().collect(),
        state,
        max_depth: limits.descendant_depth(),
    };
    let top = builder.build(top, 0).ok_or(LoomError::NodeNotFound(top))?;

    Ok(TreeWindow {
        focus,
        hidden_ancestors,
        top,
    })
}

impl LoomTree {
    /// Compute the window around `focus` using the configured limits
    ///
    /// # Errors
    /// Returns [`LoomError::NodeNotFound`] if `focus` is unknown
    pub fn window(&self, focus: NodeId, state: &mut WindowState) -> Result<TreeWindow, LoomError> {
        build_window(self, focus, state, WindowLimits::from(&self.config.window))
    }
}

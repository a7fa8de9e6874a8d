//! Keyboard-style navigation over the tree
//!
//! All moves return `None` when there is nowhere to go.

use crate::tree::LoomTree;
use crate::types::NodeId;

impl LoomTree {
    #[inline]
    #[must_use]
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id)
    }

    #[inline]
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    #[inline]
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Position of `id` among its siblings, with the sibling list
    fn siblings(&self, id: NodeId) -> Option<(&[NodeId], usize)> {
        let siblings = self.children(self.parent(id)?);
        let position = siblings.iter().position(|s| *s == id)?;
        Some((siblings, position))
    }

    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, position) = self.siblings(id)?;
        siblings.get(position + 1).copied()
    }

    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, position) = self.siblings(id)?;
        position.checked_sub(1).map(|p| siblings[p])
    }

    /// Follow the most recently created child until reaching a leaf
    ///
    /// Returns `id` itself for a leaf.
    #[must_use]
    pub fn deepest_descendant(&self, id: NodeId) -> NodeId {
        let mut current = id;
        for _ in 0..self.len() {
            match self.last_child(current) {
                Some(child) if self.contains(child) => current = child,
                _ => break,
            }
        }
        current
    }

    /// First unread node after `from` in pre-order, wrapping to the root
    #[must_use]
    pub fn next_unread(&self, from: NodeId) -> Option<NodeId> {
        let order = self.preorder();
        let start = order.iter().position(|id| *id == from).map_or(0, |p| p + 1);
        order[start..]
            .iter()
            .chain(order[..start].iter())
            .copied()
            .find(|id| self.node(*id).is_some_and(|n| !n.is_read()))
    }

    /// Every node reachable from the root, pre-order
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack = vec![self.root_id()];
        while let Some(id) = stack.pop() {
            if order.len() >= self.len() {
                break;
            }
            if !self.contains(id) {
                continue;
            }
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }
}

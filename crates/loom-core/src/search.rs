//! Search index contract
//!
//! [`SearchIndex`] is the boundary to a full-text index keyed by node id.
//! [`MemorySearchIndex`] is a small term-matching implementation on
//! `DashMap`, sufficient for sessions without an external index.

use crate::tree::LoomTree;
use crate::types::{NodeId, NodeType};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// One indexed node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: NodeId,
    pub content: String,
    pub summary: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub timestamp: i64,
}

impl SearchDocument {
    /// Build from a node's current state and rendered text
    #[must_use]
    pub fn from_tree(tree: &LoomTree, id: NodeId) -> Option<Self> {
        let node = tree.node(id)?;
        Some(Self {
            id,
            content: tree.render_node(id),
            summary: node.summary().to_string(),
            node_type: node.node_type(),
            timestamp: node.timestamp(),
        })
    }
}

/// Query options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum hits returned
    pub limit: usize,
    /// Restrict to these node types; empty means all
    pub node_types: Vec<NodeType>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            node_types: Vec::new(),
        }
    }
}

impl SearchOptions {
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_node_types(mut self, node_types: impl IntoIterator<Item = NodeType>) -> Self {
        self.node_types = node_types.into_iter().collect();
        self
    }
}

/// A matching document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: NodeId,
    pub score: usize,
}

/// Full-text index over tree nodes
pub trait SearchIndex: Send + Sync + Debug {
    fn add(&self, document: SearchDocument);
    fn replace(&self, document: SearchDocument);
    /// Returns whether a document was removed
    fn remove(&self, id: NodeId) -> bool;
    fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything and index every node of `tree`
    fn rebuild(&self, tree: &LoomTree);
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    node_type: NodeType,
    timestamp: i64,
    terms: Vec<String>,
}

/// In-memory term index
///
/// A document scores one point per query term that prefixes one of its
/// terms. Ties go to the newest node.
#[derive(Debug, Default)]
pub struct MemorySearchIndex {
    documents: DashMap<NodeId, IndexedDocument>,
}

impl MemorySearchIndex {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn index(document: &SearchDocument) -> IndexedDocument {
        let mut terms = tokenize(&document.content);
        terms.extend(tokenize(&document.summary));
        terms.sort_unstable();
        terms.dedup();
        IndexedDocument {
            node_type: document.node_type,
            timestamp: document.timestamp,
            terms,
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl SearchIndex for MemorySearchIndex {
    fn add(&self, document: SearchDocument) {
        self.documents
            .insert(document.id, Self::index(&document));
    }

    fn replace(&self, document: SearchDocument) {
        if !self.documents.contains_key(&document.id) {
            tracing::debug!(node = %document.id, "replacing unindexed document");
        }
        self.add(document);
    }

    fn remove(&self, id: NodeId) -> bool {
        self.documents.remove(&id).is_some()
    }

    fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || options.limit == 0 {
            return Vec::new();
        }

        let mut hits: Vec<(SearchHit, i64)> = self
            .documents
            .iter()
            .filter(|entry| {
                options.node_types.is_empty() || options.node_types.contains(&entry.node_type)
            })
            .filter_map(|entry| {
                let score = query_terms
                    .iter()
                    .filter(|q| entry.terms.iter().any(|t| t.starts_with(q.as_str())))
                    .count();
                (score > 0).then(|| {
                    (
                        SearchHit {
                            id: *entry.key(),
                            score,
                        },
                        entry.timestamp,
                    )
                })
            })
            .collect();

        hits.sort_by(|(a, a_ts), (b, b_ts)| {
            b.score
                .cmp(&a.score)
                .then(b_ts.cmp(a_ts))
                .then(b.id.cmp(&a.id))
        });
        hits.truncate(options.limit);
        hits.into_iter().map(|(hit, _)| hit).collect()
    }

    fn len(&self) -> usize {
        self.documents.len()
    }

    fn rebuild(&self, tree: &LoomTree) {
        self.documents.clear();
        for node in tree.iter() {
            if node.node_type() == NodeType::Root {
                continue;
            }
            if let Some(document) = SearchDocument::from_tree(tree, node.id()) {
                self.add(document);
            }
        }
        tracing::debug!(documents = self.len(), "search index rebuilt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64, content: &str, node_type: NodeType, timestamp: i64) -> SearchDocument {
        SearchDocument {
            id: NodeId::new(id),
            content: content.to_string(),
            summary: String::new(),
            node_type,
            timestamp,
        }
    }

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(tokenize("Hello, World! x2"), vec!["hello", "world", "x2"]);
    }

    #[test]
    fn search_ranks_by_matched_terms() {
        let index = MemorySearchIndex::new();
        index.add(doc(2, "the dragon sleeps", NodeType::User, 1));
        index.add(doc(3, "the dragon wakes and roars", NodeType::Generated, 2));
        index.add(doc(4, "a quiet village", NodeType::Generated, 3));

        let hits = index.search("dragon roar", &SearchOptions::default());
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0], SearchHit { id: NodeId::new(3), score: 2 });
        assert_eq!(hits[1].id, NodeId::new(2));
    }

    #[test]
    fn ties_prefer_newest() {
        let index = MemorySearchIndex::new();
        index.add(doc(2, "castle", NodeType::User, 10));
        index.add(doc(3, "castle", NodeType::User, 20));
        let hits = index.search("castle", &SearchOptions::default().with_limit(1));
        assert_eq!(hits, vec![SearchHit { id: NodeId::new(3), score: 1 }]);
    }

    #[test]
    fn type_filter_and_remove() {
        let index = MemorySearchIndex::new();
        index.add(doc(2, "storm", NodeType::User, 1));
        index.add(doc(3, "storm", NodeType::Generated, 2));

        let options = SearchOptions::default().with_node_types([NodeType::User]);
        let hits = index.search("storm", &options);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, NodeId::new(2));

        assert!(index.remove(NodeId::new(2)));
        assert!(!index.remove(NodeId::new(2)));
        assert!(index.search("storm", &options).is_empty());
    }

    #[test]
    fn replace_overwrites_terms() {
        let index = MemorySearchIndex::new();
        index.add(doc(2, "first draft", NodeType::User, 1));
        index.replace(doc(2, "second pass", NodeType::User, 2));
        assert!(index.search("draft", &SearchOptions::default()).is_empty());
        assert_eq!(index.search("second", &SearchOptions::default()).len(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn rebuild_indexes_rendered_text() {
        let mut tree = LoomTree::new();
        let a = tree
            .create_node(NodeType::User, NodeId::ROOT, "Night falls", "intro")
            .unwrap();
        tree.create_node(NodeType::Generated, a, "Night falls over the harbor", "")
            .unwrap();

        let index = MemorySearchIndex::new();
        index.rebuild(&tree);
        assert_eq!(index.len(), 2);
        assert_eq!(index.search("harbor", &SearchOptions::default()).len(), 1);
        assert_eq!(index.search("intro", &SearchOptions::default())[0].id, a);
    }

    #[test]
    fn empty_query_returns_nothing() {
        let index = MemorySearchIndex::new();
        index.add(doc(2, "anything", NodeType::User, 1));
        assert!(index.search("  ,, ", &SearchOptions::default()).is_empty());
    }
}

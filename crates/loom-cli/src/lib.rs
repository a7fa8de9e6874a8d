//! Loom CLI - reports over persisted loom sessions
//!
//! Each command opens a session file through the same restore path the
//! interactive shell uses and renders a plain-text report.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use anyhow::{Context, Result};
use loom_core::{
    LoomConfig, LoomTree, NodeId, NodeRole, Rating, SearchOptions, WindowRow,
};
use loom_session::{JsonFileStore, LoomSession, NoBackend, RecordStore};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Longest text excerpt shown per window row
const EXCERPT_CHARS: usize = 48;

/// Load configuration, falling back to defaults when no path is given
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_config(path: Option<&Path>) -> Result<LoomConfig> {
    match path {
        Some(path) => LoomConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(LoomConfig::default()),
    }
}

/// Open a session file, or start an empty session if it does not exist
///
/// # Errors
/// Returns error if the file exists but cannot be read or restored
pub async fn open_session(path: &Path, config: &LoomConfig) -> Result<LoomSession> {
    let store = JsonFileStore::new(path);
    match store.load().await? {
        Some(record) => {
            let session = LoomSession::restore(record, config.clone(), Arc::new(NoBackend))
                .with_context(|| format!("failed to restore {}", path.display()))?;
            Ok(session)
        }
        None => {
            tracing::info!(path = %path.display(), "no session file; starting empty tree");
            Ok(LoomSession::new(
                LoomTree::with_config(config.clone()),
                Arc::new(NoBackend),
            ))
        }
    }
}

/// Save a session back to its file
///
/// # Errors
/// Returns error if the file cannot be written
pub async fn save_session(session: &LoomSession, path: &Path) -> Result<()> {
    session
        .save(&JsonFileStore::new(path))
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Size and aggregate summary
#[must_use]
pub fn inspect_report(session: &LoomSession) -> String {
    let focus = session.focus();
    session.with_tree(|tree| {
        let stats = tree.root().tree_stats();
        let mut out = String::new();
        let _ = writeln!(out, "nodes:          {}", tree.len());
        let _ = writeln!(out, "next id:        {}", tree.next_id());
        let _ = writeln!(out, "focus:          {focus} (depth {})", tree.depth(focus));
        let _ = writeln!(out, "max depth:      {}", stats.max_child_depth);
        let _ = writeln!(out, "unread:         {}", stats.unread_child_nodes);
        let _ = writeln!(
            out,
            "rated:          +{} / -{}",
            stats.rated_up_nodes, stats.rated_down_nodes
        );
        let _ = writeln!(out, "longest text:   {} words", stats.max_word_count_of_children);
        out
    })
}

/// Text of `node`, or of the focus when `None`
///
/// # Errors
/// Returns error if `node` is unknown
pub fn render_text(session: &LoomSession, node: Option<NodeId>) -> Result<String> {
    let id = node.unwrap_or_else(|| session.focus());
    session.with_tree(|tree| -> Result<String> {
        tree.get(id)?;
        Ok(tree.render_node(id))
    })
}

fn excerpt(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    let count = flat.chars().count();
    if count <= EXCERPT_CHARS {
        flat
    } else {
        let tail: String = flat.chars().skip(count - EXCERPT_CHARS).collect();
        format!("...{tail}")
    }
}

/// Indented outline of the window around the focus
///
/// # Errors
/// Returns error if the focus node is missing
pub fn window_report(session: &LoomSession, expand_ancestors: bool) -> Result<String> {
    // Observe the focus first so the toggle is not reset by the real render.
    session.window()?;
    if expand_ancestors {
        session.toggle_hidden_ancestors();
    }
    let window = session.window()?;

    Ok(session.with_tree(|tree| {
        let mut out = String::new();
        for row in window.rows() {
            match row {
                WindowRow::HiddenAncestors { count, expanded } => {
                    let marker = if expanded { "v" } else { ">" };
                    let _ = writeln!(out, "{marker} {count} hidden ancestor(s)");
                }
                WindowRow::ListedAncestor { id } => {
                    let _ = writeln!(out, "  ^ [{id}] {}", label(tree, id));
                }
                WindowRow::Node { id, indent, role } => {
                    let _ = writeln!(
                        out,
                        "{}{} [{id}] {}",
                        "  ".repeat(indent),
                        marker(tree, id, role),
                        label(tree, id)
                    );
                }
                WindowRow::HiddenChildren { indent, .. } => {
                    let _ = writeln!(out, "{}...", "  ".repeat(indent));
                }
                WindowRow::CollapsedRejected { count, indent, .. } => {
                    let _ = writeln!(out, "{}[{count} collapsed]", "  ".repeat(indent));
                }
            }
        }
        out
    }))
}

fn marker(tree: &LoomTree, id: NodeId, role: NodeRole) -> &'static str {
    let node = tree.node(id);
    match role {
        NodeRole::Focus => "*",
        _ if node.is_some_and(|n| n.rating() == Rating::Rejected) => "x",
        _ if node.is_some_and(|n| n.rating() == Rating::Approved) => "+",
        _ if node.is_some_and(|n| !n.is_read()) => "o",
        _ => "-",
    }
}

fn label(tree: &LoomTree, id: NodeId) -> String {
    match tree.node(id) {
        Some(node) if !node.summary().is_empty() => node.summary().to_string(),
        Some(node) if node.parent().is_none() => "(root)".to_string(),
        Some(_) => excerpt(&tree.render_node(id)),
        None => "(missing)".to_string(),
    }
}

/// Integrity and statistics check; returns the report and whether it passed
#[must_use]
pub fn validate_report(tree: &LoomTree) -> (String, bool) {
    let issues = tree.integrity_issues();
    let mismatches = tree.verify_stats();
    let mut out = String::new();

    for issue in &issues {
        let _ = writeln!(out, "integrity: {issue}");
    }
    for mismatch in &mismatches {
        let _ = writeln!(
            out,
            "stats: node {} stores {} descendants, expected {}",
            mismatch.node, mismatch.stored, mismatch.expected
        );
    }
    let ok = issues.is_empty() && mismatches.is_empty();
    if ok {
        let _ = writeln!(out, "ok: {} nodes", tree.len());
    }
    (out, ok)
}

/// Matching nodes with a text excerpt each
#[must_use]
pub fn search_report(session: &LoomSession, query: &str, limit: usize) -> String {
    let hits = session.search(query, &SearchOptions::default().with_limit(limit));
    if hits.is_empty() {
        return "no matches\n".to_string();
    }
    session.with_tree(|tree| {
        let mut out = String::new();
        for hit in hits {
            let _ = writeln!(out, "[{}] ({}) {}", hit.id, hit.score, label(tree, hit.id));
        }
        out
    })
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

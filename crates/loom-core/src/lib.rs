//! Loom Core - branching tree of text revisions
//!
//! The tree's data model:
//! - Patch-based storage of each revision against its parent
//! - Reconstruction of full text from a patch chain
//! - Incremental aggregate statistics over subtrees
//! - Bounded windowing around a focus node
//! - Flat persisted records
//!
//! # Example
//!
//! ```rust
//! use loom_core::{LoomTree, NodeId, NodeType, WindowState};
//!
//! let mut tree = LoomTree::new();
//! let a = tree.create_node(NodeType::User, NodeId::ROOT, "Hello", "").unwrap();
//! let b = tree.create_node(NodeType::Generated, a, "Hello world", "").unwrap();
//!
//! assert_eq!(tree.render_node(b), "Hello world");
//! assert_eq!(tree.root().tree_stats().total_child_nodes, 2);
//!
//! let mut state = WindowState::new();
//! let window = tree.window(b, &mut state).unwrap();
//! assert_eq!(window.top.id, NodeId::ROOT);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod error;
pub mod navigate;
pub mod node;
pub mod persist;
mod render;
pub mod search;
pub mod stats;
pub mod tree;
pub mod types;
pub mod window;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AutosaveConfig, LoomConfig, PatchConfig, RenderConfig, StatsConfig, WindowConfig};
pub use error::{IntegrityIssue, LoomError};
pub use node::{EditBlock, Node, Provenance, TextMetrics};
pub use persist::{FocusRef, LoomTreeRecord, PersistedNode, SessionRecord};
pub use search::{MemorySearchIndex, SearchDocument, SearchHit, SearchIndex, SearchOptions};
pub use stats::{StatsMismatch, TreeStats};
pub use tree::{LoomTree, UpdateOutcome};
pub use types::{NodeId, NodeType, Rating};
pub use window::{
    build_window, ChildrenView, HiddenAncestors, NodeRole, TreeWindow, WindowLimits, WindowNode,
    WindowRow, WindowState,
};

pub use loom_patch::{Patch, PatchEngine, PatchOutcome, TextPatchEngine};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Loom Core
    pub use crate::{
        LoomConfig, LoomError, LoomTree, NodeId, NodeType, Rating, SessionRecord, TreeWindow,
        UpdateOutcome, WindowState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

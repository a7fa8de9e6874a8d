//! Loom Session - interactive layer over a loom tree
//!
//! - Focus tracking with read marking and window state
//! - Concurrent generation with out-of-order completion
//! - Snapshot/restore through a [`RecordStore`]
//! - Periodic auto-save on tokio
//!
//! # Example
//!
//! ```rust,ignore
//! use loom_session::{LoomSession, ScriptedGenerator};
//! use loom_core::LoomTree;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), loom_session::SessionError> {
//! let session = LoomSession::new(LoomTree::new(), Arc::new(ScriptedGenerator::new()));
//! session.commit_edit("It was a dark and stormy night", "")?;
//! let branches = session.generate(3).await?;
//! println!("created {} branches", branches.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod autosave;
pub mod error;
pub mod generator;
pub mod session;
pub mod store;

pub use autosave::{spawn_autosave, AutosaveHandle, MIN_AUTOSAVE_INTERVAL};
pub use error::{GenerationError, SessionError, StoreError};
pub use generator::{
    Generation, GenerationRequest, Generator, NoBackend, ScriptedGenerator, ScriptedReply,
};
pub use session::{LoomSession, Move};
pub use store::{JsonFileStore, MemoryStore, RecordStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use loom_core::{LoomConfig, LoomTree, NodeId};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn file_round_trip_preserves_text_and_focus() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("loom.json"));
        let session = LoomSession::new(
            LoomTree::new(),
            Arc::new(ScriptedGenerator::new().then_text(" The end.", Duration::ZERO)),
        );
        session.commit_edit("Chapter 1.", "").unwrap();
        let generated = session.generate(1).await.unwrap()[0];
        session.save(&store).await.unwrap();

        let record = store.load().await.unwrap().unwrap();
        let restored = LoomSession::restore(
            record,
            LoomConfig::default(),
            Arc::new(ScriptedGenerator::new()),
        )
        .unwrap();

        assert_eq!(restored.focus(), generated);
        assert_eq!(restored.focus_text(), "Chapter 1. The end.");
        assert_eq!(
            restored.with_tree(|t| t.render_node(NodeId::ROOT)),
            String::new()
        );
    }
}

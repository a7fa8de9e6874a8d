//! Testing utilities for the loom workspace
//!
//! Shared fixtures, scripted generators and consistency assertions.

#![allow(missing_docs)]

use loom_core::{
    LoomConfig, LoomTree, ManualClock, NodeId, NodeType, TextPatchEngine,
};
use loom_session::{LoomSession, ScriptedGenerator};
use std::sync::Arc;
use std::time::Duration;

/// Fixed start time for deterministic timestamps
pub const TEST_EPOCH_MS: i64 = 1_700_000_000_000;

pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(TEST_EPOCH_MS))
}

/// Empty tree with a manual clock
pub fn test_tree() -> LoomTree {
    test_tree_with_config(LoomConfig::default())
}

pub fn test_tree_with_config(config: LoomConfig) -> LoomTree {
    LoomTree::with_parts(config, Arc::new(TextPatchEngine::new()), test_clock())
}

/// Chain of `depth` user nodes below the root, each extending its parent
pub fn linear_tree(depth: usize) -> (LoomTree, Vec<NodeId>) {
    let mut tree = test_tree();
    let mut ids = Vec::with_capacity(depth);
    let mut parent = NodeId::ROOT;
    let mut text = String::new();
    for i in 0..depth {
        text.push_str(&format!("line {i}\n"));
        parent = tree
            .create_node(NodeType::User, parent, &text, format!("step {i}"))
            .unwrap();
        ids.push(parent);
    }
    (tree, ids)
}

/// Complete tree of generated nodes, `width` children per node
pub fn branching_tree(width: usize, depth: usize) -> LoomTree {
    let mut tree = test_tree();
    let mut frontier = vec![NodeId::ROOT];
    for level in 0..depth {
        let mut next = Vec::with_capacity(frontier.len() * width);
        for parent in frontier {
            let base = tree.render_node(parent);
            for branch in 0..width {
                let text = format!("{base}[{level}.{branch}]");
                next.push(
                    tree.create_node(NodeType::Generated, parent, &text, "")
                        .unwrap(),
                );
            }
        }
        frontier = next;
    }
    tree
}

/// Panics unless references resolve and stored totals agree
pub fn assert_tree_consistent(tree: &LoomTree) {
    if let Err(e) = tree.validate() {
        panic!("integrity check failed: {e:?}");
    }
    let mismatches = tree.verify_stats();
    assert!(mismatches.is_empty(), "stats mismatches: {mismatches:?}");
}

/// Generator answering each request after the given delay, in queue order
pub fn delayed_generator(replies: &[(&str, u64)]) -> ScriptedGenerator {
    replies
        .iter()
        .fold(ScriptedGenerator::new(), |generator, (text, delay_ms)| {
            generator.then_text(*text, Duration::from_millis(*delay_ms))
        })
}

/// Session over an empty test tree
pub fn test_session(generator: ScriptedGenerator) -> Arc<LoomSession> {
    Arc::new(LoomSession::new(test_tree(), Arc::new(generator)))
}

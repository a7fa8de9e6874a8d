use loom_core::{
    ChildrenView, LoomConfig, LoomTree, ManualClock, NodeId, NodeType, Rating, SessionRecord,
    TextPatchEngine, UpdateOutcome, WindowState,
};
use std::sync::Arc;

#[test]
fn user_edit_then_generation() {
    let mut tree = LoomTree::new();
    let a = tree
        .create_node(NodeType::User, NodeId::ROOT, "Hello", "")
        .unwrap();
    let b = tree
        .create_node(NodeType::Generated, a, "Hello world", "")
        .unwrap();

    assert_eq!(tree.render_node(b), "Hello world");
    assert_eq!(tree.root().tree_stats().total_child_nodes, 2);
}

#[test]
fn rejected_ancestor_stays_open_until_focus_leaves() {
    let mut tree = LoomTree::new();
    let a = tree
        .create_node(NodeType::User, NodeId::ROOT, "Chapter one", "")
        .unwrap();
    let b = tree
        .create_node(NodeType::Generated, a, "Chapter one. It rained.", "")
        .unwrap();
    tree.create_node(NodeType::Generated, a, "Chapter one. It snowed.", "")
        .unwrap();
    tree.create_node(NodeType::Generated, a, "Chapter one. Fog.", "")
        .unwrap();
    let elsewhere = tree
        .create_node(NodeType::User, NodeId::ROOT, "Prologue", "")
        .unwrap();

    let mut state = WindowState::new();
    tree.window(b, &mut state).unwrap();
    tree.set_rating(a, Rating::Rejected).unwrap();

    let window = tree.window(b, &mut state).unwrap();
    let a_view = &window.find(a).unwrap().children;
    assert!(matches!(a_view, ChildrenView::Shown(children) if children.len() == 3));

    let window = tree.window(elsewhere, &mut state).unwrap();
    assert_eq!(
        window.find(a).unwrap().children,
        ChildrenView::CollapsedRejected {
            count: tree.children(a).len()
        }
    );
}

#[test]
fn update_of_node_with_child_changes_nothing() {
    let mut tree = LoomTree::new();
    let a = tree
        .create_node(NodeType::User, NodeId::ROOT, "draft", "first")
        .unwrap();
    tree.create_node(NodeType::User, a, "draft, continued", "")
        .unwrap();
    let patch = tree.node(a).unwrap().patch().clone();
    let timestamp = tree.node(a).unwrap().timestamp();

    let outcome = tree.update_node(a, "rewritten", "second").unwrap();

    assert!(matches!(outcome, UpdateOutcome::Ignored(_)));
    let node = tree.node(a).unwrap();
    assert_eq!(node.patch(), &patch);
    assert_eq!(node.summary(), "first");
    assert_eq!(node.timestamp(), timestamp);
}

#[test]
fn load_then_render_deep_node_without_recompute() {
    let mut tree = LoomTree::new();
    let mut parent = NodeId::ROOT;
    let mut text = String::new();
    for i in 0..500 {
        text.push_str(&format!("Sentence {i}. "));
        parent = tree
            .create_node(NodeType::Generated, parent, &text, "")
            .unwrap();
    }
    let json = SessionRecord::new(tree.serialize(), parent)
        .to_json()
        .unwrap();

    let record = SessionRecord::from_json(&json).unwrap();
    let loaded = LoomTree::load_from_data(
        record.loom_tree,
        LoomConfig::default(),
        Arc::new(TextPatchEngine::new()),
        Arc::new(ManualClock::new(0)),
    )
    .unwrap();

    assert_eq!(loaded.render_node(record.focus.id), text);
    // Stats are stale until recomputed.
    assert_eq!(loaded.root().tree_stats().total_child_nodes, 0);
}

#[test]
fn ids_continue_after_load() {
    let mut tree = LoomTree::new();
    let a = tree
        .create_node(NodeType::User, NodeId::ROOT, "a", "")
        .unwrap();
    let mut loaded = LoomTree::load_from_data(
        tree.serialize(),
        LoomConfig::default(),
        Arc::new(TextPatchEngine::new()),
        Arc::new(ManualClock::new(0)),
    )
    .unwrap();

    let b = loaded
        .create_node(NodeType::User, NodeId::ROOT, "b", "")
        .unwrap();
    assert!(b > a);
    assert_eq!(loaded.children(NodeId::ROOT), &[a, b]);
}

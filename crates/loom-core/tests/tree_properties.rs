use loom_core::{
    LoomConfig, LoomTree, ManualClock, NodeId, NodeRole, NodeType, Rating, TextPatchEngine,
    WindowLimits, WindowState,
};
use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Step {
    parent: Index,
    kind: u8,
    extend: bool,
    text: String,
    rating: u8,
    read: bool,
}

fn step() -> impl Strategy<Value = Step> {
    (
        any::<Index>(),
        0..3u8,
        any::<bool>(),
        "\\PC{0,24}",
        0..3u8,
        any::<bool>(),
    )
        .prop_map(|(parent, kind, extend, text, rating, read)| Step {
            parent,
            kind,
            extend,
            text,
            rating,
            read,
        })
}

fn fixed_tree() -> LoomTree {
    LoomTree::with_parts(
        LoomConfig::default(),
        Arc::new(TextPatchEngine::new()),
        Arc::new(ManualClock::new(1_700_000_000_000)),
    )
}

/// Apply the steps; returns each created node with the text it was given
fn grow(tree: &mut LoomTree, steps: &[Step], with_status: bool) -> HashMap<NodeId, String> {
    let mut ids = vec![NodeId::ROOT];
    let mut texts = HashMap::new();
    for step in steps {
        let parent = ids[step.parent.index(ids.len())];
        let text = if step.extend {
            format!("{}{}", tree.render_node(parent), step.text)
        } else {
            step.text.clone()
        };
        let kind = match step.kind {
            0 => NodeType::User,
            1 => NodeType::Generated,
            _ => NodeType::Imported,
        };
        let id = tree.create_node(kind, parent, &text, "").unwrap();
        if with_status {
            let rating = match step.rating {
                0 => Rating::Unset,
                1 => Rating::Approved,
                _ => Rating::Rejected,
            };
            tree.set_rating(id, rating).unwrap();
            tree.mark_read(id, step.read).unwrap();
        }
        ids.push(id);
        texts.insert(id, text);
    }
    texts
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_node_renders_its_text(steps in prop::collection::vec(step(), 1..30)) {
        let mut tree = fixed_tree();
        let texts = grow(&mut tree, &steps, false);

        tree.clear_render_cache();
        for (id, text) in &texts {
            prop_assert_eq!(&tree.render_node(*id), text);
        }
        prop_assert_eq!(tree.render_node(NodeId::ROOT), "");
    }

    #[test]
    fn prop_recompute_satisfies_invariant_and_is_idempotent(
        steps in prop::collection::vec(step(), 1..30),
    ) {
        let mut tree = fixed_tree();
        grow(&mut tree, &steps, true);

        tree.calculate_all_node_stats(NodeId::ROOT).unwrap();
        prop_assert!(tree.verify_stats().is_empty());
        let first: Vec<_> = tree.iter().map(|n| (n.id(), *n.tree_stats())).collect();

        tree.calculate_all_node_stats(NodeId::ROOT).unwrap();
        for (id, stats) in first {
            prop_assert_eq!(tree.node(id).unwrap().tree_stats(), &stats);
        }
    }

    #[test]
    fn prop_incremental_agrees_with_recompute(steps in prop::collection::vec(step(), 1..30)) {
        let mut tree = fixed_tree();
        grow(&mut tree, &steps, true);
        prop_assert!(tree.verify_stats().is_empty());

        let incremental: Vec<_> = tree.iter().map(|n| (n.id(), *n.tree_stats())).collect();
        tree.calculate_all_node_stats(NodeId::ROOT).unwrap();
        for (id, stats) in incremental {
            prop_assert_eq!(tree.node(id).unwrap().tree_stats(), &stats);
        }
    }

    #[test]
    fn prop_window_is_bounded(
        steps in prop::collection::vec(step(), 1..40),
        focus in any::<Index>(),
        rejected in any::<Index>(),
    ) {
        let mut tree = fixed_tree();
        grow(&mut tree, &steps, false);
        let ids = tree.preorder();
        tree.set_rating(ids[rejected.index(ids.len())], Rating::Rejected).unwrap();
        let focus = ids[focus.index(ids.len())];

        let limits = WindowLimits::default();
        let mut state = WindowState::new();
        let window = loom_core::build_window(&tree, focus, &mut state, limits).unwrap();

        let on_path = window
            .rows()
            .iter()
            .filter(|row| matches!(
                row,
                loom_core::WindowRow::Node { role: NodeRole::Ancestor | NodeRole::Focus, .. }
            ))
            .count();
        prop_assert!(on_path <= limits.ancestor_levels() + 1);
        prop_assert!(window.max_rendered_depth() <= limits.descendant_depth());
        prop_assert!(window.contains(focus));
    }
}

use loom_core::{NodeId, Rating};
use loom_session::{JsonFileStore, LoomSession, RecordStore, ScriptedGenerator};
use loom_test_utils::{assert_tree_consistent, delayed_generator, test_session};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn completions_append_in_arrival_order() {
    let session = test_session(delayed_generator(&[(" slow", 60), (" fast", 5), (" mid", 30)]));
    let a = session.commit_edit("Go:", "").unwrap();

    let ids = session.generate(3).await.unwrap();
    assert_eq!(ids.len(), 3);

    session.with_tree(|tree| {
        let children = tree.children(a);
        assert_eq!(children.len(), 3);
        assert!(children.windows(2).all(|pair| pair[0] < pair[1]));
        let texts: Vec<String> = children.iter().map(|id| tree.render_node(*id)).collect();
        assert_eq!(texts, vec!["Go: fast", "Go: mid", "Go: slow"]);
        assert_tree_consistent(tree);
    });

    // The first arrival took the focus.
    let first = session.with_tree(|tree| tree.children(a)[0]);
    assert_eq!(session.focus(), first);
}

#[tokio::test]
async fn late_completion_does_not_steal_focus() {
    let session = test_session(delayed_generator(&[(" later", 50)]));
    let a = session.commit_edit("Draft", "").unwrap();
    let other = session.import_text(NodeId::ROOT, "Elsewhere", "").unwrap();

    let task = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.generate(1).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(session.with_tree(|tree| tree.node(a).unwrap().is_pending()));
    session.set_focus(other).unwrap();

    let ids = task.await.unwrap().unwrap();
    assert_eq!(session.focus(), other);
    session.with_tree(|tree| {
        assert_eq!(tree.parent(ids[0]), Some(a));
        assert!(!tree.node(a).unwrap().is_pending());
        assert!(!tree.node(ids[0]).unwrap().is_read());
    });
}

#[tokio::test]
async fn concurrent_rerolls_never_duplicate_ids() {
    let session = Arc::new(LoomSession::new(
        loom_test_utils::test_tree(),
        Arc::new(ScriptedGenerator::new().with_fallback(" alt")),
    ));
    let targets: Vec<NodeId> = (0..4)
        .map(|i| {
            session
                .import_text(NodeId::ROOT, &format!("seed {i}"), "")
                .unwrap()
        })
        .collect();

    let tasks: Vec<_> = targets
        .iter()
        .map(|target| {
            let session = Arc::clone(&session);
            let target = *target;
            tokio::spawn(async move { session.reroll(target, 2).await })
        })
        .collect();

    let mut created = Vec::new();
    for task in tasks {
        created.extend(task.await.unwrap().unwrap());
    }
    assert_eq!(created.len(), 8);
    let unique: HashSet<NodeId> = created.iter().copied().collect();
    assert_eq!(unique.len(), 8);

    session.with_tree(|tree| {
        assert_eq!(tree.children(NodeId::ROOT).len(), 12);
        assert_eq!(tree.root().tree_stats().total_child_nodes, 12);
        assert_tree_consistent(tree);
    });
}

#[tokio::test]
async fn file_store_restores_ratings_and_focus() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("session.json"));
    let session = test_session(delayed_generator(&[(" yes", 0), (" no", 0)]));
    let a = session.commit_edit("Choose", "").unwrap();
    let ids = session.generate(2).await.unwrap();
    session.rate(ids[0], Rating::Approved).unwrap();
    session.rate(ids[1], Rating::Rejected).unwrap();
    session.set_focus(a).unwrap();
    session.save(&store).await.unwrap();

    let record = store.load().await.unwrap().unwrap();
    let restored = LoomSession::restore(
        record,
        loom_core::LoomConfig::default(),
        Arc::new(ScriptedGenerator::new()),
    )
    .unwrap();

    assert_eq!(restored.focus(), a);
    restored.with_tree(|tree| {
        let stats = tree.node(a).unwrap().tree_stats();
        assert_eq!(stats.rated_up_nodes, 1);
        assert_eq!(stats.rated_down_nodes, 1);
        for id in &ids {
            assert_eq!(
                tree.render_node(*id),
                session.with_tree(|original| original.render_node(*id))
            );
        }
        assert_tree_consistent(tree);
    });
}

#[tokio::test]
async fn abandoned_generation_still_commits() {
    let session = test_session(delayed_generator(&[(" eventually", 200)]));
    let a = session.commit_edit("Waiting", "").unwrap();

    let abandoned = tokio::time::timeout(Duration::from_millis(20), session.generate(1)).await;
    assert!(abandoned.is_err());
    assert!(session.with_tree(|tree| tree.node(a).unwrap().is_pending()));
    assert_eq!(session.in_flight(a), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.in_flight(a), 0);
    let child = session.with_tree(|tree| {
        assert!(!tree.node(a).unwrap().is_pending());
        let children = tree.children(a);
        assert_eq!(children.len(), 1);
        assert_eq!(tree.render_node(children[0]), "Waiting eventually");
        assert_tree_consistent(tree);
        children[0]
    });
    assert_eq!(session.focus(), child);
}

//! Interactive session over one loom tree
//!
//! [`LoomSession`] owns the tree, the focus, window expansion state and the
//! search index. Every mutation takes the session lock once and runs to
//! completion, so id allocation and child appends never interleave. The
//! lock is never held across an `.await`.
//!
//! Generation branches run as spawned tasks. A completion commits even when
//! the caller stops waiting for it.

use crate::error::{GenerationError, SessionError, StoreError};
use crate::generator::{Generation, GenerationRequest, Generator};
use crate::store::RecordStore;
use futures::future::join_all;
use loom_core::{
    LoomConfig, LoomError, LoomTree, MemorySearchIndex, NodeId, NodeType, Provenance, Rating,
    SearchDocument, SearchHit, SearchIndex, SearchOptions, SessionRecord, SystemClock, TreeWindow,
    UpdateOutcome, WindowState,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Focus movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Parent,
    FirstChild,
    LastChild,
    NextSibling,
    PrevSibling,
    Deepest,
    NextUnread,
}

struct SessionState {
    tree: LoomTree,
    focus: NodeId,
    window: WindowState,
    /// Outstanding requests per continued node
    in_flight: HashMap<NodeId, usize>,
    sampler_settings: Option<serde_json::Value>,
    /// Bumped on every persisted-state mutation
    revision: u64,
}

impl SessionState {
    fn touch(&mut self) {
        self.revision += 1;
    }

    fn focus_on(&mut self, id: NodeId) -> Result<(), LoomError> {
        self.tree.mark_read(id, true)?;
        self.focus = id;
        self.window.observe_focus(id);
        self.touch();
        Ok(())
    }

    /// A request continuing `id` has not answered yet
    fn is_busy(&self, id: NodeId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Release one in-flight slot of `parent`; the last one clears `pending`
    fn land(&mut self, parent: NodeId) {
        let remaining = self.in_flight.get_mut(&parent).map_or(0, |count| {
            *count = count.saturating_sub(1);
            *count
        });
        if remaining == 0 {
            self.in_flight.remove(&parent);
            if let Err(e) = self.tree.set_pending(parent, false) {
                tracing::warn!(parent = %parent, error = %e, "failed to clear pending flag");
            }
        }
    }
}

/// One outstanding generation branch
///
/// Completing the branch releases its in-flight slot. A branch dropped
/// before completing (panic, cancelled task, runtime shutdown) releases the
/// slot on drop and records an error on the parent.
struct Branch {
    state: Arc<Mutex<SessionState>>,
    index: Arc<dyn SearchIndex>,
    origin: NodeId,
    parent: NodeId,
    landed: bool,
}

impl Branch {
    /// Commit one completion under the session lock
    ///
    /// `prompt` is the text the back-end continued; the stored child is that
    /// text plus the continuation even if the parent changed meanwhile.
    fn complete(
        mut self,
        prompt: &str,
        result: Result<Vec<Generation>, GenerationError>,
    ) -> Result<Vec<NodeId>, GenerationError> {
        let parent = self.parent;
        let mut state = self.state.lock();
        let outcome = match result {
            Ok(generations) if generations.is_empty() => Err(GenerationError::Empty),
            Ok(generations) => {
                let mut ids = Vec::with_capacity(generations.len());
                for generation in generations {
                    let text = format!("{prompt}{}", generation.text);
                    let provenance = Provenance {
                        model: generation.model,
                        finish_reason: generation.finish_reason,
                    };
                    match state.tree.create_generated(parent, &text, "", provenance) {
                        Ok(id) => {
                            reindex(self.index.as_ref(), &state.tree, id, true);
                            ids.push(id);
                        }
                        Err(e) => {
                            tracing::warn!(parent = %parent, error = %e, "dropped completion");
                        }
                    }
                }
                state.touch();
                Ok(ids)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            tracing::warn!(parent = %parent, error = %e, "generation failed");
            if state.tree.set_error(parent, Some(e.to_string())).is_ok() {
                state.touch();
            }
        }

        state.land(parent);
        self.landed = true;

        if let Ok(ids) = &outcome {
            if let Some(first) = ids.first() {
                if state.focus == self.origin {
                    if let Err(e) = state.focus_on(*first) {
                        tracing::warn!(node = %first, error = %e, "failed to focus completion");
                    }
                } else {
                    tracing::debug!(node = %first, "completion arrived after focus moved");
                }
            }
        }
        outcome
    }
}

impl Drop for Branch {
    fn drop(&mut self) {
        if self.landed {
            return;
        }
        tracing::warn!(parent = %self.parent, "generation branch ended without completing");
        let mut state = self.state.lock();
        let reason = GenerationError::Aborted("branch ended without completing".to_string());
        if state.tree.set_error(self.parent, Some(reason.to_string())).is_ok() {
            state.touch();
        }
        state.land(self.parent);
    }
}

fn reindex(index: &dyn SearchIndex, tree: &LoomTree, id: NodeId, created: bool) {
    if let Some(document) = SearchDocument::from_tree(tree, id) {
        if created {
            index.add(document);
        } else {
            index.replace(document);
        }
    }
}

/// Interactive loom session
pub struct LoomSession {
    state: Arc<Mutex<SessionState>>,
    generator: Arc<dyn Generator>,
    index: Arc<dyn SearchIndex>,
    saved_revision: AtomicU64,
}

impl std::fmt::Debug for LoomSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LoomSession")
            .field("focus", &state.focus)
            .field("nodes", &state.tree.len())
            .field("revision", &state.revision)
            .field("generator", &self.generator)
            .finish()
    }
}

impl LoomSession {
    /// Start a session focused on the root of `tree`
    #[must_use]
    pub fn new(tree: LoomTree, generator: Arc<dyn Generator>) -> Self {
        let index: Arc<dyn SearchIndex> = Arc::new(MemorySearchIndex::new());
        index.rebuild(&tree);
        let focus = tree.root_id();
        Self {
            state: Arc::new(Mutex::new(SessionState {
                tree,
                focus,
                window: WindowState::new(),
                in_flight: HashMap::new(),
                sampler_settings: None,
                revision: 0,
            })),
            generator,
            index,
            saved_revision: AtomicU64::new(0),
        }
    }

    /// Replace the search index and index the current tree into it
    #[must_use]
    pub fn with_index(mut self, index: Arc<dyn SearchIndex>) -> Self {
        index.rebuild(&self.state.lock().tree);
        self.index = index;
        self
    }

    /// Rebuild a session from a persisted record
    ///
    /// Loads the tree, recomputes statistics, logs integrity problems and
    /// reindexes. A focus that no longer exists falls back to the root.
    ///
    /// # Errors
    /// Returns [`SessionError::Loom`] if the record has no root
    pub fn restore(
        record: SessionRecord,
        config: LoomConfig,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, SessionError> {
        let engine = Arc::new(config.patch.engine());
        let mut tree =
            LoomTree::load_from_data(record.loom_tree, config, engine, Arc::new(SystemClock))?;
        tree.calculate_all_node_stats(tree.root_id())?;

        if let Err(LoomError::Integrity(issues)) = tree.validate() {
            for issue in &issues {
                tracing::warn!(%issue, "restored tree failed integrity check");
            }
        }

        let focus = if tree.contains(record.focus.id) {
            record.focus.id
        } else {
            tracing::warn!(focus = %record.focus.id, "saved focus missing; using root");
            tree.root_id()
        };

        let session = Self::new(tree, generator);
        {
            let mut state = session.state.lock();
            state.focus = focus;
            state.window.observe_focus(focus);
            state.sampler_settings = record.sampler_settings;
        }
        tracing::info!(focus = %focus, "session restored");
        Ok(session)
    }

    /// Current persisted state
    #[must_use]
    pub fn snapshot(&self) -> SessionRecord {
        self.snapshot_at().0
    }

    fn snapshot_at(&self) -> (SessionRecord, u64) {
        let state = self.state.lock();
        let mut record = SessionRecord::new(state.tree.serialize(), state.focus);
        record.sampler_settings = state.sampler_settings.clone();
        (record, state.revision)
    }

    /// Unsaved changes exist
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.lock().revision != self.saved_revision.load(Ordering::SeqCst)
    }

    /// Write a snapshot to `store`
    ///
    /// # Errors
    /// Returns [`StoreError`] if the store fails
    pub async fn save(&self, store: &dyn RecordStore) -> Result<(), StoreError> {
        let (record, revision) = self.snapshot_at();
        store.save(&record).await?;
        self.saved_revision.fetch_max(revision, Ordering::SeqCst);
        Ok(())
    }

    /// Save only when there are unsaved changes; returns whether it saved
    ///
    /// # Errors
    /// Returns [`StoreError`] if the store fails
    pub async fn save_if_dirty(&self, store: &dyn RecordStore) -> Result<bool, StoreError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.save(store).await?;
        Ok(true)
    }

    #[must_use]
    pub fn focus(&self) -> NodeId {
        self.state.lock().focus
    }

    /// Move the focus, marking the node read
    ///
    /// # Errors
    /// Returns [`SessionError::Loom`] if `id` is unknown
    pub fn set_focus(&self, id: NodeId) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.focus_on(id)?;
        tracing::debug!(focus = %id, "focus changed");
        Ok(())
    }

    /// Move the focus along the tree; returns the new focus if it moved
    ///
    /// # Errors
    /// Returns [`SessionError::Loom`] if the focus node vanished
    pub fn navigate(&self, direction: Move) -> Result<Option<NodeId>, SessionError> {
        let mut state = self.state.lock();
        let from = state.focus;
        let tree = &state.tree;
        let target = match direction {
            Move::Parent => tree.parent_of(from),
            Move::FirstChild => tree.first_child(from),
            Move::LastChild => tree.last_child(from),
            Move::NextSibling => tree.next_sibling(from),
            Move::PrevSibling => tree.prev_sibling(from),
            Move::Deepest => Some(tree.deepest_descendant(from)).filter(|id| *id != from),
            Move::NextUnread => tree.next_unread(from),
        };
        if let Some(id) = target {
            state.focus_on(id)?;
        }
        Ok(target)
    }

    /// Window around the current focus
    ///
    /// # Errors
    /// Returns [`SessionError::Loom`] if the focus node vanished
    pub fn window(&self) -> Result<TreeWindow, SessionError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        Ok(state.tree.window(state.focus, &mut state.window)?)
    }

    pub fn toggle_hidden_ancestors(&self) {
        self.state.lock().window.toggle_ancestors();
    }

    pub fn expand_branch(&self, id: NodeId) {
        self.state.lock().window.expand_branch(id);
    }

    pub fn collapse_branch(&self, id: NodeId) {
        self.state.lock().window.collapse_branch(id);
    }

    /// Full text of the focused node
    #[must_use]
    pub fn focus_text(&self) -> String {
        let state = self.state.lock();
        state.tree.render_node(state.focus)
    }

    /// Run `f` against the tree under the session lock
    pub fn with_tree<R>(&self, f: impl FnOnce(&LoomTree) -> R) -> R {
        f(&self.state.lock().tree)
    }

    /// Commit edited text at the focus
    ///
    /// Updates the focus in place while it is an editable leaf with no
    /// generation in flight; otherwise creates a `user` child and focuses it.
    ///
    /// # Errors
    /// Returns [`SessionError::Loom`] if the focus node vanished
    pub fn commit_edit(&self, text: &str, summary: &str) -> Result<NodeId, SessionError> {
        let mut state = self.state.lock();
        let focus = state.focus;

        if !state.is_busy(focus)
            && state.tree.update_node(focus, text, summary)? == UpdateOutcome::Applied
        {
            state.touch();
            reindex(self.index.as_ref(), &state.tree, focus, false);
            return Ok(focus);
        }

        let id = state.tree.create_node(NodeType::User, focus, text, summary)?;
        state.focus_on(id)?;
        reindex(self.index.as_ref(), &state.tree, id, true);
        Ok(id)
    }

    /// Add outside text under `parent` as an `imported` node
    ///
    /// # Errors
    /// Returns [`SessionError::Loom`] if `parent` is unknown
    pub fn import_text(
        &self,
        parent: NodeId,
        text: &str,
        summary: &str,
    ) -> Result<NodeId, SessionError> {
        let mut state = self.state.lock();
        let id = state
            .tree
            .create_node(NodeType::Imported, parent, text, summary)?;
        state.touch();
        reindex(self.index.as_ref(), &state.tree, id, true);
        tracing::info!(node = %id, parent = %parent, "imported text");
        Ok(id)
    }

    /// # Errors
    /// Returns [`SessionError::Loom`] if `id` is unknown
    pub fn rate(&self, id: NodeId, rating: Rating) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.tree.set_rating(id, rating)?;
        state.touch();
        Ok(())
    }

    /// # Errors
    /// Returns [`SessionError::Loom`] if `id` is unknown
    pub fn mark_read(&self, id: NodeId, read: bool) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        if state.tree.mark_read(id, read)? {
            state.touch();
        }
        Ok(())
    }

    pub fn set_sampler_settings(&self, settings: Option<serde_json::Value>) {
        let mut state = self.state.lock();
        state.sampler_settings = settings;
        state.touch();
    }

    #[must_use]
    pub fn sampler_settings(&self) -> Option<serde_json::Value> {
        self.state.lock().sampler_settings.clone()
    }

    #[must_use]
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        self.index.search(query, options)
    }

    /// Generate `n` continuations of the focus
    ///
    /// Returns the created ids in request order. Must run inside a tokio
    /// runtime; branches are spawned onto it.
    ///
    /// # Errors
    /// Returns [`SessionError::Generation`] if every request failed
    pub async fn generate(&self, n: usize) -> Result<Vec<NodeId>, SessionError> {
        let focus = self.focus();
        self.generate_under(focus, focus, n).await
    }

    /// Generate `n` alternatives to `id` as its siblings
    ///
    /// # Errors
    /// - [`SessionError::Loom`] if `id` is unknown or is the root
    /// - [`SessionError::Generation`] if every request failed
    pub async fn reroll(&self, id: NodeId, n: usize) -> Result<Vec<NodeId>, SessionError> {
        let parent = {
            let state = self.state.lock();
            let node = state.tree.get(id)?;
            node.parent().ok_or(LoomError::InvalidNodeType {
                node_type: node.node_type(),
                operation: "reroll",
            })?
        };
        self.generate_under(id, parent, n).await
    }

    /// Issue `n` concurrent requests continuing `parent`
    ///
    /// `origin` is the focus the user acted from; completions refocus only
    /// while the focus is still there. Each branch is a spawned task, so
    /// dropping the returned future does not lose completions.
    async fn generate_under(
        &self,
        origin: NodeId,
        parent: NodeId,
        n: usize,
    ) -> Result<Vec<NodeId>, SessionError> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let request = {
            let mut state = self.state.lock();
            let prompt = state.tree.render_node(parent);
            state.tree.set_pending(parent, true)?;
            state.tree.set_error(parent, None)?;
            *state.in_flight.entry(parent).or_default() += n;
            GenerationRequest {
                parent,
                prompt,
                settings: state.sampler_settings.clone(),
            }
        };
        tracing::info!(parent = %parent, branches = n, "generation started");

        let handles: Vec<_> = (0..n)
            .map(|_| {
                let request = request.clone();
                let generator = Arc::clone(&self.generator);
                let branch = Branch {
                    state: Arc::clone(&self.state),
                    index: Arc::clone(&self.index),
                    origin,
                    parent,
                    landed: false,
                };
                tokio::spawn(async move {
                    let prompt = request.prompt.clone();
                    let result = generator.generate(request).await;
                    branch.complete(&prompt, result)
                })
            })
            .collect();
        let outcomes = join_all(handles).await;

        let mut created = Vec::new();
        let mut first_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(Ok(ids)) => created.extend(ids),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(GenerationError::Aborted(e.to_string()));
                }
            }
        }
        match first_error {
            Some(e) if created.is_empty() => Err(e.into()),
            _ => Ok(created),
        }
    }

    /// Number of unanswered requests continuing `id`
    #[must_use]
    pub fn in_flight(&self, id: NodeId) -> usize {
        self.state.lock().in_flight.get(&id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ScriptedGenerator;
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn session(generator: ScriptedGenerator) -> LoomSession {
        LoomSession::new(LoomTree::new(), Arc::new(generator))
    }

    #[test]
    fn commit_edit_updates_leaf_then_branches() {
        let session = session(ScriptedGenerator::new());
        let a = session.commit_edit("Once", "").unwrap();
        assert_eq!(session.focus(), a);

        // Editable leaf: updated in place.
        let same = session.commit_edit("Once upon", "").unwrap();
        assert_eq!(same, a);
        assert_eq!(session.focus_text(), "Once upon");

        session.import_text(a, "Once upon a time", "").unwrap();
        let b = session.commit_edit("Once upon a midnight", "").unwrap();
        assert_ne!(b, a);
        assert_eq!(session.with_tree(|t| t.parent(b)), Some(a));
    }

    #[test]
    fn set_focus_marks_read_and_resets_window() {
        let session = session(ScriptedGenerator::new());
        let a = session.import_text(NodeId::ROOT, "x", "").unwrap();
        assert!(!session.with_tree(|t| t.node(a).unwrap().is_read()));

        session.toggle_hidden_ancestors();
        session.set_focus(a).unwrap();
        assert!(session.with_tree(|t| t.node(a).unwrap().is_read()));
        assert!(session.set_focus(NodeId::new(99)).is_err());
    }

    #[tokio::test]
    async fn generate_creates_children_and_refocuses_once() {
        let generator = ScriptedGenerator::new()
            .then_text(" one", Duration::from_millis(5))
            .then_text(" two", Duration::from_millis(1));
        let session = session(generator);
        let a = session.commit_edit("Start", "").unwrap();

        let ids = session.generate(2).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&session.focus()));
        session.with_tree(|tree| {
            assert_eq!(tree.children(a).len(), 2);
            assert!(!tree.node(a).unwrap().is_pending());
            let texts: Vec<String> = ids.iter().map(|id| tree.render_node(*id)).collect();
            assert!(texts.contains(&"Start one".to_string()));
            assert!(texts.contains(&"Start two".to_string()));
        });
        assert_eq!(session.in_flight(a), 0);
    }

    #[tokio::test]
    async fn failed_generation_records_error() {
        let generator = ScriptedGenerator::new()
            .then_error(GenerationError::Backend("503".into()), Duration::ZERO);
        let session = session(generator);
        let a = session.commit_edit("Start", "").unwrap();

        let result = session.generate(1).await;
        assert!(matches!(result, Err(SessionError::Generation(_))));
        session.with_tree(|tree| {
            let node = tree.node(a).unwrap();
            assert!(node.error().unwrap().contains("503"));
            assert!(!node.is_pending());
        });
        assert_eq!(session.focus(), a);
    }

    #[tokio::test]
    async fn edit_during_generation_branches_instead_of_rewriting() {
        let generator = ScriptedGenerator::new().then_text(" and then", Duration::from_millis(40));
        let session = session(generator);
        let a = session.commit_edit("Old prompt", "").unwrap();

        let (generated, edited) = tokio::join!(session.generate(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.commit_edit("Brand new text", "")
        });
        let generated = generated.unwrap()[0];
        let edited = edited.unwrap();

        assert_ne!(edited, a);
        assert_eq!(session.focus(), edited);
        session.with_tree(|tree| {
            assert_eq!(tree.render_node(a), "Old prompt");
            assert_eq!(tree.render_node(edited), "Brand new text");
            assert_eq!(tree.render_node(generated), "Old prompt and then");
            assert_eq!(tree.children(a).to_vec(), vec![edited, generated]);
        });

        // Nothing in flight any more: the leaf is editable in place again.
        assert_eq!(session.commit_edit("Brand new text!", "").unwrap(), edited);
    }

    #[derive(Debug)]
    struct CrashingBackend;

    #[async_trait::async_trait]
    impl Generator for CrashingBackend {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<Vec<Generation>, GenerationError> {
            panic!("backend crashed");
        }
    }

    #[tokio::test]
    async fn crashed_branch_releases_pending() {
        let session = LoomSession::new(LoomTree::new(), Arc::new(CrashingBackend));
        let a = session.commit_edit("Start", "").unwrap();

        let result = session.generate(2).await;
        assert!(matches!(
            result,
            Err(SessionError::Generation(GenerationError::Aborted(_)))
        ));
        assert_eq!(session.in_flight(a), 0);
        session.with_tree(|tree| {
            let node = tree.node(a).unwrap();
            assert!(!node.is_pending());
            assert!(node.error().unwrap().contains("aborted"));
            assert!(tree.children(a).is_empty());
        });
        assert_eq!(session.focus(), a);
    }

    #[tokio::test]
    async fn reroll_adds_sibling() {
        let session = session(ScriptedGenerator::new().with_fallback(" again"));
        let a = session.commit_edit("Root text", "").unwrap();
        let first = session.generate(1).await.unwrap()[0];

        let rerolled = session.reroll(first, 1).await.unwrap();
        assert_eq!(session.with_tree(|t| t.parent(rerolled[0])), Some(a));
        assert_eq!(session.focus(), rerolled[0]);
        assert!(session.reroll(NodeId::ROOT, 1).await.is_err());
    }

    #[tokio::test]
    async fn dirty_tracking_follows_saves() {
        let session = session(ScriptedGenerator::new());
        let store = MemoryStore::new();
        assert!(!session.save_if_dirty(&store).await.unwrap());

        session.commit_edit("text", "").unwrap();
        assert!(session.is_dirty());
        assert!(session.save_if_dirty(&store).await.unwrap());
        assert!(!session.is_dirty());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn restore_recomputes_and_keeps_focus() {
        let session = session(ScriptedGenerator::new());
        let a = session.commit_edit("alpha", "").unwrap();
        let b = session.import_text(a, "alpha beta", "").unwrap();
        session.import_text(a, "gamma", "").unwrap();
        session.set_focus(b).unwrap();
        session.set_sampler_settings(Some(serde_json::json!({ "temperature": 1.0 })));
        let record = session.snapshot();

        let restored = LoomSession::restore(
            record,
            LoomConfig::default(),
            Arc::new(ScriptedGenerator::new()),
        )
        .unwrap();
        assert_eq!(restored.focus(), b);
        assert_eq!(restored.focus_text(), "alpha beta");
        assert_eq!(
            restored.with_tree(|t| t.root().tree_stats().total_child_nodes),
            3
        );
        assert_eq!(restored.search("gamma", &SearchOptions::default()).len(), 1);
        assert!(restored.sampler_settings().is_some());
        assert!(!restored.is_dirty());
    }

    #[test]
    fn navigate_moves_focus() {
        let session = session(ScriptedGenerator::new());
        let a = session.commit_edit("a", "").unwrap();
        let b = session.import_text(a, "ab", "").unwrap();
        let c = session.import_text(a, "ac", "").unwrap();

        assert_eq!(session.navigate(Move::FirstChild).unwrap(), Some(b));
        assert_eq!(session.navigate(Move::NextSibling).unwrap(), Some(c));
        assert_eq!(session.navigate(Move::NextSibling).unwrap(), None);
        assert_eq!(session.focus(), c);
        assert_eq!(session.navigate(Move::Parent).unwrap(), Some(a));
        assert_eq!(session.navigate(Move::Deepest).unwrap(), Some(c));
    }
}

//! Patch engine contract and the character-level text engine
//!
//! [`PatchEngine`] is the seam the tree store depends on. [`TextPatchEngine`]
//! is the default implementation, built on `similar`.

use crate::patch::{Hunk, Patch, PatchOutcome};
use similar::{Algorithm, ChangeTag, TextDiff};
use std::fmt::Debug;
use std::time::Duration;

/// Default number of context characters kept on each side of a hunk
pub const DEFAULT_CONTEXT_CHARS: usize = 24;

/// Default upper bound on time spent diffing one pair of texts
pub const DEFAULT_DIFF_TIMEOUT: Duration = Duration::from_millis(250);

/// Produces and applies [`Patch`]es
///
/// # Contract
/// - `apply(&diff(a, b), a).text == b` for every pair of texts
/// - `apply(&Patch::noop(), x).text == x`
/// - `apply` never fails outright: hunks that cannot be placed are skipped
///   and reported as `false` in [`PatchOutcome::hunks`]
pub trait PatchEngine: Send + Sync + Debug {
    /// Compute the patch turning `old` into `new`
    fn diff(&self, old: &str, new: &str) -> Patch;

    /// Apply `patch` on top of `base`
    fn apply(&self, patch: &Patch, base: &str) -> PatchOutcome;
}

/// Character-granular patch engine
///
/// Hunks record their byte offset in the base plus a few characters of
/// surrounding context. Application tries the recorded offset first and
/// falls back to the nearest occurrence of the context, so patches still
/// land when the base text has drifted.
#[derive(Debug, Clone)]
pub struct TextPatchEngine {
    context_chars: usize,
    timeout: Duration,
}

impl TextPatchEngine {
    /// Create engine with default context and timeout
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With context size (characters on each side of a hunk)
    #[inline]
    #[must_use]
    pub fn with_context_chars(mut self, context_chars: usize) -> Self {
        self.context_chars = context_chars;
        self
    }

    /// With diff timeout
    ///
    /// Past the deadline `similar` falls back to a coarser (still exact) diff.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn context_chars(&self) -> usize {
        self.context_chars
    }

    fn attach_context(&self, old: &str, hunks: &mut [Hunk]) {
        let mut floor = 0;
        for i in 0..hunks.len() {
            let start = hunks[i].start;
            let end = start + hunks[i].removed.len();
            let ceiling = hunks.get(i + 1).map_or(old.len(), |next| next.start);

            hunks[i].before = tail_chars(&old[floor..start], self.context_chars).to_string();
            hunks[i].after = head_chars(&old[end..ceiling], self.context_chars).to_string();
            floor = end;
        }
    }
}

impl Default for TextPatchEngine {
    fn default() -> Self {
        Self {
            context_chars: DEFAULT_CONTEXT_CHARS,
            timeout: DEFAULT_DIFF_TIMEOUT,
        }
    }
}

impl PatchEngine for TextPatchEngine {
    fn diff(&self, old: &str, new: &str) -> Patch {
        if old == new {
            return Patch::noop();
        }

        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .timeout(self.timeout)
            .diff_chars(old, new);

        let mut hunks = Vec::new();
        let mut current: Option<Hunk> = None;
        let mut old_pos = 0;

        for change in diff.iter_all_changes() {
            let value = change.value();
            match change.tag() {
                ChangeTag::Equal => {
                    if let Some(hunk) = current.take() {
                        hunks.push(hunk);
                    }
                    old_pos += value.len();
                }
                ChangeTag::Delete => {
                    current
                        .get_or_insert_with(|| Hunk::at(old_pos))
                        .removed
                        .push_str(value);
                    old_pos += value.len();
                }
                ChangeTag::Insert => {
                    current
                        .get_or_insert_with(|| Hunk::at(old_pos))
                        .inserted
                        .push_str(value);
                }
            }
        }
        if let Some(hunk) = current.take() {
            hunks.push(hunk);
        }

        self.attach_context(old, &mut hunks);
        Patch::from_hunks(hunks)
    }

    fn apply(&self, patch: &Patch, base: &str) -> PatchOutcome {
        let mut text = base.to_string();
        let mut hunks = Vec::with_capacity(patch.len());
        // Offset between the recorded base positions and the working text
        let mut shift: isize = 0;

        for hunk in patch.hunks() {
            let needle = hunk.needle();
            let expected = hunk.start as isize + shift - hunk.before.len() as isize;

            match locate(&text, &needle, expected) {
                Some(at) => {
                    let from = at + hunk.before.len();
                    let to = from + hunk.removed.len();
                    text.replace_range(from..to, &hunk.inserted);
                    shift = from as isize - hunk.start as isize + hunk.size_delta();
                    hunks.push(true);
                }
                None => hunks.push(false),
            }
        }

        PatchOutcome { text, hunks }
    }
}

/// Find `needle` in `text`, preferring the expected offset, then the
/// closest occurrence.
fn locate(text: &str, needle: &str, expected: isize) -> Option<usize> {
    if expected >= 0 {
        let at = expected as usize;
        if text.get(at..at + needle.len()) == Some(needle) {
            return Some(at);
        }
    }

    if needle.is_empty() {
        let at = expected.clamp(0, text.len() as isize) as usize;
        return text.is_char_boundary(at).then_some(at);
    }

    text.match_indices(needle)
        .map(|(i, _)| i)
        .min_by_key(|i| (*i as isize - expected).unsigned_abs())
}

fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}

fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

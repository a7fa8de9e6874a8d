//! Serializable text patches
//!
//! A [`Patch`] is the stored difference between a parent revision and a
//! child revision. Callers treat it as opaque: it is produced and consumed
//! only through a [`PatchEngine`](crate::PatchEngine).

use serde::{Deserialize, Serialize};

/// Difference between two text snapshots
///
/// # Invariants
/// - Hunks are ordered by `start` and never overlap in the base text
/// - An empty hunk list is the no-op patch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    hunks: Vec<Hunk>,
}

impl Patch {
    /// The identity patch: `apply(noop, x) == x`
    #[inline]
    #[must_use]
    pub fn noop() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub(crate) fn from_hunks(hunks: Vec<Hunk>) -> Self {
        Self { hunks }
    }

    /// True when applying this patch leaves any text unchanged
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Number of hunks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.hunks.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// Encode as JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, PatchError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Returns error if the input is not a valid patch encoding
    pub fn from_json(json: &str) -> Result<Self, PatchError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One contiguous replacement
///
/// `start` is the byte offset of `removed` in the base text. The context
/// strings surround the replacement in the base text and let the engine
/// relocate the hunk when the base has drifted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    #[serde(rename = "s")]
    pub start: usize,

    #[serde(rename = "b", default, skip_serializing_if = "String::is_empty")]
    pub before: String,

    #[serde(rename = "d", default, skip_serializing_if = "String::is_empty")]
    pub removed: String,

    #[serde(rename = "i", default, skip_serializing_if = "String::is_empty")]
    pub inserted: String,

    #[serde(rename = "a", default, skip_serializing_if = "String::is_empty")]
    pub after: String,
}

impl Hunk {
    #[inline]
    #[must_use]
    pub(crate) fn at(start: usize) -> Self {
        Self {
            start,
            ..Self::default()
        }
    }

    /// Text the engine must find in the base: context + removed + context
    #[must_use]
    pub fn needle(&self) -> String {
        let mut needle =
            String::with_capacity(self.before.len() + self.removed.len() + self.after.len());
        needle.push_str(&self.before);
        needle.push_str(&self.removed);
        needle.push_str(&self.after);
        needle
    }

    /// Byte length change this hunk causes
    #[inline]
    #[must_use]
    pub fn size_delta(&self) -> isize {
        self.inserted.len() as isize - self.removed.len() as isize
    }
}

/// Result of applying a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Patched text (best effort when some hunks failed)
    pub text: String,

    /// Per-hunk success flags, in hunk order
    pub hunks: Vec<bool>,
}

impl PatchOutcome {
    /// True when every hunk applied
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.hunks.iter().all(|ok| *ok)
    }

    /// Number of hunks that failed to apply
    #[inline]
    #[must_use]
    pub fn failed(&self) -> usize {
        self.hunks.iter().filter(|ok| !**ok).count()
    }
}

/// Errors specific to patch encoding
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("patch serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_patch_is_empty() {
        let patch = Patch::noop();
        assert!(patch.is_noop());
        assert_eq!(patch.len(), 0);
    }

    #[test]
    fn patch_json_is_compact() {
        let mut hunk = Hunk::at(5);
        hunk.inserted = " world".to_string();
        hunk.before = "Hello".to_string();
        let patch = Patch::from_hunks(vec![hunk]);

        let json = patch.to_json().unwrap();
        assert_eq!(json, r#"[{"s":5,"b":"Hello","i":" world"}]"#);

        let decoded = Patch::from_json(&json).unwrap();
        assert_eq!(decoded, patch);
    }

    #[test]
    fn patch_from_invalid_json_fails() {
        let result = Patch::from_json("{not a patch}");
        assert!(matches!(result, Err(PatchError::Serialization(_))));
    }

    #[test]
    fn hunk_needle_and_delta() {
        let hunk = Hunk {
            start: 3,
            before: "ab".to_string(),
            removed: "cd".to_string(),
            inserted: "xyz".to_string(),
            after: "ef".to_string(),
        };
        assert_eq!(hunk.needle(), "abcdef");
        assert_eq!(hunk.size_delta(), 1);
    }

    #[test]
    fn outcome_counts_failures() {
        let outcome = PatchOutcome {
            text: String::new(),
            hunks: vec![true, false, false],
        };
        assert!(!outcome.is_clean());
        assert_eq!(outcome.failed(), 2);
    }
}
